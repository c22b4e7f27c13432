use crate::modules::comment::MediaKind;
use crate::modules::import::ExternalIds;

/// §4.6 "Match Dispatcher (Webhook)": the normalized fields a webhook
/// payload (Emby/Jellyfin) resolves to before dispatch runs.
#[derive(Debug, Clone)]
pub struct MatchRequest {
    pub title: String,
    pub kind: MediaKind,
    pub season: i32,
    pub episode: i32,
    pub external_ids: Option<ExternalIds>,
}

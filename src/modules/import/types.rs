use crate::modules::comment::MediaKind;

/// External IDs supplied by a caller that already resolved them (e.g. the
/// TMDB auto-map job, or a webhook payload carrying a TMDB id) — merged
/// into `WorkMetadata` with fill-if-absent semantics (§3).
#[derive(Debug, Clone, Default)]
pub struct ExternalIds {
    pub tmdb_id: Option<i32>,
    pub tmdb_episode_group_id: Option<String>,
    pub bangumi_id: Option<i32>,
    pub tvdb_id: Option<i32>,
    pub douban_id: Option<String>,
    pub imdb_id: Option<String>,
}

/// §4.3 "Generic import": everything the adapter lookup and Work
/// resolution need.
#[derive(Debug, Clone)]
pub struct GenericImportRequest {
    pub provider: String,
    pub media_id: String,
    pub title: String,
    pub kind: MediaKind,
    pub season: i32,
    pub target_episode: Option<i32>,
    pub poster_url: Option<String>,
    pub external_ids: Option<ExternalIds>,
}

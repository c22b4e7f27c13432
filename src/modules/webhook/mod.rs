//! §6 "Webhook ingress": Emby/Jellyfin new-item events turned into Match
//! Dispatcher requests (§4.6).

mod handlers;
mod payload;
mod router;

pub use payload::{emby_to_match_request, jellyfin_to_match_request, EmbyWebhookPayload, JellyfinWebhookPayload};
pub use router::router;

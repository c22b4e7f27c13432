use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::modules::comment::MediaKind;
use crate::shared::errors::{AppError, AppResult};

/// §4 "Provider adapter layer": the contract all six concrete scrapers
/// implement. The registry (`modules::provider::registry`) is the only
/// caller that should see this trait directly; everything upstream talks
/// to it through `ProviderRegistry`.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Machine name used as the `provider` column value everywhere (§3).
    fn provider_name(&self) -> &'static str;

    fn get_rate_limit_info(&self) -> RateLimiterInfo;

    /// §4.1 "Search": titles cleaned and junk-filtered before they reach
    /// the caller.
    async fn search(&self, keyword: &str, episode_hint: Option<i32>) -> AppResult<Vec<ProviderSearchInfo>>;

    /// Episode listing for a given `media_id`, 1-based contiguous indices.
    /// `target_index` lets an adapter short-circuit pagination once it has
    /// enough pages to guarantee that index is present; `db_media_kind`
    /// movie truncation is the caller's responsibility (§4.3), not the
    /// adapter's.
    async fn get_episodes(
        &self,
        media_id: &str,
        target_index: Option<i32>,
    ) -> AppResult<Vec<ProviderEpisodeInfo>>;

    /// Comments for one provider episode id, already normalized to the
    /// crate's `p`/`m`/`t`/`cid` shape. `on_progress(current, total)` is
    /// invoked after each segment/page so the import engine can map it
    /// onto the task's overall progress range.
    async fn get_comments(
        &self,
        provider_episode_id: &str,
        on_progress: &(dyn Fn(usize, usize) + Send + Sync),
    ) -> AppResult<Vec<NormalizedComment>>;

    /// Optional: providers whose session needs periodic renewal (Gamer)
    /// override this; others inherit the no-op default.
    async fn refresh_session(&self) -> AppResult<()> {
        Err(AppError::NotImplemented(format!(
            "session refresh not supported by {}",
            self.provider_name()
        )))
    }
}

/// Mirrors the teacher's client-reported rate limit shape: derived fields
/// come from the single `requests_per_second` the adapter is constructed
/// with, so there is exactly one place per adapter that can disagree with
/// its own limiter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimiterInfo {
    pub requests_per_second: f64,
    pub requests_per_minute: u32,
    pub min_delay_ms: u32,
}

impl RateLimiterInfo {
    pub fn new(requests_per_second: f64) -> Self {
        Self {
            requests_per_second,
            requests_per_minute: (requests_per_second * 60.0) as u32,
            min_delay_ms: ((1.0 / requests_per_second) * 1000.0) as u32,
        }
    }

    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms as u64)
    }
}

/// §4.1 `ProviderSearchInfo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSearchInfo {
    pub provider: String,
    pub media_id: String,
    pub title: String,
    pub media_kind: MediaKind,
    pub year: Option<i32>,
    pub season: i32,
    pub poster_url: Option<String>,
    pub episode_count: Option<i32>,
    pub current_episode_index: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderEpisodeInfo {
    pub provider_episode_id: String,
    pub index: i32,
    pub title: Option<String>,
    pub playback_url: Option<String>,
}

/// Comment already mapped onto the crate's normalized shape, ready for
/// `CommentRepository::insert_ignore_batch` — the adapter owns translating
/// its own wire format (protobuf/XML/JSON) into this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedComment {
    pub cid: i64,
    pub t: f64,
    pub mode: i32,
    pub color: u32,
    pub text: String,
}

//! §2 "Persistence contract": the storage operations every other module
//! depends on, expressed as traits so the import engine, task engine and
//! match dispatcher never touch Diesel directly. One Diesel-backed
//! implementation of each trait lives under `infrastructure`.

pub mod infrastructure;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::modules::comment::{
    ApiToken, CacheEntry, Comment, Episode, ScheduledTask, ScraperSetting, Source, TaskHistory,
    TaskStatus, TmdbEpisodeMapping, Work, WorkAliases, WorkMetadata,
};
use crate::shared::errors::AppResult;

pub use infrastructure::{
    ApiTokenRepositoryImpl, CacheRepositoryImpl, CommentRepositoryImpl, ConfigKvRepositoryImpl,
    EpisodeRepositoryImpl, ScheduledTaskRepositoryImpl, ScraperSettingRepositoryImpl,
    SourceRepositoryImpl, TaskHistoryRepositoryImpl, TmdbMappingRepositoryImpl, WorkRepositoryImpl,
};

/// `(title, season)` uniquely identifies a Work (§3).
#[async_trait]
pub trait WorkRepository: Send + Sync {
    async fn find_by_title_season(&self, title: &str, season: i32) -> AppResult<Option<Work>>;
    async fn get(&self, id: Uuid) -> AppResult<Option<Work>>;
    async fn create(&self, work: Work) -> AppResult<Work>;
    /// Only sets `poster_url` when currently `NULL` (fill-if-absent, §3).
    async fn set_poster_if_absent(&self, work_id: Uuid, poster_url: &str) -> AppResult<()>;

    async fn get_metadata(&self, work_id: Uuid) -> AppResult<WorkMetadata>;
    async fn upsert_metadata(&self, metadata: &WorkMetadata) -> AppResult<()>;
    async fn get_aliases(&self, work_id: Uuid) -> AppResult<WorkAliases>;
    async fn upsert_aliases(&self, aliases: &WorkAliases) -> AppResult<()>;
    /// Works with a TMDB id but no episode-group mapping yet — the driving
    /// query of the TMDB auto-map job (§4.5.1).
    async fn list_pending_tmdb_mapping(&self) -> AppResult<Vec<(Work, WorkMetadata)>>;
    /// Resolves `GET /bangumi/{id}`'s external-bangumi-id form (§6).
    async fn find_by_bangumi_id(&self, bangumi_id: i32) -> AppResult<Option<(Work, WorkMetadata)>>;
}

/// `(provider, provider_media_id)` unique; at most one favorited Source per
/// Work (§3).
#[async_trait]
pub trait SourceRepository: Send + Sync {
    async fn find_by_provider_media(
        &self,
        provider: &str,
        provider_media_id: &str,
    ) -> AppResult<Option<Source>>;
    async fn list_for_work(&self, work_id: Uuid) -> AppResult<Vec<Source>>;
    async fn get(&self, id: Uuid) -> AppResult<Option<Source>>;
    /// Insert-ignore on the `(provider, provider_media_id)` unique key;
    /// returns the existing row unchanged if it was already present.
    async fn insert_ignore(&self, source: Source) -> AppResult<Source>;
    /// Atomically clears `favorited` on every other Source of the same Work
    /// before setting it on `source_id` (§3 "at most one favorited Source").
    async fn set_favorited(&self, work_id: Uuid, source_id: Uuid) -> AppResult<()>;
}

/// `(source, index)` unique within a Source (§3).
#[async_trait]
pub trait EpisodeRepository: Send + Sync {
    async fn find_by_source_index(&self, source_id: Uuid, index: i32) -> AppResult<Option<Episode>>;
    /// Joins through the owning Source to resolve an episode by the pair
    /// a provider naturally addresses one by (§4.3 single-episode refresh).
    async fn find_by_provider_episode(
        &self,
        provider: &str,
        provider_episode_id: &str,
    ) -> AppResult<Option<(Source, Episode)>>;
    async fn list_for_source(&self, source_id: Uuid) -> AppResult<Vec<Episode>>;
    async fn get(&self, id: Uuid) -> AppResult<Option<Episode>>;
    async fn create_if_absent(&self, episode: Episode) -> AppResult<Episode>;
    async fn update_fetched(&self, episode_id: Uuid, fetched_at: DateTime<Utc>, comment_count: i32) -> AppResult<()>;
    /// Transactionally deletes every Episode (and its Comments, via the
    /// episode_id foreign key) belonging to `source_id`; used by full
    /// refresh (§4.4.2) before re-importing.
    async fn clear_for_source(&self, source_id: Uuid) -> AppResult<()>;
}

/// `(episode, cid)` unique; duplicate inserts are ignored rather than
/// erroring (§3).
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Insert-ignore a batch, returning the count of rows actually
    /// inserted (i.e. excluding cid duplicates already present).
    async fn insert_ignore_batch(&self, episode_id: Uuid, comments: &[Comment]) -> AppResult<i32>;
    async fn list_for_episode(&self, episode_id: Uuid) -> AppResult<Vec<Comment>>;
    async fn clear_for_episode(&self, episode_id: Uuid) -> AppResult<()>;
}

/// Fully replaced per `group_id` on update (§4.5.1).
#[async_trait]
pub trait TmdbMappingRepository: Send + Sync {
    async fn list_for_group(&self, group_id: &str) -> AppResult<Vec<TmdbEpisodeMapping>>;
    async fn replace_for_group(&self, group_id: &str, mappings: Vec<TmdbEpisodeMapping>) -> AppResult<()>;
}

#[async_trait]
pub trait ScraperSettingRepository: Send + Sync {
    async fn list_ordered(&self) -> AppResult<Vec<ScraperSetting>>;
    async fn get(&self, provider_name: &str) -> AppResult<Option<ScraperSetting>>;
    async fn upsert(&self, setting: ScraperSetting) -> AppResult<()>;
}

#[async_trait]
pub trait ApiTokenRepository: Send + Sync {
    async fn find(&self, token: &str) -> AppResult<Option<ApiToken>>;
}

#[async_trait]
pub trait ScheduledTaskRepository: Send + Sync {
    async fn list(&self) -> AppResult<Vec<ScheduledTask>>;
    async fn list_enabled(&self) -> AppResult<Vec<ScheduledTask>>;
    async fn upsert(&self, task: ScheduledTask) -> AppResult<()>;
    async fn record_run(&self, id: Uuid, last_run: DateTime<Utc>, next_run: Option<DateTime<Utc>>) -> AppResult<()>;
}

/// Monotonic state machine: queued -> running -> (completed | failed)
/// (§4.4).
#[async_trait]
pub trait TaskHistoryRepository: Send + Sync {
    async fn create(&self, history: TaskHistory) -> AppResult<TaskHistory>;
    async fn update_progress(&self, id: Uuid, progress: i32, description: &str) -> AppResult<()>;
    async fn transition(&self, id: Uuid, status: TaskStatus, description: &str) -> AppResult<()>;
    async fn get(&self, id: Uuid) -> AppResult<Option<TaskHistory>>;
    async fn list_recent(&self, limit: i64) -> AppResult<Vec<TaskHistory>>;
}

/// `(provider, key, value_json, expires_at)` (§3).
#[async_trait]
pub trait CacheRepository: Send + Sync {
    async fn get(&self, provider: &str, key: &str) -> AppResult<Option<CacheEntry>>;
    async fn set(&self, entry: CacheEntry) -> AppResult<()>;
    /// Deletes every row with `expires_at <= now`; returns the count
    /// removed. Driven by the hourly sweep in `modules::cache`.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> AppResult<i64>;
}

/// Runtime-tunable values excluded from the out-of-scope "config loading
/// from YAML/env" surface: TMDB API key, provider cookies, per-provider
/// min-interval overrides, cache TTLs (§10.3).
#[async_trait]
pub trait ConfigKvRepository: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> AppResult<()>;
}

//! Diesel row models. Kept separate from the domain entities in
//! `modules::comment` so a storage-column rename never ripples into
//! import/match/provider code; each repository converts at its boundary.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::*;

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = works)]
pub struct WorkRow {
    pub id: Uuid,
    pub title: String,
    pub media_kind: String,
    pub season: i32,
    pub poster_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = work_metadata)]
pub struct WorkMetadataRow {
    pub work_id: Uuid,
    pub tmdb_id: Option<i32>,
    pub tmdb_episode_group_id: Option<String>,
    pub bangumi_id: Option<i32>,
    pub tvdb_id: Option<i32>,
    pub douban_id: Option<String>,
    pub imdb_id: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = work_aliases)]
pub struct WorkAliasesRow {
    pub work_id: Uuid,
    pub alias_en: Option<String>,
    pub alias_jp: Option<String>,
    pub alias_romaji: Option<String>,
    pub alias_cn_1: Option<String>,
    pub alias_cn_2: Option<String>,
    pub alias_cn_3: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = sources)]
pub struct SourceRow {
    pub id: Uuid,
    pub work_id: Uuid,
    pub provider: String,
    pub provider_media_id: String,
    pub favorited: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = episodes)]
pub struct EpisodeRow {
    pub id: Uuid,
    pub source_id: Uuid,
    pub episode_index: i32,
    pub title: Option<String>,
    pub playback_url: Option<String>,
    pub provider_episode_id: String,
    pub fetched_at: Option<DateTime<Utc>>,
    pub comment_count: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = comments)]
pub struct CommentRow {
    pub id: Uuid,
    pub episode_id: Uuid,
    pub cid: i64,
    pub p: String,
    pub m: String,
    pub t: f64,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = tmdb_episode_mappings)]
pub struct TmdbEpisodeMappingRow {
    pub id: Uuid,
    pub tmdb_tv_id: i32,
    pub group_id: String,
    pub tmdb_episode_id: i32,
    pub native_season_number: i32,
    pub native_episode_number: i32,
    pub custom_season_number: i32,
    pub custom_episode_number: i32,
    pub absolute_episode_number: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = scraper_settings)]
pub struct ScraperSettingRow {
    pub provider_name: String,
    pub is_enabled: bool,
    pub display_order: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = api_tokens)]
pub struct ApiTokenRow {
    pub token: String,
    pub label: String,
    pub enabled: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = scheduled_tasks)]
pub struct ScheduledTaskRow {
    pub id: Uuid,
    pub name: String,
    pub job_type: String,
    pub cron_expression: String,
    pub enabled: bool,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = task_history)]
pub struct TaskHistoryRow {
    pub id: Uuid,
    pub title: String,
    pub status: String,
    pub progress: i32,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = cache_entries)]
pub struct CacheEntryRow {
    pub provider: String,
    pub key: String,
    pub value_json: serde_json::Value,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = config_kv)]
pub struct ConfigKvRow {
    pub key: String,
    pub value: String,
}

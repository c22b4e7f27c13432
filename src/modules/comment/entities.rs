use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::media_kind::MediaKind;

/// §3 "Work": a show or film. `(title, season)` uniquely identifies a Work
/// within the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Work {
    pub id: Uuid,
    pub title: String,
    pub media_kind: MediaKind,
    pub season: i32,
    pub poster_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Work {
    pub fn new(title: String, media_kind: MediaKind, season: Option<i32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: super::title::normalize_title(&title),
            media_kind,
            season: season.unwrap_or(1),
            poster_url: None,
            created_at: Utc::now(),
        }
    }
}

/// §3 "WorkMetadata": 1:1 with Work, fill-if-absent lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkMetadata {
    pub work_id: Uuid,
    pub tmdb_id: Option<i32>,
    pub tmdb_episode_group_id: Option<String>,
    pub bangumi_id: Option<i32>,
    pub tvdb_id: Option<i32>,
    pub douban_id: Option<String>,
    pub imdb_id: Option<String>,
}

impl WorkMetadata {
    pub fn empty(work_id: Uuid) -> Self {
        Self {
            work_id,
            ..Default::default()
        }
    }

    /// Fill-if-absent merge used by both generic import and the TMDB job.
    pub fn fill_absent(&mut self, other: &WorkMetadata) {
        if self.tmdb_id.is_none() {
            self.tmdb_id = other.tmdb_id;
        }
        if self.tmdb_episode_group_id.is_none() {
            self.tmdb_episode_group_id = other.tmdb_episode_group_id.clone();
        }
        if self.bangumi_id.is_none() {
            self.bangumi_id = other.bangumi_id;
        }
        if self.tvdb_id.is_none() {
            self.tvdb_id = other.tvdb_id;
        }
        if self.douban_id.is_none() {
            self.douban_id = other.douban_id.clone();
        }
        if self.imdb_id.is_none() {
            self.imdb_id = other.imdb_id.clone();
        }
    }
}

/// §3 "WorkAliases": seven named alias slots, fill-if-absent lifecycle.
/// Per §9 Open Question, the cn1..cn3 slots are fixed — no arbitrary-N
/// aliasing is introduced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkAliases {
    pub work_id: Uuid,
    pub alias_en: Option<String>,
    pub alias_jp: Option<String>,
    pub alias_romaji: Option<String>,
    pub alias_cn_1: Option<String>,
    pub alias_cn_2: Option<String>,
    pub alias_cn_3: Option<String>,
}

impl WorkAliases {
    pub fn empty(work_id: Uuid) -> Self {
        Self {
            work_id,
            ..Default::default()
        }
    }

    /// Fill the first empty cn slot, mirroring how the source's alias
    /// table is populated incrementally as new aliases are discovered.
    pub fn fill_cn_slot(&mut self, alias: String) {
        if self.alias_cn_1.is_none() {
            self.alias_cn_1 = Some(alias);
        } else if self.alias_cn_2.is_none() {
            self.alias_cn_2 = Some(alias);
        } else if self.alias_cn_3.is_none() {
            self.alias_cn_3 = Some(alias);
        }
    }
}

/// §3 "Source": one `(provider, provider_media_id)` attached to a Work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: Uuid,
    pub work_id: Uuid,
    pub provider: String,
    pub provider_media_id: String,
    pub favorited: bool,
    pub created_at: DateTime<Utc>,
}

impl Source {
    pub fn new(work_id: Uuid, provider: impl Into<String>, provider_media_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            work_id,
            provider: provider.into(),
            provider_media_id: provider_media_id.into(),
            favorited: false,
            created_at: Utc::now(),
        }
    }
}

/// §3 "Episode": belongs to a Source, 1-based index unique within Source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: Uuid,
    pub source_id: Uuid,
    pub episode_index: i32,
    pub title: Option<String>,
    pub playback_url: Option<String>,
    pub provider_episode_id: String,
    pub fetched_at: Option<DateTime<Utc>>,
    pub comment_count: i32,
}

impl Episode {
    pub fn new(source_id: Uuid, episode_index: i32, provider_episode_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_id,
            episode_index,
            title: None,
            playback_url: None,
            provider_episode_id: provider_episode_id.into(),
            fetched_at: None,
            comment_count: 0,
        }
    }
}

/// §3 "Comment": `(episode, cid)` unique; duplicates silently ignored.
///
/// `p` is always `"t_seconds,mode,color,[provider]"` (§6 "Wire format").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub episode_id: Uuid,
    pub cid: i64,
    pub p: String,
    pub m: String,
    pub t: f64,
}

/// Danmaku comment mode, part of the `p` wire parameter (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum CommentMode {
    Scroll = 1,
    BottomFixed = 4,
    TopFixed = 5,
}

impl CommentMode {
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            1 => Some(CommentMode::Scroll),
            4 => Some(CommentMode::BottomFixed),
            5 => Some(CommentMode::TopFixed),
            _ => None,
        }
    }
}

/// Build the `p` string, validating the invariant in §8: `"<non-negative
/// float>,<1|4|5>,<0..16777215>,[<provider>]"`.
pub fn build_p(t_seconds: f64, mode: i32, color: u32, provider: &str) -> String {
    format!("{:.3},{},{},[{}]", t_seconds.max(0.0), mode, color, provider)
}

/// §3 "TmdbEpisodeMapping": fully replaced per group on update (§4.5.1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmdbEpisodeMapping {
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

/// §3 "ScraperSetting": `(provider_name, is_enabled, display_order)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScraperSetting {
    pub provider_name: String,
    pub is_enabled: bool,
    pub display_order: i32,
}

/// §3 "ApiToken".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiToken {
    pub token: String,
    pub label: String,
    pub enabled: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ApiToken {
    /// §8: token expired or disabled -> 403 on any compat API call.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.enabled && self.expires_at.map(|exp| exp > now).unwrap_or(true)
    }
}

/// §3 "ScheduledTask".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub id: Uuid,
    pub name: String,
    pub job_type: String,
    pub cron_expression: String,
    pub enabled: bool,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: Option<DateTime<Utc>>,
}

/// §3 "TaskHistory" status, §4.4 "States: queued -> running -> (completed
/// | failed). Transitions are monotonic."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Monotonic transition check per §4.4.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Queued, TaskStatus::Running)
                | (TaskStatus::Running, TaskStatus::Completed)
                | (TaskStatus::Running, TaskStatus::Failed)
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskHistory {
    pub id: Uuid,
    pub title: String,
    pub status: TaskStatus,
    pub progress: i32,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// §3 "CacheEntry": `(provider, key, value_json, expires_at)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub provider: String,
    pub key: String,
    pub value_json: serde_json::Value,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_status_transitions_are_monotonic() {
        assert!(TaskStatus::Queued.can_transition_to(TaskStatus::Running));
        assert!(TaskStatus::Running.can_transition_to(TaskStatus::Completed));
        assert!(TaskStatus::Running.can_transition_to(TaskStatus::Failed));
        assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::Running));
        assert!(!TaskStatus::Queued.can_transition_to(TaskStatus::Completed));
        assert!(!TaskStatus::Failed.can_transition_to(TaskStatus::Running));
    }

    #[test]
    fn p_string_matches_wire_format() {
        let p = build_p(10.5, 1, 16711680, "bilibili");
        assert_eq!(p, "10.500,1,16711680,[bilibili]");
    }

    #[test]
    fn api_token_expiry_and_disable() {
        let now = Utc::now();
        let valid = ApiToken {
            token: "t".into(),
            label: "l".into(),
            enabled: true,
            expires_at: None,
        };
        assert!(valid.is_valid(now));

        let disabled = ApiToken {
            enabled: false,
            ..valid.clone()
        };
        assert!(!disabled.is_valid(now));

        let expired = ApiToken {
            expires_at: Some(now - chrono::Duration::seconds(1)),
            ..valid
        };
        assert!(!expired.is_valid(now));
    }
}

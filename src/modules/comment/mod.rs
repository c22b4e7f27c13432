//! Normalized danmaku record + provider record schema (§3 "Data model").
//!
//! This is the domain layer every other module (persistence, import,
//! provider adapters, match dispatch) shares: the entities here carry no
//! storage or HTTP concerns, only the invariants spec.md §3 and §8 name.

mod entities;
mod media_kind;
mod title;

pub use entities::{
    ApiToken, CacheEntry, Comment, Episode, ScheduledTask, ScraperSetting, Source, TaskHistory,
    TaskStatus, TmdbEpisodeMapping, Work, WorkAliases, WorkMetadata,
};
pub use media_kind::MediaKind;
pub use title::normalize_title;

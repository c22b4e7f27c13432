//! Diesel-backed implementations of the `persistence` traits. Every public
//! method routes through `Database::run_blocking` so the Diesel call runs
//! on the blocking thread pool rather than the async scheduler (§5: "CPU
//! and blocking I/O work must be dispatched off the event loop").

mod models;
mod work_repository;
mod source_repository;
mod episode_repository;
mod comment_repository;
mod tmdb_mapping_repository;
mod scraper_setting_repository;
mod api_token_repository;
mod scheduled_task_repository;
mod task_history_repository;
mod cache_repository;
mod config_kv_repository;

pub use work_repository::WorkRepositoryImpl;
pub use source_repository::SourceRepositoryImpl;
pub use episode_repository::EpisodeRepositoryImpl;
pub use comment_repository::CommentRepositoryImpl;
pub use tmdb_mapping_repository::TmdbMappingRepositoryImpl;
pub use scraper_setting_repository::ScraperSettingRepositoryImpl;
pub use api_token_repository::ApiTokenRepositoryImpl;
pub use scheduled_task_repository::ScheduledTaskRepositoryImpl;
pub use task_history_repository::TaskHistoryRepositoryImpl;
pub use cache_repository::CacheRepositoryImpl;
pub use config_kv_repository::ConfigKvRepositoryImpl;

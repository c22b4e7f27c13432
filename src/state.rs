use std::sync::Arc;

use crate::modules::cache::CacheStore;
use crate::modules::config::RuntimeConfig;
use crate::modules::import::ImportEngine;
use crate::modules::jobs::TaskEngine;
use crate::modules::match_dispatch::MatchDispatcher;
use crate::modules::persistence::{
    ApiTokenRepository, CommentRepository, EpisodeRepository, SourceRepository, WorkRepository,
};
use crate::modules::provider::ProviderRegistry;

/// Shared handle every axum handler (compat API, webhook ingress) is given
/// via `axum::extract::State`: one `Arc`-wrapped struct holding every
/// repository and engine a handler might need.
#[derive(Clone)]
pub struct AppState {
    pub works: Arc<dyn WorkRepository>,
    pub sources: Arc<dyn SourceRepository>,
    pub episodes: Arc<dyn EpisodeRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub api_tokens: Arc<dyn ApiTokenRepository>,
    pub registry: Arc<ProviderRegistry>,
    pub task_engine: Arc<TaskEngine>,
    pub import_engine: Arc<ImportEngine>,
    pub match_dispatcher: Arc<MatchDispatcher>,
    pub cache: Arc<CacheStore>,
    pub config: Arc<RuntimeConfig>,
}

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

use super::handlers::{get_bangumi, get_comments, match_batch, match_one, search_anime, search_episodes};

/// §6 "all paths nested under `/api/{token}`... The same paths are exposed
/// twice: at the root and under `/api/v2/` (player compatibility)." Built
/// once and mounted at both prefixes so the two surfaces never drift. The
/// second mount is `/api/:token/api/v2`, not `/api/:token/v2` — a
/// dandanplay-compatible player always requests `/api/v2/...` beneath
/// whatever base it was given, so the compatibility prefix repeats `api`.
fn token_scoped_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/search/episodes", get(search_episodes))
        .route("/search/anime", get(search_anime))
        .route("/match", post(match_one))
        .route("/match/batch", post(match_batch))
        .route("/bangumi/:id", get(get_bangumi))
        .route("/comment/:episode_id", get(get_comments))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api/:token", token_scoped_routes())
        .nest("/api/:token/api/v2", token_scoped_routes())
}

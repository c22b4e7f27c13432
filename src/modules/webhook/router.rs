use std::sync::Arc;

use axum::routing::post;
use axum::Router;

use crate::state::AppState;

use super::handlers::webhook_by_type;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/webhook/:type", post(webhook_by_type))
}

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use crate::state::AppState;
use crate::{log_info, log_warn};

use super::payload::{emby_to_match_request, jellyfin_to_match_request, EmbyWebhookPayload, JellyfinWebhookPayload};

#[derive(Debug, Deserialize)]
pub struct WebhookQuery {
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub accepted: bool,
}

/// §6 "`POST /webhook/{type}?api_key=…`." `api_key` reuses the same
/// `ApiToken` table the compat API authenticates against, since both are
/// externally-facing credentials with the same lifecycle (enable/expire).
async fn check_webhook_key(state: &AppState, query: &WebhookQuery) -> Result<(), StatusCode> {
    let key = query.api_key.as_deref().ok_or(StatusCode::FORBIDDEN)?;
    let record = state.api_tokens.find(key).await.map_err(|_| StatusCode::FORBIDDEN)?;
    match record {
        Some(t) if t.is_valid(chrono::Utc::now()) => Ok(()),
        _ => Err(StatusCode::FORBIDDEN),
    }
}

pub async fn emby_webhook(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WebhookQuery>,
    Json(payload): Json<EmbyWebhookPayload>,
) -> Result<Json<WebhookAck>, StatusCode> {
    check_webhook_key(&state, &query).await?;

    match emby_to_match_request(&payload) {
        Some(request) => {
            match state.match_dispatcher.dispatch(request).await {
                Ok(task_id) => log_info!("webhook: emby dispatch queued task {}", task_id),
                Err(err) => log_warn!("webhook: emby dispatch failed: {}", err),
            }
            Ok(Json(WebhookAck { accepted: true }))
        }
        None => Ok(Json(WebhookAck { accepted: false })),
    }
}

pub async fn jellyfin_webhook(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WebhookQuery>,
    Json(payload): Json<JellyfinWebhookPayload>,
) -> Result<Json<WebhookAck>, StatusCode> {
    check_webhook_key(&state, &query).await?;

    match jellyfin_to_match_request(&payload) {
        Some(request) => {
            match state.match_dispatcher.dispatch(request).await {
                Ok(task_id) => log_info!("webhook: jellyfin dispatch queued task {}", task_id),
                Err(err) => log_warn!("webhook: jellyfin dispatch failed: {}", err),
            }
            Ok(Json(WebhookAck { accepted: true }))
        }
        None => Ok(Json(WebhookAck { accepted: false })),
    }
}

/// Dispatches `/webhook/{type}` to the vendor-specific handler by path
/// segment, since Emby/Jellyfin payload shapes differ enough that a
/// single untyped handler would have to re-detect the vendor anyway.
pub async fn webhook_by_type(
    state: State<Arc<AppState>>,
    Path(kind): Path<String>,
    query: Query<WebhookQuery>,
    body: axum::body::Bytes,
) -> Result<Json<WebhookAck>, StatusCode> {
    match kind.as_str() {
        "emby" => {
            let payload: EmbyWebhookPayload =
                serde_json::from_slice(&body).map_err(|_| StatusCode::BAD_REQUEST)?;
            emby_webhook(state, query, Json(payload)).await
        }
        "jellyfin" => {
            let payload: JellyfinWebhookPayload =
                serde_json::from_slice(&body).map_err(|_| StatusCode::BAD_REQUEST)?;
            jellyfin_webhook(state, query, Json(payload)).await
        }
        _ => Err(StatusCode::NOT_FOUND),
    }
}

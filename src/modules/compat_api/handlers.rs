use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;

use crate::modules::match_dispatch::{SimilarityStrategy, TokenSetRatioStrategy};
use crate::modules::provider::ProviderSearchInfo;
use crate::shared::errors::AppError;
use crate::state::AppState;

use super::dto::{
    AnimeDto, BangumiDetailResponse, BatchMatchRequest, CommentDto, CommentListResponse, EpisodeDto,
    ErrorResponse, MatchInfo, MatchRequest, MatchResponse, SearchAnimeResponse,
};
use super::filename_match::parse_filename;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

fn error_response(status: StatusCode, code: i32, message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (status, Json(ErrorResponse { success: false, error_code: code, error_message: message.into() }))
}

/// §6 "`{token}` must match an enabled, non-expired ApiToken; on mismatch
/// return 403."
async fn check_token(state: &AppState, token: &str) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    let record = state
        .api_tokens
        .find(token)
        .await
        .map_err(|_| error_response(StatusCode::FORBIDDEN, 403, "invalid token"))?;
    match record {
        Some(t) if t.is_valid(Utc::now()) => Ok(()),
        _ => Err(error_response(StatusCode::FORBIDDEN, 403, "invalid or expired token")),
    }
}

pub async fn search_anime(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<SearchAnimeResponse> {
    check_token(&state, &token).await?;

    let keyword = params.get("keyword").or_else(|| params.get("anime")).cloned().unwrap_or_default();
    if keyword.trim().is_empty() {
        return Err(error_response(StatusCode::UNPROCESSABLE_ENTITY, 422, "keyword must not be empty"));
    }

    let results = state.registry.search_all(&[keyword], None).await;
    let animes = results.iter().map(AnimeDto::from_search_result).collect();
    Ok(Json(SearchAnimeResponse::ok(animes)))
}

pub async fn search_episodes(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<SearchAnimeResponse> {
    check_token(&state, &token).await?;

    let title = params.get("anime").cloned().unwrap_or_default();
    if title.trim().is_empty() {
        return Err(error_response(StatusCode::UNPROCESSABLE_ENTITY, 422, "anime must not be empty"));
    }
    let episode_hint: Option<i32> = params.get("episode").and_then(|e| e.parse().ok());

    let results = state.registry.search_all(&[title], episode_hint).await;
    let mut animes: Vec<AnimeDto> = Vec::new();
    // Episode listings are only fetched for the top few candidates to
    // bound the number of outbound provider calls a single search makes.
    for info in results.iter().take(3) {
        let mut dto = AnimeDto::from_search_result(info);
        if let Some(adapter) = state.registry.find_adapter(&info.provider).await {
            if let Ok(eps) = adapter.get_episodes(&info.media_id, None).await {
                dto.episodes = eps
                    .into_iter()
                    .map(|e| EpisodeDto {
                        episode_id: format!("{}:{}:{}", info.provider, info.media_id, e.index),
                        episode_title: format!("第{}话", e.index),
                    })
                    .collect();
            }
        }
        animes.push(dto);
    }
    animes.extend(results.iter().skip(3).map(AnimeDto::from_search_result));

    Ok(Json(SearchAnimeResponse::ok(animes)))
}

/// Resolves parsed-filename candidates against the local catalog: a
/// candidate only counts as a match once it already has a persisted
/// Source (i.e. it was imported via the match dispatcher or a webhook
/// at some point before this filename arrived at the compat API).
async fn resolve_match_candidates(state: &AppState, title: &str, episode: i32) -> Vec<MatchInfo> {
    let similarity = TokenSetRatioStrategy;
    let mut ranked: Vec<ProviderSearchInfo> = state.registry.search_all(&[title.to_string()], Some(episode)).await;
    ranked.sort_by(|a, b| {
        similarity
            .calculate(title, &b.title)
            .partial_cmp(&similarity.calculate(title, &a.title))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut infos = Vec::new();
    for candidate in ranked {
        let source = match state.sources.find_by_provider_media(&candidate.provider, &candidate.media_id).await {
            Ok(Some(s)) => s,
            _ => continue,
        };
        let work = match state.works.get(source.work_id).await {
            Ok(Some(w)) => w,
            _ => continue,
        };
        let episode_row = match state.episodes.find_by_source_index(source.id, episode).await {
            Ok(Some(e)) => e,
            _ => continue,
        };
        infos.push(MatchInfo {
            episode_id: episode_row.id.to_string(),
            anime_id: work.id.to_string(),
            anime_title: work.title.clone(),
            episode_title: format!("第{}话", episode),
            kind: match work.media_kind {
                crate::modules::comment::MediaKind::Movie => "movie",
                crate::modules::comment::MediaKind::Ova => "ova",
                crate::modules::comment::MediaKind::Other => "other",
                crate::modules::comment::MediaKind::TvSeries => "tvseries",
            },
            type_description: "",
            shift: 0.0,
        });
    }
    infos
}

pub async fn match_one(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Json(body): Json<MatchRequest>,
) -> ApiResult<MatchResponse> {
    check_token(&state, &token).await?;

    let parsed = parse_filename(&body.file_name);
    let candidates = resolve_match_candidates(&state, &parsed.title, parsed.episode).await;

    let distinct_works: std::collections::HashSet<&str> =
        candidates.iter().map(|c| c.anime_id.as_str()).collect();

    Ok(Json(if candidates.is_empty() {
        MatchResponse::unmatched()
    } else if distinct_works.len() == 1 {
        MatchResponse::single(candidates.into_iter().next().unwrap())
    } else {
        MatchResponse::alternatives(candidates)
    }))
}

pub async fn match_batch(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Json(body): Json<BatchMatchRequest>,
) -> ApiResult<Vec<MatchResponse>> {
    check_token(&state, &token).await?;

    if body.requests.len() > 32 {
        return Err(error_response(StatusCode::BAD_REQUEST, 400, "batch size must not exceed 32"));
    }

    let mut out = Vec::with_capacity(body.requests.len());
    for request in &body.requests {
        let parsed = parse_filename(&request.file_name);
        let candidates = resolve_match_candidates(&state, &parsed.title, parsed.episode).await;
        let distinct_works: std::collections::HashSet<&str> =
            candidates.iter().map(|c| c.anime_id.as_str()).collect();
        out.push(if candidates.len() == 1 && distinct_works.len() == 1 {
            MatchResponse::single(candidates.into_iter().next().unwrap())
        } else {
            MatchResponse::unmatched()
        });
    }
    Ok(Json(out))
}

/// §6 "id forms — `A<int>` (internal work id prefix), bare integer
/// (internal id), or external bangumi id." Our internal Work id is a
/// UUID rather than an integer, so the `A`-prefixed and bare-integer
/// forms are reinterpreted as a UUID-keyed internal id (see DESIGN.md);
/// any other numeric string is looked up as an external bangumi id.
pub async fn get_bangumi(
    State(state): State<Arc<AppState>>,
    Path((token, id)): Path<(String, String)>,
) -> ApiResult<BangumiDetailResponse> {
    check_token(&state, &token).await?;

    let stripped = id.strip_prefix('A').unwrap_or(&id);
    let work = if let Ok(uuid) = stripped.parse::<uuid::Uuid>() {
        state.works.get(uuid).await.map_err(|_| error_response(StatusCode::NOT_FOUND, 404, "not found"))?
    } else if let Ok(bangumi_id) = id.parse::<i32>() {
        state
            .works
            .find_by_bangumi_id(bangumi_id)
            .await
            .map_err(|_| error_response(StatusCode::NOT_FOUND, 404, "not found"))?
            .map(|(w, _)| w)
    } else {
        None
    };

    let work = work.ok_or_else(|| error_response(StatusCode::NOT_FOUND, 404, "bangumi not found"))?;
    let sources = state.sources.list_for_work(work.id).await.unwrap_or_default();
    let mut episodes = Vec::new();
    if let Some(source) = sources.into_iter().find(|s| s.favorited) {
        if let Ok(rows) = state.episodes.list_for_source(source.id).await {
            episodes = rows
                .into_iter()
                .map(|e| EpisodeDto { episode_id: e.id.to_string(), episode_title: format!("第{}话", e.episode_index) })
                .collect();
        }
    }

    let dto = AnimeDto {
        anime_id: work.id.to_string(),
        bangumi_id: id,
        anime_title: work.title.clone(),
        kind: match work.media_kind {
            crate::modules::comment::MediaKind::Movie => "movie",
            crate::modules::comment::MediaKind::Ova => "ova",
            crate::modules::comment::MediaKind::Other => "other",
            crate::modules::comment::MediaKind::TvSeries => "tvseries",
        },
        type_description: "",
        image_url: work.poster_url.clone().unwrap_or_default(),
        start_date: None,
        episode_count: episodes.len() as i32,
        episodes,
    };
    Ok(Json(BangumiDetailResponse { success: true, error_code: 0, bangumi: dto }))
}

pub async fn get_comments(
    State(state): State<Arc<AppState>>,
    Path((token, episode_id)): Path<(String, String)>,
) -> ApiResult<CommentListResponse> {
    check_token(&state, &token).await?;

    let episode_uuid: uuid::Uuid =
        episode_id.parse().map_err(|_| error_response(StatusCode::NOT_FOUND, 404, "bad episode id"))?;
    let comments = state
        .comments
        .list_for_episode(episode_uuid)
        .await
        .map_err(|e: AppError| error_response(StatusCode::INTERNAL_SERVER_ERROR, 500, e.to_string()))?;

    let dtos: Vec<CommentDto> = comments.into_iter().map(|c| CommentDto { cid: c.cid, p: c.p, m: c.m }).collect();
    Ok(Json(CommentListResponse { count: dtos.len() as i32, comments: dtos }))
}

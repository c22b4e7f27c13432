use serde::{Deserialize, Serialize};

use crate::modules::comment::MediaKind;
use crate::modules::provider::ProviderSearchInfo;

/// dandanplay-compatible type tags used on the wire; distinct from
/// `MediaKind::as_str()`'s internal snake_case form (§6).
fn wire_type(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::TvSeries => "tvseries",
        MediaKind::Movie => "movie",
        MediaKind::Ova => "ova",
        MediaKind::Other => "other",
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EpisodeDto {
    #[serde(rename = "episodeId")]
    pub episode_id: String,
    #[serde(rename = "episodeTitle")]
    pub episode_title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnimeDto {
    #[serde(rename = "animeId")]
    pub anime_id: String,
    #[serde(rename = "bangumiId")]
    pub bangumi_id: String,
    #[serde(rename = "animeTitle")]
    pub anime_title: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(rename = "typeDescription")]
    pub type_description: &'static str,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "episodeCount")]
    pub episode_count: i32,
    pub episodes: Vec<EpisodeDto>,
}

impl AnimeDto {
    /// §6 "`animes:[{animeId, bangumiId, animeTitle, type, typeDescription,
    /// imageUrl, startDate, episodeCount, episodes:[...]}]`." `animeId` is
    /// the `(provider, media_id)` pair encoded for round-tripping through
    /// `/match`, since the compat API has no concept of our internal UUID
    /// until a Source actually exists.
    pub fn from_search_result(info: &ProviderSearchInfo) -> Self {
        Self {
            anime_id: format!("{}:{}", info.provider, info.media_id),
            bangumi_id: String::new(),
            anime_title: info.title.clone(),
            kind: wire_type(info.media_kind),
            type_description: wire_type(info.media_kind),
            image_url: info.poster_url.clone().unwrap_or_default(),
            start_date: info.year.map(|y| format!("{}-01-01", y)),
            episode_count: info.episode_count.unwrap_or(0),
            episodes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchAnimeResponse {
    pub success: bool,
    #[serde(rename = "errorCode")]
    pub error_code: i32,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
    pub animes: Vec<AnimeDto>,
}

impl SearchAnimeResponse {
    pub fn ok(animes: Vec<AnimeDto>) -> Self {
        Self { success: true, error_code: 0, has_more: false, animes }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchRequest {
    #[serde(rename = "fileName")]
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchInfo {
    #[serde(rename = "episodeId")]
    pub episode_id: String,
    #[serde(rename = "animeId")]
    pub anime_id: String,
    #[serde(rename = "animeTitle")]
    pub anime_title: String,
    #[serde(rename = "episodeTitle")]
    pub episode_title: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(rename = "typeDescription")]
    pub type_description: &'static str,
    pub shift: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchResponse {
    pub success: bool,
    #[serde(rename = "errorCode")]
    pub error_code: i32,
    #[serde(rename = "isMatched")]
    pub is_matched: bool,
    pub matches: Vec<MatchInfo>,
}

impl MatchResponse {
    pub fn unmatched() -> Self {
        Self { success: true, error_code: 0, is_matched: false, matches: Vec::new() }
    }

    pub fn single(info: MatchInfo) -> Self {
        Self { success: true, error_code: 0, is_matched: true, matches: vec![info] }
    }

    pub fn alternatives(infos: Vec<MatchInfo>) -> Self {
        Self { success: true, error_code: 0, is_matched: false, matches: infos }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchMatchRequest {
    #[serde(rename = "requests")]
    pub requests: Vec<MatchRequest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BangumiDetailResponse {
    pub success: bool,
    #[serde(rename = "errorCode")]
    pub error_code: i32,
    pub bangumi: AnimeDto,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentDto {
    pub cid: i64,
    pub p: String,
    pub m: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentListResponse {
    pub count: i32,
    pub comments: Vec<CommentDto>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    #[serde(rename = "errorCode")]
    pub error_code: i32,
    #[serde(rename = "errorMessage")]
    pub error_message: String,
}

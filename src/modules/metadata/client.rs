use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::shared::errors::AppResult;

/// §4.5.1 "TMDB auto-map job": the three TMDB endpoints that job drives.
/// Trait-ized the way the teacher's `ProviderAdapter` wraps TMDB, so the
/// scheduler job can be tested against a fake without a live API key.
#[async_trait]
pub trait TmdbClient: Send + Sync {
    async fn episode_groups(&self, tv_id: i32) -> AppResult<Vec<TmdbEpisodeGroup>>;
    async fn episode_group_detail(&self, group_id: &str) -> AppResult<TmdbEpisodeGroupDetail>;
    async fn tv_with_alternative_titles(&self, tv_id: i32) -> AppResult<TmdbTvDetail>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbEpisodeGroup {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbEpisodeGroupDetail {
    pub id: String,
    pub groups: Vec<TmdbEpisodeGroupSeason>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbEpisodeGroupSeason {
    pub order: i32,
    pub episodes: Vec<TmdbGroupEpisode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGroupEpisode {
    pub id: i32,
    pub season_number: i32,
    pub episode_number: i32,
    pub order: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbTvDetail {
    pub id: i32,
    #[serde(default)]
    pub alternative_titles: Option<TmdbAlternativeTitles>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbAlternativeTitles {
    #[serde(default)]
    pub results: Vec<TmdbAlternativeTitle>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbAlternativeTitle {
    pub iso_3166_1: String,
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

pub struct TmdbHttpClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl TmdbHttpClient {
    pub fn new(http: Client, api_key: String) -> Self {
        Self {
            http,
            api_key,
            base_url: "https://api.themoviedb.org/3".to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}?api_key={}", self.base_url, path, self.api_key)
    }
}

#[async_trait]
impl TmdbClient for TmdbHttpClient {
    async fn episode_groups(&self, tv_id: i32) -> AppResult<Vec<TmdbEpisodeGroup>> {
        #[derive(Deserialize)]
        struct Response {
            results: Vec<TmdbEpisodeGroup>,
        }
        let url = self.url(&format!("/tv/{}/episode_groups", tv_id));
        let resp: Response = self.http.get(url).send().await?.json().await?;
        Ok(resp.results)
    }

    async fn episode_group_detail(&self, group_id: &str) -> AppResult<TmdbEpisodeGroupDetail> {
        let url = self.url(&format!("/tv/episode_group/{}", group_id));
        Ok(self.http.get(url).send().await?.json().await?)
    }

    async fn tv_with_alternative_titles(&self, tv_id: i32) -> AppResult<TmdbTvDetail> {
        let url = format!(
            "{}/tv/{}?api_key={}&append_to_response=alternative_titles",
            self.base_url, tv_id, self.api_key
        );
        Ok(self.http.get(url).send().await?.json().await?)
    }
}

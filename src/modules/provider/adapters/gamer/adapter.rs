use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use zhconv::{zhconv, Variant};

use crate::log_warn;
use crate::modules::comment::MediaKind;
use crate::modules::persistence::ConfigKvRepository;
use crate::modules::provider::season::extract_season;
use crate::modules::provider::title_filter::is_junk_title;
use crate::modules::provider::traits::{
    NormalizedComment, ProviderAdapter, ProviderEpisodeInfo, ProviderSearchInfo, RateLimiterInfo,
};
use crate::shared::errors::AppResult;
use crate::shared::utils::rate_limiter::RateLimiter;

const CONFIG_KEY: &str = "gamer_cookie";
const LOGIN_WALL_SENTINEL: &str = "登入";

pub struct GamerAdapter {
    http: Client,
    limiter: RateLimiter,
    config: Arc<dyn ConfigKvRepository>,
    cookie: StdMutex<Option<String>>,
}

impl GamerAdapter {
    pub fn new(http: Client, config: Arc<dyn ConfigKvRepository>) -> Self {
        Self {
            http,
            limiter: RateLimiter::new(1.0),
            config,
            cookie: StdMutex::new(None),
        }
    }

    fn current_cookie(&self) -> Option<String> {
        self.cookie.lock().unwrap().clone()
    }

    async fn get(&self, url: &str) -> AppResult<String> {
        self.limiter.wait().await?;
        let cookie = self.current_cookie();
        let body = self.request_with_cookie(url, cookie.as_deref()).await?;

        if body.contains(LOGIN_WALL_SENTINEL) {
            if let Err(err) = self.refresh_session().await {
                log_warn!("gamer: cookie refresh failed, retrying with existing session: {}", err);
            }
            self.limiter.wait().await?;
            let cookie = self.current_cookie();
            return self.request_with_cookie(url, cookie.as_deref()).await;
        }
        Ok(body)
    }

    async fn request_with_cookie(&self, url: &str, cookie: Option<&str>) -> AppResult<String> {
        let mut req = self.http.get(url);
        if let Some(c) = cookie {
            req = req.header(reqwest::header::COOKIE, c);
        }
        Ok(req.send().await?.text().await?)
    }
}

#[async_trait]
impl ProviderAdapter for GamerAdapter {
    fn provider_name(&self) -> &'static str {
        "gamer"
    }

    fn get_rate_limit_info(&self) -> RateLimiterInfo {
        RateLimiterInfo::new(1.0)
    }

    /// §4.1.6 "apply simplified→traditional conversion on keyword before
    /// search; traditional→simplified on returned titles."
    async fn search(&self, keyword: &str, _episode_hint: Option<i32>) -> AppResult<Vec<ProviderSearchInfo>> {
        let traditional_keyword = zhconv(keyword, Variant::ZhHant);
        let url = format!(
            "https://ani.gamer.com.tw/search.php?keyword={}",
            urlencoding::encode(&traditional_keyword)
        );
        let body = self.get(&url).await?;

        let document = Html::parse_document(&body);
        let card_selector = Selector::parse("a.theme-list-main").unwrap();
        let title_selector = Selector::parse(".theme-name").unwrap();

        let mut out = Vec::new();
        for card in document.select(&card_selector) {
            let href = card.value().attr("href").unwrap_or_default();
            let sn = href.rsplit("sn=").next().unwrap_or_default();
            if sn.is_empty() || sn == href {
                continue;
            }
            let raw_title = card
                .select(&title_selector)
                .next()
                .map(|e| e.text().collect::<String>())
                .unwrap_or_default();
            let simplified_title = zhconv(raw_title.trim(), Variant::ZhHans);
            if simplified_title.is_empty() || is_junk_title(&simplified_title) {
                continue;
            }
            let (base_title, season) = extract_season(&simplified_title);
            out.push(ProviderSearchInfo {
                provider: self.provider_name().to_string(),
                media_id: sn.to_string(),
                title: base_title,
                media_kind: MediaKind::TvSeries,
                year: None,
                season,
                poster_url: None,
                episode_count: None,
                current_episode_index: None,
            });
        }
        Ok(out)
    }

    async fn get_episodes(
        &self,
        media_id: &str,
        _target_index: Option<i32>,
    ) -> AppResult<Vec<ProviderEpisodeInfo>> {
        let url = format!("https://ani.gamer.com.tw/animeVideo.php?sn={}", media_id);
        let body = self.get(&url).await?;
        let document = Html::parse_document(&body);
        let selector = Selector::parse(".season a").unwrap();

        let mut out = Vec::new();
        for (idx, a) in document.select(&selector).enumerate() {
            let href = a.value().attr("href").unwrap_or_default();
            let sn = href.rsplit("sn=").next().unwrap_or(media_id);
            let title = a.text().collect::<String>();
            out.push(ProviderEpisodeInfo {
                provider_episode_id: sn.to_string(),
                index: idx as i32 + 1,
                title: Some(zhconv(title.trim(), Variant::ZhHans)),
                playback_url: None,
            });
        }
        if out.is_empty() {
            out.push(ProviderEpisodeInfo {
                provider_episode_id: media_id.to_string(),
                index: 1,
                title: None,
                playback_url: None,
            });
        }
        Ok(out)
    }

    async fn get_comments(
        &self,
        provider_episode_id: &str,
        on_progress: &(dyn Fn(usize, usize) + Send + Sync),
    ) -> AppResult<Vec<NormalizedComment>> {
        let url = format!(
            "https://ani.gamer.com.tw/ajax/danmuGet.php?sn={}",
            provider_episode_id
        );
        self.limiter.wait().await?;
        let body = self.get(&url).await?;
        let items: Vec<serde_json::Value> = serde_json::from_str(&body)?;

        let mut out = Vec::with_capacity(items.len());
        for item in &items {
            let cid = item.get("sn").and_then(|v| v.as_i64()).unwrap_or(0);
            let t = item.get("time").and_then(|v| v.as_f64()).unwrap_or(0.0) / 10.0;
            let mode = match item.get("position").and_then(|v| v.as_i64()) {
                Some(1) => 5,
                Some(2) => 4,
                _ => 1,
            };
            let color = item
                .get("color")
                .and_then(|v| v.as_str())
                .and_then(|s| u32::from_str_radix(s.trim_start_matches('#'), 16).ok())
                .unwrap_or(0xFFFFFF);
            let raw_text = item.get("text").and_then(|v| v.as_str()).unwrap_or_default();
            out.push(NormalizedComment {
                cid,
                t,
                mode,
                color,
                text: zhconv(raw_text, Variant::ZhHans),
            });
        }
        on_progress(1, 1);
        Ok(out)
    }

    /// §4.1.6 "invoke `/ajax/token.php` to refresh the session cookie;
    /// persist new cookie string to config KV." A response with no new
    /// `Set-Cookie` is logged and treated as a no-op, not a fatal error —
    /// the caller retries with whatever cookie it already had, which may
    /// still succeed if the login wall was a transient render.
    async fn refresh_session(&self) -> AppResult<()> {
        self.limiter.wait().await?;
        let resp = self.http.get("https://ani.gamer.com.tw/ajax/token.php").send().await?;
        let new_cookie = resp
            .headers()
            .get_all(reqwest::header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).to_string())
            .collect::<Vec<_>>()
            .join("; ");

        if new_cookie.is_empty() {
            log_warn!("gamer: token refresh request sent but no new Set-Cookie was received");
            return Ok(());
        }

        *self.cookie.lock().unwrap() = Some(new_cookie.clone());
        self.config.set(CONFIG_KEY, &new_cookie).await?;
        Ok(())
    }
}

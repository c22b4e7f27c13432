use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::modules::comment::MediaKind;
use crate::modules::provider::season::extract_season;
use crate::modules::provider::title_filter::is_junk_title;
use crate::modules::provider::traits::{
    NormalizedComment, ProviderAdapter, ProviderEpisodeInfo, ProviderSearchInfo, RateLimiterInfo,
};
use crate::shared::errors::AppResult;
use crate::shared::utils::rate_limiter::RateLimiter;

pub struct MgtvAdapter {
    http: Client,
    limiter: RateLimiter,
}

impl MgtvAdapter {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            limiter: RateLimiter::new(2.0),
        }
    }

    /// §4.1.5 primary strategy: `getctlbarrage` for the CDN location, then
    /// `video/info` for the total minute count, then one JSON fetch per
    /// minute index.
    async fn fetch_primary(&self, cid: &str, vid: &str) -> AppResult<Option<Vec<NormalizedComment>>> {
        self.limiter.wait().await?;
        let ctl: Value = self
            .http
            .get("https://galaxy.bz.mgtv.com/getctlbarrage")
            .query(&[("cid", cid), ("vid", vid), ("type", "1")])
            .send()
            .await?
            .json()
            .await?;
        let cdn_host = ctl.get("data").and_then(|d| d.get("cdn_host")).and_then(|v| v.as_str());
        let cdn_version = ctl.get("data").and_then(|d| d.get("cdn_version")).and_then(|v| v.as_str());
        let (cdn_host, cdn_version) = match (cdn_host, cdn_version) {
            (Some(h), Some(v)) => (h.to_string(), v.to_string()),
            _ => return Ok(None),
        };

        self.limiter.wait().await?;
        let info: Value = self
            .http
            .get("https://pcweb.api.mgtv.com/video/info")
            .query(&[("cid", cid), ("vid", vid)])
            .send()
            .await?
            .json()
            .await?;
        let duration_seconds = info
            .get("data")
            .and_then(|d| d.get("info"))
            .and_then(|i| i.get("time"))
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(0.0);
        let total_minutes = (duration_seconds / 60.0).ceil() as i32;
        if total_minutes <= 0 {
            return Ok(None);
        }

        let mut out = Vec::new();
        for minute in 0..total_minutes {
            self.limiter.wait().await?;
            let resp: Value = self
                .http
                .get(format!("https://{}/{}/{}.json", cdn_host, cdn_version, minute))
                .send()
                .await?
                .json()
                .await?;
            if let Some(items) = resp.get("data").and_then(|d| d.get("items")).and_then(|v| v.as_array()) {
                for item in items {
                    out.push(normalize_item(item));
                }
            }
        }
        Ok(Some(out))
    }

    /// §4.1.5 fallback strategy: `opbarrage` paginated by `time` cursor,
    /// loop until `data.next==0` or empty items.
    async fn fetch_fallback(&self, cid: &str, vid: &str) -> AppResult<Vec<NormalizedComment>> {
        let mut out = Vec::new();
        let mut time_cursor = 0i64;
        loop {
            self.limiter.wait().await?;
            let resp: Value = self
                .http
                .get("https://galaxy.bz.mgtv.com/rdbarrage")
                .query(&[
                    ("cid", cid.to_string()),
                    ("vid", vid.to_string()),
                    ("time", time_cursor.to_string()),
                ])
                .send()
                .await?
                .json()
                .await?;
            let items = resp
                .get("data")
                .and_then(|d| d.get("items"))
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default();
            if items.is_empty() {
                break;
            }
            for item in &items {
                out.push(normalize_item(item));
            }
            let next = resp.get("data").and_then(|d| d.get("next")).and_then(|v| v.as_i64()).unwrap_or(0);
            if next == 0 {
                break;
            }
            time_cursor = next;
        }
        Ok(out)
    }
}

fn normalize_item(item: &Value) -> NormalizedComment {
    NormalizedComment {
        cid: item.get("id").and_then(|v| v.as_i64()).unwrap_or(0),
        t: item.get("time").and_then(|v| v.as_f64()).unwrap_or(0.0) / 1000.0,
        mode: item.get("type").and_then(|v| v.as_i64()).map(|v| v as i32).unwrap_or(1),
        color: item
            .get("color")
            .and_then(|v| v.as_i64())
            .map(|v| v as u32)
            .unwrap_or(0xFFFFFF),
        text: item.get("content").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
    }
}

#[async_trait]
impl ProviderAdapter for MgtvAdapter {
    fn provider_name(&self) -> &'static str {
        "mgtv"
    }

    fn get_rate_limit_info(&self) -> RateLimiterInfo {
        RateLimiterInfo::new(2.0)
    }

    /// §4.1.5 "Filter results to `source=="imgo"` only."
    async fn search(&self, keyword: &str, _episode_hint: Option<i32>) -> AppResult<Vec<ProviderSearchInfo>> {
        self.limiter.wait().await?;
        let resp: Value = self
            .http
            .get("https://so.mgtv.com/so/k1")
            .query(&[("q", keyword)])
            .send()
            .await?
            .json()
            .await?;

        let mut out = Vec::new();
        if let Some(contents) = resp.get("data").and_then(|d| d.get("contents")).and_then(|v| v.as_array()) {
            for group in contents {
                if let Some(data) = group.get("data").and_then(|v| v.as_array()) {
                    for item in data {
                        if item.get("source").and_then(|v| v.as_str()) != Some("imgo") {
                            continue;
                        }
                        let raw_title = item.get("title").and_then(|v| v.as_str()).unwrap_or_default();
                        let cleaned = raw_title.replace("<em>", "").replace("</em>", "");
                        if is_junk_title(&cleaned) {
                            continue;
                        }
                        let cid = match item.get("clip_id").and_then(|v| v.as_str()) {
                            Some(id) => id.to_string(),
                            None => continue,
                        };
                        let (base_title, season) = extract_season(&cleaned);
                        out.push(ProviderSearchInfo {
                            provider: self.provider_name().to_string(),
                            media_id: cid,
                            title: base_title,
                            media_kind: MediaKind::TvSeries,
                            year: None,
                            season,
                            poster_url: item.get("img").and_then(|v| v.as_str()).map(|s| s.to_string()),
                            episode_count: None,
                            current_episode_index: None,
                        });
                    }
                }
            }
        }
        Ok(out)
    }

    async fn get_episodes(
        &self,
        media_id: &str,
        _target_index: Option<i32>,
    ) -> AppResult<Vec<ProviderEpisodeInfo>> {
        self.limiter.wait().await?;
        let resp: Value = self
            .http
            .get("https://pcweb.api.mgtv.com/episode/list")
            .query(&[("video_id", media_id), ("page", "1"), ("size", "300")])
            .send()
            .await?
            .json()
            .await?;
        let mut out = Vec::new();
        if let Some(list) = resp.get("data").and_then(|d| d.get("list")).and_then(|v| v.as_array()) {
            for (idx, ep) in list.iter().enumerate() {
                let vid = ep.get("video_id").and_then(|v| v.as_str()).unwrap_or_default();
                if vid.is_empty() {
                    continue;
                }
                out.push(ProviderEpisodeInfo {
                    provider_episode_id: format!("{},{}", media_id, vid),
                    index: idx as i32 + 1,
                    title: ep.get("t1").and_then(|v| v.as_str()).map(|s| s.to_string()),
                    playback_url: None,
                });
            }
        }
        Ok(out)
    }

    async fn get_comments(
        &self,
        provider_episode_id: &str,
        on_progress: &(dyn Fn(usize, usize) + Send + Sync),
    ) -> AppResult<Vec<NormalizedComment>> {
        let mut parts = provider_episode_id.splitn(2, ',');
        let cid = parts.next().unwrap_or_default();
        let vid = parts.next().unwrap_or_default();

        let comments = match self.fetch_primary(cid, vid).await? {
            Some(list) => list,
            None => self.fetch_fallback(cid, vid).await?,
        };
        on_progress(1, 1);
        Ok(comments)
    }
}

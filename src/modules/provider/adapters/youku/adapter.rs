use std::sync::Mutex as StdMutex;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::modules::comment::MediaKind;
use crate::modules::provider::season::extract_season;
use crate::modules::provider::title_filter::is_junk_title;
use crate::modules::provider::traits::{
    NormalizedComment, ProviderAdapter, ProviderEpisodeInfo, ProviderSearchInfo, RateLimiterInfo,
};
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::rate_limiter::RateLimiter;

use super::signing::{build_msg_enc, outer_signature, segment_count};

const APP_KEY: &str = "24679788";

struct Session {
    cna: String,
    m_h5_tk: String,
}

pub struct YoukuAdapter {
    http: Client,
    limiter: RateLimiter,
    session: StdMutex<Option<Session>>,
}

fn jsonp_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"^utility\d*\((.*)\)$").unwrap())
}

impl YoukuAdapter {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            limiter: RateLimiter::new(2.0),
            session: StdMutex::new(None),
        }
    }

    /// §4.1.4 "Session: ensure cookies `cna` ... and `_m_h5_tk` ... before
    /// signing."
    async fn ensure_session(&self) -> AppResult<(String, String)> {
        if let Some(s) = self.session.lock().unwrap().as_ref() {
            return Ok((s.cna.clone(), s.m_h5_tk.clone()));
        }

        self.limiter.wait().await?;
        let cna_resp: Value = self
            .http
            .get("https://log.mmstat.com/eg.js")
            .send()
            .await?
            .json()
            .await
            .unwrap_or(json!({}));
        let cna = cna_resp
            .get("cna")
            .and_then(|v| v.as_str())
            .unwrap_or("000000000000000000000000")
            .to_string();

        self.limiter.wait().await?;
        let warmup = self
            .http
            .get("https://acs.youku.com/h5/mtop.youku.danmu.list/1.0/")
            .send()
            .await?;
        let m_h5_tk = warmup
            .cookies()
            .find(|c| c.name() == "_m_h5_tk")
            .map(|c| c.value().to_string())
            .unwrap_or_default();

        *self.session.lock().unwrap() = Some(Session {
            cna: cna.clone(),
            m_h5_tk: m_h5_tk.clone(),
        });
        Ok((cna, m_h5_tk))
    }

    /// §4.1.4 "Response is JSONP `utility\d+\((…)\)`; extract inner JSON;
    /// inner `data.result` is itself a JSON string to be parsed."
    fn unwrap_jsonp(body: &str) -> AppResult<Value> {
        let inner = jsonp_regex()
            .captures(body)
            .and_then(|c| c.get(1))
            .ok_or_else(|| AppError::ParseError("youku response is not JSONP".into()))?;
        let outer: Value = serde_json::from_str(inner.as_str())?;
        let result_str = outer
            .get("data")
            .and_then(|d| d.get("result"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::ParseError("missing data.result".into()))?;
        Ok(serde_json::from_str(result_str)?)
    }

    async fn fetch_segment(&self, vid: &str, mat: i32) -> AppResult<Vec<Value>> {
        let (cna, m_h5_tk) = self.ensure_session().await?;
        let ctime = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as i64;
        let (msg_enc, sign) = build_msg_enc("", ctime, &cna, vid, mat);
        let data_payload = json!({ "msg": msg_enc, "sign": sign }).to_string();
        let t = ctime;
        let outer_sign = outer_signature(&m_h5_tk, t, APP_KEY, &data_payload);

        self.limiter.wait().await?;
        let resp = self
            .http
            .get("https://acs.youku.com/h5/mtop.youku.danmu.externsvc.plugin/1.0/")
            .query(&[
                ("appKey", APP_KEY),
                ("t", &t.to_string()),
                ("sign", &outer_sign),
                ("data", &data_payload),
            ])
            .send()
            .await?
            .text()
            .await?;

        let parsed = Self::unwrap_jsonp(&resp)?;
        Ok(parsed
            .get("data")
            .and_then(|d| d.as_array())
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl ProviderAdapter for YoukuAdapter {
    fn provider_name(&self) -> &'static str {
        "youku"
    }

    fn get_rate_limit_info(&self) -> RateLimiterInfo {
        RateLimiterInfo::new(2.0)
    }

    async fn search(&self, keyword: &str, _episode_hint: Option<i32>) -> AppResult<Vec<ProviderSearchInfo>> {
        self.limiter.wait().await?;
        let resp: Value = self
            .http
            .get("https://so.youku.com/search_video")
            .query(&[("keyword", keyword)])
            .send()
            .await?
            .json()
            .await?;

        let mut out = Vec::new();
        if let Some(items) = resp.get("pageComponentList").and_then(|v| v.as_array()) {
            for item in items {
                let raw_title = item
                    .get("commonData")
                    .and_then(|d| d.get("titleDTO"))
                    .and_then(|t| t.get("displayName"))
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                if raw_title.is_empty() || is_junk_title(raw_title) {
                    continue;
                }
                let show_id = item
                    .get("commonData")
                    .and_then(|d| d.get("showId"))
                    .and_then(|v| v.as_str());
                let show_id = match show_id {
                    Some(id) => id.to_string(),
                    None => continue,
                };
                let (base_title, season) = extract_season(raw_title);
                out.push(ProviderSearchInfo {
                    provider: self.provider_name().to_string(),
                    media_id: show_id,
                    title: base_title,
                    media_kind: MediaKind::TvSeries,
                    year: None,
                    season,
                    poster_url: item
                        .get("commonData")
                        .and_then(|d| d.get("posterDTO"))
                        .and_then(|p| p.get("vThumbUrl"))
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string()),
                    episode_count: None,
                    current_episode_index: None,
                });
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
            .get("https://so.youku.com/valueadd/getvideos")
            .query(&[("showid", media_id)])
            .send()
            .await?
            .json()
            .await?;
        let mut out = Vec::new();
        if let Some(videos) = resp.get("videos").and_then(|v| v.as_array()) {
            for (idx, video) in videos.iter().enumerate() {
                let vid = video.get("encodeId").and_then(|v| v.as_str()).unwrap_or_default();
                if vid.is_empty() {
                    continue;
                }
                out.push(ProviderEpisodeInfo {
                    provider_episode_id: vid.to_string(),
                    index: idx as i32 + 1,
                    title: video.get("title").and_then(|v| v.as_str()).map(|s| s.to_string()),
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
        self.limiter.wait().await?;
        let video_info: Value = self
            .http
            .get("https://openapi.youku.com/v2/videos/show.json")
            .query(&[("video_id", provider_episode_id)])
            .send()
            .await?
            .json()
            .await?;
        let duration = video_info.get("duration").and_then(|v| v.as_f64()).unwrap_or(0.0) as i64;
        let total = segment_count(duration);

        let mut out = Vec::new();
        for mat in 1..=total {
            let items = self.fetch_segment(provider_episode_id, mat).await?;
            for item in items {
                let cid: i64 = item
                    .get("id")
                    .and_then(|v| v.as_i64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
                    .unwrap_or(0);
                let t = item.get("playat").and_then(|v| v.as_f64()).unwrap_or(0.0) / 1000.0;
                let text = item.get("content").and_then(|v| v.as_str()).unwrap_or_default().to_string();
                out.push(NormalizedComment {
                    cid,
                    t,
                    mode: 1,
                    color: 0xFFFFFF,
                    text,
                });
            }
            on_progress(mat as usize, total as usize);
        }
        Ok(out)
    }
}

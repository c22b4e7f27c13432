use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::modules::comment::MediaKind;
use crate::modules::provider::season::extract_season;
use crate::modules::provider::title_filter::is_junk_title;
use crate::modules::provider::traits::{
    NormalizedComment, ProviderAdapter, ProviderEpisodeInfo, ProviderSearchInfo, RateLimiterInfo,
};
use crate::shared::errors::AppResult;
use crate::shared::utils::rate_limiter::RateLimiter;

const PAGE_SIZE: i32 = 30;

pub struct TencentAdapter {
    http: Client,
    limiter: RateLimiter,
}

impl TencentAdapter {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            limiter: RateLimiter::new(2.0),
        }
    }

    /// §4.1.2 "traverse `moduleListDatas[].moduleDatas[].itemDataLists.
    /// itemDatas` until the first non-empty array is found".
    fn first_item_list(body: &Value) -> Vec<Value> {
        body.get("data")
            .and_then(|d| d.get("moduleListDatas"))
            .and_then(|v| v.as_array())
            .into_iter()
            .flatten()
            .filter_map(|module_list| module_list.get("moduleDatas"))
            .filter_map(|v| v.as_array())
            .flatten()
            .filter_map(|module| module.get("itemDataLists"))
            .filter_map(|v| v.get("itemDatas"))
            .filter_map(|v| v.as_array())
            .find(|items| !items.is_empty())
            .cloned()
            .unwrap_or_default()
    }

    /// §4.1.2 paginated episode listing. `cid` here is the Tencent
    /// collection id (the library `media_id`).
    async fn paginate_episodes(&self, cid: &str) -> AppResult<Vec<ProviderEpisodeInfo>> {
        let mut out = Vec::new();
        let mut page_context = String::new();
        let mut last_vid: Option<String> = None;

        loop {
            self.limiter.wait().await?;
            let body = json!({
                "pageParams": {
                    "cid": cid,
                    "video_appid": "3000010",
                    "vplatform": "2",
                    "page_size": PAGE_SIZE.to_string(),
                    "page_context": page_context,
                }
            });
            let resp: Value = self
                .http
                .post("https://pbaccess.video.qq.com/trpc.universal_backend_server.page_server_rpc.PageServer/GetPageData")
                .json(&body)
                .send()
                .await?
                .json()
                .await?;

            let items = Self::first_item_list(&resp);
            if items.is_empty() {
                break;
            }

            let mut page_last_vid = None;
            for item in &items {
                let vid = match item
                    .get("itemParams")
                    .and_then(|p| p.get("vid"))
                    .and_then(|v| v.as_str())
                {
                    Some(v) => v.to_string(),
                    None => continue,
                };
                let is_trailer = item
                    .get("itemParams")
                    .and_then(|p| p.get("isTrailer"))
                    .and_then(|v| v.as_str())
                    == Some("1");
                let title = item
                    .get("itemParams")
                    .and_then(|p| p.get("title"))
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                if is_trailer || is_junk_title(&title) {
                    page_last_vid = Some(vid);
                    continue;
                }
                out.push(ProviderEpisodeInfo {
                    provider_episode_id: vid.clone(),
                    index: out.len() as i32 + 1,
                    title: Some(title),
                    playback_url: None,
                });
                page_last_vid = Some(vid);
            }

            // Duplicate-page guard (§4.1.2).
            if page_last_vid.is_some() && page_last_vid == last_vid {
                break;
            }
            last_vid = page_last_vid;

            if items.len() < PAGE_SIZE as usize {
                break;
            }

            let begin = out.len() as i32;
            let end = begin + PAGE_SIZE;
            page_context = format!("episode_begin={}&episode_end={}&episode_step={}", begin, end, PAGE_SIZE);
        }

        Ok(out)
    }
}

#[async_trait]
impl ProviderAdapter for TencentAdapter {
    fn provider_name(&self) -> &'static str {
        "tencent"
    }

    fn get_rate_limit_info(&self) -> RateLimiterInfo {
        RateLimiterInfo::new(2.0)
    }

    async fn search(&self, keyword: &str, _episode_hint: Option<i32>) -> AppResult<Vec<ProviderSearchInfo>> {
        self.limiter.wait().await?;
        let resp: Value = self
            .http
            .get("https://pbaccess.video.qq.com/trpc.videosearch.smartbox_search.SmartboxSearchServer/MbSearch")
            .query(&[("query", keyword)])
            .send()
            .await?
            .json()
            .await?;

        let mut out = Vec::new();
        if let Some(items) = resp.get("data").and_then(|d| d.get("normalList")).and_then(|v| v.get("itemList")).and_then(|v| v.as_array()) {
            for item in items {
                let raw_title = item
                    .get("doc")
                    .and_then(|d| d.get("title"))
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                let cleaned = raw_title.replace("<em>", "").replace("</em>", "");
                if is_junk_title(&cleaned) {
                    continue;
                }
                let cid = match item.get("doc").and_then(|d| d.get("id")).and_then(|v| v.as_str()) {
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
                    poster_url: None,
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
        self.paginate_episodes(media_id).await
    }

    /// §4.1.2 "GET `/barrage/base/{vid}` -> `segment_index` map. For each
    /// segment in ascending key order, GET `/barrage/segment/{vid}/
    /// {segment_name}` and collect `barrage_list`."
    async fn get_comments(
        &self,
        provider_episode_id: &str,
        on_progress: &(dyn Fn(usize, usize) + Send + Sync),
    ) -> AppResult<Vec<NormalizedComment>> {
        self.limiter.wait().await?;
        let base: Value = self
            .http
            .get(format!(
                "https://dm.video.qq.com/barrage/base/{}",
                provider_episode_id
            ))
            .send()
            .await?
            .json()
            .await?;

        let mut segment_names: Vec<String> = base
            .get("segment_index")
            .and_then(|v| v.as_object())
            .map(|obj| {
                let mut keys: Vec<(i64, String)> = obj
                    .iter()
                    .filter_map(|(k, v)| {
                        let key: i64 = k.parse().ok()?;
                        let name = v.get("segment_name")?.as_str()?.to_string();
                        Some((key, name))
                    })
                    .collect();
                keys.sort_by_key(|(k, _)| *k);
                keys.into_iter().map(|(_, name)| name).collect()
            })
            .unwrap_or_default();
        segment_names.sort();

        let total = segment_names.len();
        let mut out = Vec::new();
        for (idx, segment_name) in segment_names.into_iter().enumerate() {
            self.limiter.wait().await?;
            let resp: Value = self
                .http
                .get(format!(
                    "https://dm.video.qq.com/barrage/segment/{}/{}",
                    provider_episode_id, segment_name
                ))
                .send()
                .await?
                .json()
                .await?;
            if let Some(list) = resp.get("barrage_list").and_then(|v| v.as_array()) {
                for entry in list {
                    let cid: i64 = entry
                        .get("id")
                        .and_then(|v| v.as_str())
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(0);
                    let t: f64 = entry
                        .get("time_offset")
                        .and_then(|v| v.as_str())
                        .and_then(|s| s.parse::<f64>().ok())
                        .map(|ms| ms / 1000.0)
                        .unwrap_or(0.0);
                    let text = entry
                        .get("content")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string();
                    out.push(NormalizedComment {
                        cid,
                        t,
                        mode: 1,
                        color: 0xFFFFFF,
                        text,
                    });
                }
            }
            on_progress(idx + 1, total);
        }
        Ok(out)
    }
}

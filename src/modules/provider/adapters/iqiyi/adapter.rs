use std::io::Read;

use async_trait::async_trait;
use flate2::read::ZlibDecoder;
use quick_xml::de::from_str;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;

use crate::modules::comment::MediaKind;
use crate::modules::provider::season::extract_season;
use crate::modules::provider::title_filter::is_junk_title;
use crate::modules::provider::traits::{
    NormalizedComment, ProviderAdapter, ProviderEpisodeInfo, ProviderSearchInfo, RateLimiterInfo,
};
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::rate_limiter::RateLimiter;

pub struct IqiyiAdapter {
    http: Client,
    limiter: RateLimiter,
}

#[derive(Debug, Deserialize)]
struct BulletDoc {
    #[serde(rename = "data")]
    data: Option<BulletData>,
}

#[derive(Debug, Deserialize)]
struct BulletData {
    #[serde(rename = "entry")]
    entry: Option<BulletEntry>,
}

#[derive(Debug, Deserialize)]
struct BulletEntry {
    #[serde(rename = "list", default)]
    list: Option<BulletList>,
}

#[derive(Debug, Deserialize)]
struct BulletList {
    #[serde(rename = "bulletInfo", default)]
    items: Vec<BulletItem>,
}

#[derive(Debug, Deserialize)]
struct BulletItem {
    #[serde(rename = "contentId", default)]
    content_id: String,
    #[serde(rename = "content", default)]
    content: String,
    #[serde(rename = "showTime", default)]
    show_time: f64,
    #[serde(rename = "color", default)]
    color: String,
}

fn video_info_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r#""videoInfo":(\{.*?\}),"#).unwrap())
}

fn album_info_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r#""albumInfo":(\{.*?\}),"#).unwrap())
}

impl IqiyiAdapter {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            limiter: RateLimiter::new(2.0),
        }
    }

    /// §4.1.3 "Base info obtained from mobile HTML; locate two JSON blobs
    /// via regex".
    async fn fetch_base_info(&self, link_id: &str) -> AppResult<(Value, Value)> {
        self.limiter.wait().await?;
        let html = self
            .http
            .get(format!("https://m.iqiyi.com/v_{}.html", link_id))
            .send()
            .await?
            .text()
            .await?;
        let video_info: Value = video_info_regex()
            .captures(&html)
            .and_then(|c| c.get(1))
            .ok_or_else(|| AppError::ParseError("missing videoInfo blob".into()))
            .and_then(|m| serde_json::from_str(m.as_str()).map_err(AppError::from))?;
        let album_info: Value = album_info_regex()
            .captures(&html)
            .and_then(|c| c.get(1))
            .ok_or_else(|| AppError::ParseError("missing albumInfo blob".into()))
            .and_then(|m| serde_json::from_str(m.as_str()).map_err(AppError::from))?;
        Ok((video_info, album_info))
    }

    /// §4.1.3 one `mat` segment: zlib-decompress, parse `entry/list/item`,
    /// stop on 404/empty/parse error by returning `Ok(None)`.
    async fn fetch_segment(&self, tvid: &str, mat: i32) -> AppResult<Option<Vec<BulletItem>>> {
        if tvid.len() < 4 {
            return Err(AppError::InvalidInput("tvid too short for segment path".into()));
        }
        let (a, b) = (&tvid[tvid.len() - 4..tvid.len() - 2], &tvid[tvid.len() - 2..]);
        self.limiter.wait().await?;
        let resp = self
            .http
            .get(format!(
                "http://cmts.iqiyi.com/bullet/{}/{}/{}_300_{}.z",
                a, b, tvid, mat
            ))
            .send()
            .await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let compressed = resp.bytes().await?.to_vec();
        if compressed.is_empty() {
            return Ok(None);
        }

        let xml = tokio::task::spawn_blocking(move || -> AppResult<String> {
            let mut decoder = ZlibDecoder::new(compressed.as_slice());
            let mut out = String::new();
            decoder.read_to_string(&mut out)?;
            Ok(out)
        })
        .await
        .map_err(|e| AppError::InternalError(format!("zlib decode task panicked: {}", e)))??;

        if xml.trim().is_empty() {
            return Ok(None);
        }

        match from_str::<BulletDoc>(&xml) {
            Ok(doc) => Ok(doc
                .data
                .and_then(|d| d.entry)
                .and_then(|e| e.list)
                .map(|l| l.items)),
            Err(_) => Ok(None),
        }
    }
}

#[async_trait]
impl ProviderAdapter for IqiyiAdapter {
    fn provider_name(&self) -> &'static str {
        "iqiyi"
    }

    fn get_rate_limit_info(&self) -> RateLimiterInfo {
        RateLimiterInfo::new(2.0)
    }

    /// §4.1.3 "filter to `site_id=="iqiyi" && video_doc_type==1`, exclude
    /// 原创/教育 channels".
    async fn search(&self, keyword: &str, _episode_hint: Option<i32>) -> AppResult<Vec<ProviderSearchInfo>> {
        self.limiter.wait().await?;
        let resp: Value = self
            .http
            .get("https://search.video.iqiyi.com/o")
            .query(&[("key", keyword), ("pageNum", "1"), ("pageSize", "20")])
            .send()
            .await?
            .json()
            .await?;

        let mut out = Vec::new();
        if let Some(docs) = resp.get("data").and_then(|d| d.get("docinfos")).and_then(|v| v.as_array()) {
            for doc in docs {
                let info = match doc.get("albumDocInfo") {
                    Some(i) => i,
                    None => continue,
                };
                if info.get("siteId").and_then(|v| v.as_str()) != Some("iqiyi") {
                    continue;
                }
                if info.get("videoDocType").and_then(|v| v.as_i64()) != Some(1) {
                    continue;
                }
                let channel = info.get("channel").and_then(|v| v.as_str()).unwrap_or_default();
                if channel.contains("原创") || channel.contains("教育") {
                    continue;
                }
                let raw_title = info.get("albumTitle").and_then(|v| v.as_str()).unwrap_or_default();
                if is_junk_title(raw_title) {
                    continue;
                }
                let page_url = info.get("pageUrl").and_then(|v| v.as_str()).unwrap_or_default();
                let link_id = page_url
                    .rsplit('/')
                    .next()
                    .and_then(|seg| seg.strip_prefix("v_"))
                    .and_then(|seg| seg.strip_suffix(".html"))
                    .unwrap_or_default();
                if link_id.is_empty() {
                    continue;
                }
                let (base_title, season) = extract_season(raw_title);
                out.push(ProviderSearchInfo {
                    provider: self.provider_name().to_string(),
                    media_id: link_id.to_string(),
                    title: base_title,
                    media_kind: MediaKind::TvSeries,
                    year: None,
                    season,
                    poster_url: info.get("albumImg").and_then(|v| v.as_str()).map(|s| s.to_string()),
                    episode_count: info.get("videoCount").and_then(|v| v.as_i64()).map(|v| v as i32),
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
        let (_video_info, album_info) = self.fetch_base_info(media_id).await?;
        let mut out = Vec::new();
        if let Some(videos) = album_info.get("videos").and_then(|v| v.get("feature_paged")) {
            if let Some(map) = videos.as_object() {
                let mut all: Vec<&Value> = map.values().filter_map(|v| v.as_array()).flatten().collect();
                all.sort_by_key(|v| v.get("order").and_then(|o| o.as_i64()).unwrap_or(0));
                for (idx, item) in all.iter().enumerate() {
                    let tvid = item.get("tvId").and_then(|v| v.as_i64()).unwrap_or(0);
                    out.push(ProviderEpisodeInfo {
                        provider_episode_id: tvid.to_string(),
                        index: idx as i32 + 1,
                        title: item.get("name").and_then(|v| v.as_str()).map(|s| s.to_string()),
                        playback_url: item.get("pageUrl").and_then(|v| v.as_str()).map(|s| s.to_string()),
                    });
                }
            }
        }
        Ok(out)
    }

    async fn get_comments(
        &self,
        provider_episode_id: &str,
        on_progress: &(dyn Fn(usize, usize) + Send + Sync),
    ) -> AppResult<Vec<NormalizedComment>> {
        let mut out = Vec::new();
        let mut mat = 1;
        loop {
            match self.fetch_segment(provider_episode_id, mat).await? {
                Some(items) if !items.is_empty() => {
                    for item in items {
                        out.push(NormalizedComment {
                            cid: item.content_id.parse().unwrap_or(0),
                            t: item.show_time,
                            mode: 1,
                            color: u32::from_str_radix(&item.color, 16).unwrap_or(0xFFFFFF),
                            text: item.content,
                        });
                    }
                    on_progress(mat as usize, mat as usize);
                    mat += 1;
                }
                _ => break,
            }
        }
        Ok(out)
    }
}

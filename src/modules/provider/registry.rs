use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::RwLock;

use crate::log_warn;
use crate::modules::comment::ScraperSetting;
use crate::modules::persistence::ScraperSettingRepository;
use crate::shared::errors::AppResult;

use super::traits::{ProviderAdapter, ProviderSearchInfo};

struct RegisteredAdapter {
    adapter: Arc<dyn ProviderAdapter>,
    setting: ScraperSetting,
}

/// §4.2 "Provider Registry": discovers adapters, syncs their enable/order
/// state with `scraper_settings`, and fans searches out across them.
/// `Reload` documents the same external-synchronization requirement the
/// source places on it: callers must not have an in-flight `SearchAll`
/// while reloading.
pub struct ProviderRegistry {
    settings: Arc<dyn ScraperSettingRepository>,
    adapters: RwLock<Vec<RegisteredAdapter>>,
}

impl ProviderRegistry {
    pub fn new(settings: Arc<dyn ScraperSettingRepository>) -> Self {
        Self {
            settings,
            adapters: RwLock::new(Vec::new()),
        }
    }

    /// §4.2 "Discover adapters, sync enable/order state": each adapter
    /// passed in gets a `scraper_settings` row auto-created the first time
    /// it's seen, defaulting to enabled with insertion order as display
    /// order; subsequent discoveries reuse the admin-set row untouched.
    pub async fn discover(&self, candidates: Vec<Arc<dyn ProviderAdapter>>) -> AppResult<()> {
        let mut registered = Vec::with_capacity(candidates.len());
        for (idx, adapter) in candidates.into_iter().enumerate() {
            let name = adapter.provider_name();
            let setting = match self.settings.get(name).await? {
                Some(existing) => existing,
                None => {
                    let fresh = ScraperSetting {
                        provider_name: name.to_string(),
                        is_enabled: true,
                        display_order: idx as i32,
                    };
                    self.settings.upsert(fresh.clone()).await?;
                    fresh
                }
            };
            registered.push(RegisteredAdapter { adapter, setting });
        }
        registered.sort_by_key(|r| r.setting.display_order);
        *self.adapters.write().await = registered;
        Ok(())
    }

    /// §4.2 "Reload": re-reads `scraper_settings` for the adapters already
    /// discovered and re-sorts; it does not re-instantiate adapter
    /// instances since construction (HTTP clients, cookie jars) is owned
    /// by the caller that built the candidate list passed to `discover`.
    pub async fn reload(&self) -> AppResult<()> {
        let mut guard = self.adapters.write().await;
        for registered in guard.iter_mut() {
            if let Some(fresh) = self.settings.get(registered.adapter.provider_name()).await? {
                registered.setting = fresh;
            }
        }
        guard.sort_by_key(|r| r.setting.display_order);
        Ok(())
    }

    async fn enabled_adapters(&self) -> Vec<Arc<dyn ProviderAdapter>> {
        self.adapters
            .read()
            .await
            .iter()
            .filter(|r| r.setting.is_enabled)
            .map(|r| Arc::clone(&r.adapter))
            .collect()
    }

    /// §4.2 "SearchAll": one task per (keyword × enabled adapter) pair,
    /// individual-failure isolation, dedupe by `(provider, media_id)`
    /// preserving first-seen order (§8 "unordered across adapters, dedupe
    /// preserves first-observed order").
    pub async fn search_all(&self, keywords: &[String], episode_hint: Option<i32>) -> Vec<ProviderSearchInfo> {
        let adapters = self.enabled_adapters().await;
        let mut tasks = Vec::with_capacity(keywords.len() * adapters.len());
        for keyword in keywords {
            for adapter in &adapters {
                let adapter = Arc::clone(adapter);
                let keyword = keyword.clone();
                tasks.push(async move {
                    match adapter.search(&keyword, episode_hint).await {
                        Ok(results) => results,
                        Err(e) => {
                            log_warn!(
                                "provider {} search failed for {:?}: {}",
                                adapter.provider_name(),
                                keyword,
                                e
                            );
                            Vec::new()
                        }
                    }
                });
            }
        }
        let batches = join_all(tasks).await;
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for result in batches.into_iter().flatten() {
            let key = (result.provider.clone(), result.media_id.clone());
            if seen.insert(key) {
                out.push(result);
            }
        }
        out
    }

    /// §4.2 "SearchSequential": ascending `display_order`, returns the
    /// first adapter whose result set is non-empty.
    pub async fn search_sequential(
        &self,
        keyword: &str,
        episode_hint: Option<i32>,
    ) -> AppResult<Vec<ProviderSearchInfo>> {
        for adapter in self.enabled_adapters().await {
            match adapter.search(keyword, episode_hint).await {
                Ok(results) if !results.is_empty() => return Ok(results),
                Ok(_) => continue,
                Err(e) => {
                    log_warn!(
                        "provider {} sequential search failed: {}",
                        adapter.provider_name(),
                        e
                    );
                    continue;
                }
            }
        }
        Ok(Vec::new())
    }

    pub async fn find_adapter(&self, provider: &str) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters
            .read()
            .await
            .iter()
            .find(|r| r.adapter.provider_name() == provider)
            .map(|r| Arc::clone(&r.adapter))
    }

    /// Display order is used by the match dispatcher as a ranking tiebreak
    /// (§4.6).
    pub async fn display_order(&self, provider: &str) -> i32 {
        self.adapters
            .read()
            .await
            .iter()
            .find(|r| r.adapter.provider_name() == provider)
            .map(|r| r.setting.display_order)
            .unwrap_or(i32::MAX)
    }
}

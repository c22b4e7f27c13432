use std::sync::Arc;
use std::time::Duration;

use crate::modules::persistence::ConfigKvRepository;
use crate::shared::errors::AppResult;

const KEY_TMDB_API_KEY: &str = "tmdb_api_key";
const KEY_DOUBAN_COOKIE: &str = "douban_cookie";
const KEY_GAMER_COOKIE: &str = "gamer_cookie";
const KEY_SEARCH_CACHE_TTL_SECS: &str = "search_cache_ttl_secs";
const KEY_EPISODE_CACHE_TTL_SECS: &str = "episode_cache_ttl_secs";

const DEFAULT_SEARCH_CACHE_TTL: Duration = Duration::from_secs(3600);
const DEFAULT_EPISODE_CACHE_TTL: Duration = Duration::from_secs(21600);

/// §10.3 "a `ConfigKv` persistence trait ... for runtime-tunable values
/// (TMDB key, cookies, per-provider min-interval overrides, cache TTLs)."
/// Everything here is read-through the `config_kv` table with a typed
/// default for rows that have never been set; it does not touch YAML/env,
/// which is out of scope.
pub struct RuntimeConfig {
    kv: Arc<dyn ConfigKvRepository>,
}

impl RuntimeConfig {
    pub fn new(kv: Arc<dyn ConfigKvRepository>) -> Self {
        Self { kv }
    }

    pub async fn tmdb_api_key(&self) -> AppResult<Option<String>> {
        self.kv.get(KEY_TMDB_API_KEY).await
    }

    pub async fn set_tmdb_api_key(&self, value: &str) -> AppResult<()> {
        self.kv.set(KEY_TMDB_API_KEY, value).await
    }

    pub async fn douban_cookie(&self) -> AppResult<Option<String>> {
        self.kv.get(KEY_DOUBAN_COOKIE).await
    }

    pub async fn gamer_cookie(&self) -> AppResult<Option<String>> {
        self.kv.get(KEY_GAMER_COOKIE).await
    }

    pub async fn min_interval_override(&self, provider: &str) -> AppResult<Option<Duration>> {
        let key = format!("{}_min_interval_ms", provider);
        Ok(self.kv.get(&key).await?.and_then(|v| v.parse::<u64>().ok()).map(Duration::from_millis))
    }

    pub async fn search_cache_ttl(&self) -> AppResult<Duration> {
        Ok(self
            .kv
            .get(KEY_SEARCH_CACHE_TTL_SECS)
            .await?
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SEARCH_CACHE_TTL))
    }

    pub async fn episode_cache_ttl(&self) -> AppResult<Duration> {
        Ok(self
            .kv
            .get(KEY_EPISODE_CACHE_TTL_SECS)
            .await?
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_EPISODE_CACHE_TTL))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeKv {
        values: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl ConfigKvRepository for FakeKv {
        async fn get(&self, key: &str) -> AppResult<Option<String>> {
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &str) -> AppResult<()> {
            self.values.lock().unwrap().insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn missing_ttl_falls_back_to_default() {
        let config = RuntimeConfig::new(Arc::new(FakeKv { values: Mutex::new(HashMap::new()) }));
        assert_eq!(config.search_cache_ttl().await.unwrap(), DEFAULT_SEARCH_CACHE_TTL);
    }

    #[tokio::test]
    async fn stored_ttl_overrides_default() {
        let kv = FakeKv { values: Mutex::new(HashMap::new()) };
        kv.set(KEY_SEARCH_CACHE_TTL_SECS, "120").await.unwrap();
        let config = RuntimeConfig::new(Arc::new(kv));
        assert_eq!(config.search_cache_ttl().await.unwrap(), Duration::from_secs(120));
    }
}

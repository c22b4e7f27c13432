use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};

use crate::log_debug;
use crate::modules::comment::CacheEntry;
use crate::modules::persistence::CacheRepository;
use crate::shared::errors::AppResult;

/// §4 "Cache layer": TTL-bound key→JSON store, generalizing the teacher's
/// in-memory `ProviderCache` (DashMap + background sweep) onto the
/// `cache_entry` table so entries survive restarts and are shared across
/// worker processes. Used by the provider registry and the import engine
/// to back search and episode-list lookups.
pub struct CacheStore {
    repo: Arc<dyn CacheRepository>,
}

impl CacheStore {
    pub fn new(repo: Arc<dyn CacheRepository>) -> Self {
        Self { repo }
    }

    pub async fn get<T: DeserializeOwned>(&self, provider: &str, key: &str) -> AppResult<Option<T>> {
        match self.repo.get(provider, key).await? {
            Some(entry) if entry.expires_at > Utc::now() => Ok(serde_json::from_value(entry.value_json).ok()),
            Some(_) => Ok(None),
            None => Ok(None),
        }
    }

    pub async fn set<T: Serialize>(&self, provider: &str, key: &str, value: &T, ttl: Duration) -> AppResult<()> {
        let entry = CacheEntry {
            provider: provider.to_string(),
            key: key.to_string(),
            value_json: serde_json::to_value(value)?,
            expires_at: Utc::now() + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::hours(1)),
        };
        self.repo.set(entry).await
    }

    /// §10 "hourly TTL sweep": spawns a background loop deleting rows past
    /// their `expires_at`. Returned handle is dropped by callers that don't
    /// need to cancel it explicitly; the process shutting down is enough.
    pub fn spawn_hourly_sweep(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(3600));
            loop {
                interval.tick().await;
                match self.repo.sweep_expired(Utc::now()).await {
                    Ok(removed) if removed > 0 => log_debug!("cache sweep removed {} expired entries", removed),
                    Ok(_) => {}
                    Err(e) => crate::log_error!("cache sweep failed: {}", e),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeCacheRepository {
        entries: Mutex<Vec<CacheEntry>>,
    }

    #[async_trait]
    impl CacheRepository for FakeCacheRepository {
        async fn get(&self, provider: &str, key: &str) -> AppResult<Option<CacheEntry>> {
            Ok(self
                .entries
                .lock()
                .unwrap()
                .iter()
                .find(|e| e.provider == provider && e.key == key)
                .cloned())
        }

        async fn set(&self, entry: CacheEntry) -> AppResult<()> {
            self.entries.lock().unwrap().push(entry);
            Ok(())
        }

        async fn sweep_expired(&self, now: chrono::DateTime<Utc>) -> AppResult<i64> {
            let mut entries = self.entries.lock().unwrap();
            let before = entries.len();
            entries.retain(|e| e.expires_at > now);
            Ok((before - entries.len()) as i64)
        }
    }

    #[tokio::test]
    async fn round_trips_json_value() {
        let store = CacheStore::new(Arc::new(FakeCacheRepository {
            entries: Mutex::new(Vec::new()),
        }));
        store.set("bilibili", "search:naruto", &vec!["a", "b"], Duration::from_secs(60)).await.unwrap();
        let got: Option<Vec<String>> = store.get("bilibili", "search:naruto").await.unwrap();
        assert_eq!(got, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[tokio::test]
    async fn expired_entry_reads_as_absent() {
        let repo = FakeCacheRepository {
            entries: Mutex::new(vec![CacheEntry {
                provider: "bilibili".into(),
                key: "k".into(),
                value_json: serde_json::json!(1),
                expires_at: Utc::now() - chrono::Duration::seconds(1),
            }]),
        };
        let store = CacheStore::new(Arc::new(repo));
        let got: Option<i32> = store.get("bilibili", "k").await.unwrap();
        assert_eq!(got, None);
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::modules::comment::CacheEntry;
use crate::modules::persistence::CacheRepository;
use crate::schema::cache_entries;
use crate::shared::database::Database;
use crate::shared::errors::AppResult;

use super::models::CacheEntryRow;

pub struct CacheRepositoryImpl {
    db: Arc<Database>,
}

impl CacheRepositoryImpl {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn row_to_entity(row: CacheEntryRow) -> CacheEntry {
        CacheEntry {
            provider: row.provider,
            key: row.key,
            value_json: row.value_json,
            expires_at: row.expires_at,
        }
    }

    fn entity_to_row(entry: &CacheEntry) -> CacheEntryRow {
        CacheEntryRow {
            provider: entry.provider.clone(),
            key: entry.key.clone(),
            value_json: entry.value_json.clone(),
            expires_at: entry.expires_at,
        }
    }
}

#[async_trait]
impl CacheRepository for CacheRepositoryImpl {
    async fn get(&self, provider: &str, key: &str) -> AppResult<Option<CacheEntry>> {
        let provider = provider.to_string();
        let key = key.to_string();
        self.db
            .run_blocking(move |conn| {
                let row = cache_entries::table
                    .find((provider, key))
                    .first::<CacheEntryRow>(conn)
                    .optional()?;
                Ok(row.map(Self::row_to_entity))
            })
            .await
    }

    async fn set(&self, entry: CacheEntry) -> AppResult<()> {
        let row = Self::entity_to_row(&entry);
        self.db
            .run_blocking(move |conn| {
                diesel::insert_into(cache_entries::table)
                    .values(&row)
                    .on_conflict((cache_entries::provider, cache_entries::key))
                    .do_update()
                    .set(&row)
                    .execute(conn)?;
                Ok(())
            })
            .await
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> AppResult<i64> {
        self.db
            .run_blocking(move |conn| {
                let deleted =
                    diesel::delete(cache_entries::table.filter(cache_entries::expires_at.le(now)))
                        .execute(conn)?;
                Ok(deleted as i64)
            })
            .await
    }
}

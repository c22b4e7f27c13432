use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;

use crate::modules::persistence::ConfigKvRepository;
use crate::schema::config_kv;
use crate::shared::database::Database;
use crate::shared::errors::AppResult;

use super::models::ConfigKvRow;

pub struct ConfigKvRepositoryImpl {
    db: Arc<Database>,
}

impl ConfigKvRepositoryImpl {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ConfigKvRepository for ConfigKvRepositoryImpl {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let key = key.to_string();
        self.db
            .run_blocking(move |conn| {
                let row = config_kv::table.find(key).first::<ConfigKvRow>(conn).optional()?;
                Ok(row.map(|r| r.value))
            })
            .await
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let row = ConfigKvRow {
            key: key.to_string(),
            value: value.to_string(),
        };
        self.db
            .run_blocking(move |conn| {
                diesel::insert_into(config_kv::table)
                    .values(&row)
                    .on_conflict(config_kv::key)
                    .do_update()
                    .set(&row)
                    .execute(conn)?;
                Ok(())
            })
            .await
    }
}

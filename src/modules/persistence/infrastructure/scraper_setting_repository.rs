use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;

use crate::modules::comment::ScraperSetting;
use crate::modules::persistence::ScraperSettingRepository;
use crate::schema::scraper_settings;
use crate::shared::database::Database;
use crate::shared::errors::AppResult;

use super::models::ScraperSettingRow;

pub struct ScraperSettingRepositoryImpl {
    db: Arc<Database>,
}

impl ScraperSettingRepositoryImpl {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn row_to_entity(row: ScraperSettingRow) -> ScraperSetting {
        ScraperSetting {
            provider_name: row.provider_name,
            is_enabled: row.is_enabled,
            display_order: row.display_order,
        }
    }

    fn entity_to_row(setting: &ScraperSetting) -> ScraperSettingRow {
        ScraperSettingRow {
            provider_name: setting.provider_name.clone(),
            is_enabled: setting.is_enabled,
            display_order: setting.display_order,
        }
    }
}

#[async_trait]
impl ScraperSettingRepository for ScraperSettingRepositoryImpl {
    async fn list_ordered(&self) -> AppResult<Vec<ScraperSetting>> {
        self.db
            .run_blocking(move |conn| {
                let rows = scraper_settings::table
                    .order(scraper_settings::display_order.asc())
                    .load::<ScraperSettingRow>(conn)?;
                Ok(rows.into_iter().map(Self::row_to_entity).collect())
            })
            .await
    }

    async fn get(&self, provider_name: &str) -> AppResult<Option<ScraperSetting>> {
        let provider_name = provider_name.to_string();
        self.db
            .run_blocking(move |conn| {
                let row = scraper_settings::table
                    .find(provider_name)
                    .first::<ScraperSettingRow>(conn)
                    .optional()?;
                Ok(row.map(Self::row_to_entity))
            })
            .await
    }

    async fn upsert(&self, setting: ScraperSetting) -> AppResult<()> {
        let row = Self::entity_to_row(&setting);
        self.db
            .run_blocking(move |conn| {
                diesel::insert_into(scraper_settings::table)
                    .values(&row)
                    .on_conflict(scraper_settings::provider_name)
                    .do_update()
                    .set(&row)
                    .execute(conn)?;
                Ok(())
            })
            .await
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use uuid::Uuid;

use crate::modules::comment::Source;
use crate::modules::persistence::SourceRepository;
use crate::schema::sources;
use crate::shared::database::Database;
use crate::shared::errors::AppResult;

use super::models::SourceRow;

pub struct SourceRepositoryImpl {
    db: Arc<Database>,
}

impl SourceRepositoryImpl {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn row_to_entity(row: SourceRow) -> Source {
        Source {
            id: row.id,
            work_id: row.work_id,
            provider: row.provider,
            provider_media_id: row.provider_media_id,
            favorited: row.favorited,
            created_at: row.created_at,
        }
    }

    fn entity_to_row(source: &Source) -> SourceRow {
        SourceRow {
            id: source.id,
            work_id: source.work_id,
            provider: source.provider.clone(),
            provider_media_id: source.provider_media_id.clone(),
            favorited: source.favorited,
            created_at: source.created_at,
        }
    }
}

#[async_trait]
impl SourceRepository for SourceRepositoryImpl {
    async fn find_by_provider_media(
        &self,
        provider: &str,
        provider_media_id: &str,
    ) -> AppResult<Option<Source>> {
        let provider = provider.to_string();
        let provider_media_id = provider_media_id.to_string();
        self.db
            .run_blocking(move |conn| {
                let row = sources::table
                    .filter(sources::provider.eq(&provider))
                    .filter(sources::provider_media_id.eq(&provider_media_id))
                    .first::<SourceRow>(conn)
                    .optional()?;
                Ok(row.map(Self::row_to_entity))
            })
            .await
    }

    async fn list_for_work(&self, work_id: Uuid) -> AppResult<Vec<Source>> {
        self.db
            .run_blocking(move |conn| {
                let rows = sources::table
                    .filter(sources::work_id.eq(work_id))
                    .load::<SourceRow>(conn)?;
                Ok(rows.into_iter().map(Self::row_to_entity).collect())
            })
            .await
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Source>> {
        self.db
            .run_blocking(move |conn| {
                let row = sources::table.find(id).first::<SourceRow>(conn).optional()?;
                Ok(row.map(Self::row_to_entity))
            })
            .await
    }

    /// Insert-ignore on `(provider, provider_media_id)` (§3): the unique
    /// constraint is expected on that pair, so a conflicting insert is a
    /// no-op and the caller gets back the row that already exists.
    async fn insert_ignore(&self, source: Source) -> AppResult<Source> {
        let row = Self::entity_to_row(&source);
        let provider = source.provider.clone();
        let provider_media_id = source.provider_media_id.clone();
        self.db
            .run_blocking(move |conn| {
                diesel::insert_into(sources::table)
                    .values(&row)
                    .on_conflict((sources::provider, sources::provider_media_id))
                    .do_nothing()
                    .execute(conn)?;
                let existing = sources::table
                    .filter(sources::provider.eq(&provider))
                    .filter(sources::provider_media_id.eq(&provider_media_id))
                    .first::<SourceRow>(conn)?;
                Ok(Self::row_to_entity(existing))
            })
            .await
    }

    async fn set_favorited(&self, work_id: Uuid, source_id: Uuid) -> AppResult<()> {
        self.db
            .run_blocking(move |conn| {
                conn.transaction(|conn| {
                    diesel::update(sources::table.filter(sources::work_id.eq(work_id)))
                        .set(sources::favorited.eq(false))
                        .execute(conn)?;
                    diesel::update(sources::table.find(source_id))
                        .set(sources::favorited.eq(true))
                        .execute(conn)?;
                    diesel::QueryResult::Ok(())
                })?;
                Ok(())
            })
            .await
    }
}

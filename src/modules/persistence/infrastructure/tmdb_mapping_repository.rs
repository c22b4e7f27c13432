use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;

use crate::modules::comment::TmdbEpisodeMapping;
use crate::modules::persistence::TmdbMappingRepository;
use crate::schema::tmdb_episode_mappings;
use crate::shared::database::Database;
use crate::shared::errors::AppResult;

use super::models::TmdbEpisodeMappingRow;

pub struct TmdbMappingRepositoryImpl {
    db: Arc<Database>,
}

impl TmdbMappingRepositoryImpl {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn row_to_entity(row: TmdbEpisodeMappingRow) -> TmdbEpisodeMapping {
        TmdbEpisodeMapping {
            id: row.id,
            tmdb_tv_id: row.tmdb_tv_id,
            group_id: row.group_id,
            tmdb_episode_id: row.tmdb_episode_id,
            native_season_number: row.native_season_number,
            native_episode_number: row.native_episode_number,
            custom_season_number: row.custom_season_number,
            custom_episode_number: row.custom_episode_number,
            absolute_episode_number: row.absolute_episode_number,
        }
    }

    fn entity_to_row(mapping: &TmdbEpisodeMapping) -> TmdbEpisodeMappingRow {
        TmdbEpisodeMappingRow {
            id: mapping.id,
            tmdb_tv_id: mapping.tmdb_tv_id,
            group_id: mapping.group_id.clone(),
            tmdb_episode_id: mapping.tmdb_episode_id,
            native_season_number: mapping.native_season_number,
            native_episode_number: mapping.native_episode_number,
            custom_season_number: mapping.custom_season_number,
            custom_episode_number: mapping.custom_episode_number,
            absolute_episode_number: mapping.absolute_episode_number,
        }
    }
}

#[async_trait]
impl TmdbMappingRepository for TmdbMappingRepositoryImpl {
    async fn list_for_group(&self, group_id: &str) -> AppResult<Vec<TmdbEpisodeMapping>> {
        let group_id = group_id.to_string();
        self.db
            .run_blocking(move |conn| {
                let rows = tmdb_episode_mappings::table
                    .filter(tmdb_episode_mappings::group_id.eq(&group_id))
                    .load::<TmdbEpisodeMappingRow>(conn)?;
                Ok(rows.into_iter().map(Self::row_to_entity).collect())
            })
            .await
    }

    /// Full replace per `group_id` (§4.5.1): the TMDB job recomputes the
    /// whole mapping table for a group each run rather than diffing it.
    async fn replace_for_group(&self, group_id: &str, mappings: Vec<TmdbEpisodeMapping>) -> AppResult<()> {
        let group_id = group_id.to_string();
        let rows: Vec<TmdbEpisodeMappingRow> = mappings.iter().map(Self::entity_to_row).collect();
        self.db
            .run_blocking(move |conn| {
                conn.transaction(|conn| {
                    diesel::delete(
                        tmdb_episode_mappings::table.filter(tmdb_episode_mappings::group_id.eq(&group_id)),
                    )
                    .execute(conn)?;
                    if !rows.is_empty() {
                        diesel::insert_into(tmdb_episode_mappings::table)
                            .values(&rows)
                            .execute(conn)?;
                    }
                    diesel::QueryResult::Ok(())
                })?;
                Ok(())
            })
            .await
    }
}

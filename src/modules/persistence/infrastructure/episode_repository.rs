use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::modules::comment::{Episode, Source};
use crate::modules::persistence::EpisodeRepository;
use crate::schema::{comments, episodes, sources};
use crate::shared::database::Database;
use crate::shared::errors::AppResult;

use super::models::{EpisodeRow, SourceRow};

pub struct EpisodeRepositoryImpl {
    db: Arc<Database>,
}

impl EpisodeRepositoryImpl {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn source_row_to_entity(row: SourceRow) -> Source {
        Source {
            id: row.id,
            work_id: row.work_id,
            provider: row.provider,
            provider_media_id: row.provider_media_id,
            favorited: row.favorited,
            created_at: row.created_at,
        }
    }

    fn row_to_entity(row: EpisodeRow) -> Episode {
        Episode {
            id: row.id,
            source_id: row.source_id,
            episode_index: row.episode_index,
            title: row.title,
            playback_url: row.playback_url,
            provider_episode_id: row.provider_episode_id,
            fetched_at: row.fetched_at,
            comment_count: row.comment_count,
        }
    }

    fn entity_to_row(episode: &Episode) -> EpisodeRow {
        EpisodeRow {
            id: episode.id,
            source_id: episode.source_id,
            episode_index: episode.episode_index,
            title: episode.title.clone(),
            playback_url: episode.playback_url.clone(),
            provider_episode_id: episode.provider_episode_id.clone(),
            fetched_at: episode.fetched_at,
            comment_count: episode.comment_count,
        }
    }
}

#[async_trait]
impl EpisodeRepository for EpisodeRepositoryImpl {
    async fn find_by_source_index(&self, source_id: Uuid, index: i32) -> AppResult<Option<Episode>> {
        self.db
            .run_blocking(move |conn| {
                let row = episodes::table
                    .filter(episodes::source_id.eq(source_id))
                    .filter(episodes::episode_index.eq(index))
                    .first::<EpisodeRow>(conn)
                    .optional()?;
                Ok(row.map(Self::row_to_entity))
            })
            .await
    }

    /// Joins `episodes` to its owning `sources` row to resolve by
    /// `(provider, provider_episode_id)` (§4.3 single-episode refresh).
    async fn find_by_provider_episode(
        &self,
        provider: &str,
        provider_episode_id: &str,
    ) -> AppResult<Option<(Source, Episode)>> {
        let provider = provider.to_string();
        let provider_episode_id = provider_episode_id.to_string();
        self.db
            .run_blocking(move |conn| {
                let row = episodes::table
                    .inner_join(sources::table)
                    .filter(sources::provider.eq(&provider))
                    .filter(episodes::provider_episode_id.eq(&provider_episode_id))
                    .select((SourceRow::as_select(), EpisodeRow::as_select()))
                    .first::<(SourceRow, EpisodeRow)>(conn)
                    .optional()?;
                Ok(row.map(|(s, e)| (Self::source_row_to_entity(s), Self::row_to_entity(e))))
            })
            .await
    }

    async fn list_for_source(&self, source_id: Uuid) -> AppResult<Vec<Episode>> {
        self.db
            .run_blocking(move |conn| {
                let rows = episodes::table
                    .filter(episodes::source_id.eq(source_id))
                    .order(episodes::episode_index.asc())
                    .load::<EpisodeRow>(conn)?;
                Ok(rows.into_iter().map(Self::row_to_entity).collect())
            })
            .await
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Episode>> {
        self.db
            .run_blocking(move |conn| {
                let row = episodes::table.find(id).first::<EpisodeRow>(conn).optional()?;
                Ok(row.map(Self::row_to_entity))
            })
            .await
    }

    /// Insert-ignore on `(source_id, episode_index)` (§3).
    async fn create_if_absent(&self, episode: Episode) -> AppResult<Episode> {
        let row = Self::entity_to_row(&episode);
        let source_id = episode.source_id;
        let episode_index = episode.episode_index;
        self.db
            .run_blocking(move |conn| {
                diesel::insert_into(episodes::table)
                    .values(&row)
                    .on_conflict((episodes::source_id, episodes::episode_index))
                    .do_nothing()
                    .execute(conn)?;
                let existing = episodes::table
                    .filter(episodes::source_id.eq(source_id))
                    .filter(episodes::episode_index.eq(episode_index))
                    .first::<EpisodeRow>(conn)?;
                Ok(Self::row_to_entity(existing))
            })
            .await
    }

    async fn update_fetched(
        &self,
        episode_id: Uuid,
        fetched_at: DateTime<Utc>,
        comment_count: i32,
    ) -> AppResult<()> {
        self.db
            .run_blocking(move |conn| {
                diesel::update(episodes::table.find(episode_id))
                    .set((
                        episodes::fetched_at.eq(fetched_at),
                        episodes::comment_count.eq(comment_count),
                    ))
                    .execute(conn)?;
                Ok(())
            })
            .await
    }

    /// Deletes comments first, then episodes, inside one transaction —
    /// used by full refresh (§4.4.2) ahead of re-import.
    async fn clear_for_source(&self, source_id: Uuid) -> AppResult<()> {
        self.db
            .run_blocking(move |conn| {
                conn.transaction(|conn| {
                    let episode_ids: Vec<Uuid> = episodes::table
                        .filter(episodes::source_id.eq(source_id))
                        .select(episodes::id)
                        .load(conn)?;
                    diesel::delete(comments::table.filter(comments::episode_id.eq_any(&episode_ids)))
                        .execute(conn)?;
                    diesel::delete(episodes::table.filter(episodes::source_id.eq(source_id)))
                        .execute(conn)?;
                    diesel::QueryResult::Ok(())
                })?;
                Ok(())
            })
            .await
    }
}

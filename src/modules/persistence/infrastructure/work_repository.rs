use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use uuid::Uuid;

use crate::modules::comment::{MediaKind, Work, WorkAliases, WorkMetadata};
use crate::modules::persistence::WorkRepository;
use crate::schema::{work_aliases, work_metadata, works};
use crate::shared::database::Database;
use crate::shared::errors::AppResult;

use super::models::{WorkAliasesRow, WorkMetadataRow, WorkRow};

pub struct WorkRepositoryImpl {
    db: Arc<Database>,
}

impl WorkRepositoryImpl {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn row_to_entity(row: WorkRow) -> Work {
        Work {
            id: row.id,
            title: row.title,
            media_kind: MediaKind::from_str(&row.media_kind).unwrap_or(MediaKind::Other),
            season: row.season,
            poster_url: row.poster_url,
            created_at: row.created_at,
        }
    }

    fn entity_to_row(work: &Work) -> WorkRow {
        WorkRow {
            id: work.id,
            title: work.title.clone(),
            media_kind: work.media_kind.as_str().to_string(),
            season: work.season,
            poster_url: work.poster_url.clone(),
            created_at: work.created_at,
        }
    }
}

#[async_trait]
impl WorkRepository for WorkRepositoryImpl {
    async fn find_by_title_season(&self, title: &str, season: i32) -> AppResult<Option<Work>> {
        let title = title.to_string();
        self.db
            .run_blocking(move |conn| {
                let row = works::table
                    .filter(works::title.eq(&title))
                    .filter(works::season.eq(season))
                    .first::<WorkRow>(conn)
                    .optional()?;
                Ok(row.map(Self::row_to_entity))
            })
            .await
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Work>> {
        self.db
            .run_blocking(move |conn| {
                let row = works::table.find(id).first::<WorkRow>(conn).optional()?;
                Ok(row.map(Self::row_to_entity))
            })
            .await
    }

    async fn create(&self, work: Work) -> AppResult<Work> {
        let row = Self::entity_to_row(&work);
        self.db
            .run_blocking(move |conn| {
                diesel::insert_into(works::table).values(&row).execute(conn)?;
                Ok(Self::row_to_entity(row))
            })
            .await
    }

    async fn set_poster_if_absent(&self, work_id: Uuid, poster_url: &str) -> AppResult<()> {
        let poster_url = poster_url.to_string();
        self.db
            .run_blocking(move |conn| {
                diesel::update(works::table.find(work_id).filter(works::poster_url.is_null()))
                    .set(works::poster_url.eq(poster_url))
                    .execute(conn)?;
                Ok(())
            })
            .await
    }

    async fn get_metadata(&self, work_id: Uuid) -> AppResult<WorkMetadata> {
        self.db
            .run_blocking(move |conn| {
                let row = work_metadata::table
                    .find(work_id)
                    .first::<WorkMetadataRow>(conn)
                    .optional()?;
                Ok(match row {
                    Some(r) => WorkMetadata {
                        work_id: r.work_id,
                        tmdb_id: r.tmdb_id,
                        tmdb_episode_group_id: r.tmdb_episode_group_id,
                        bangumi_id: r.bangumi_id,
                        tvdb_id: r.tvdb_id,
                        douban_id: r.douban_id,
                        imdb_id: r.imdb_id,
                    },
                    None => WorkMetadata::empty(work_id),
                })
            })
            .await
    }

    async fn upsert_metadata(&self, metadata: &WorkMetadata) -> AppResult<()> {
        let row = WorkMetadataRow {
            work_id: metadata.work_id,
            tmdb_id: metadata.tmdb_id,
            tmdb_episode_group_id: metadata.tmdb_episode_group_id.clone(),
            bangumi_id: metadata.bangumi_id,
            tvdb_id: metadata.tvdb_id,
            douban_id: metadata.douban_id.clone(),
            imdb_id: metadata.imdb_id.clone(),
        };
        self.db
            .run_blocking(move |conn| {
                diesel::insert_into(work_metadata::table)
                    .values(&row)
                    .on_conflict(work_metadata::work_id)
                    .do_update()
                    .set(&row)
                    .execute(conn)?;
                Ok(())
            })
            .await
    }

    async fn get_aliases(&self, work_id: Uuid) -> AppResult<WorkAliases> {
        self.db
            .run_blocking(move |conn| {
                let row = work_aliases::table
                    .find(work_id)
                    .first::<WorkAliasesRow>(conn)
                    .optional()?;
                Ok(match row {
                    Some(r) => WorkAliases {
                        work_id: r.work_id,
                        alias_en: r.alias_en,
                        alias_jp: r.alias_jp,
                        alias_romaji: r.alias_romaji,
                        alias_cn_1: r.alias_cn_1,
                        alias_cn_2: r.alias_cn_2,
                        alias_cn_3: r.alias_cn_3,
                    },
                    None => WorkAliases::empty(work_id),
                })
            })
            .await
    }

    async fn upsert_aliases(&self, aliases: &WorkAliases) -> AppResult<()> {
        let row = WorkAliasesRow {
            work_id: aliases.work_id,
            alias_en: aliases.alias_en.clone(),
            alias_jp: aliases.alias_jp.clone(),
            alias_romaji: aliases.alias_romaji.clone(),
            alias_cn_1: aliases.alias_cn_1.clone(),
            alias_cn_2: aliases.alias_cn_2.clone(),
            alias_cn_3: aliases.alias_cn_3.clone(),
        };
        self.db
            .run_blocking(move |conn| {
                diesel::insert_into(work_aliases::table)
                    .values(&row)
                    .on_conflict(work_aliases::work_id)
                    .do_update()
                    .set(&row)
                    .execute(conn)?;
                Ok(())
            })
            .await
    }

    async fn list_pending_tmdb_mapping(&self) -> AppResult<Vec<(Work, WorkMetadata)>> {
        self.db
            .run_blocking(move |conn| {
                let rows = works::table
                    .inner_join(work_metadata::table)
                    .filter(work_metadata::tmdb_id.is_not_null())
                    .filter(work_metadata::tmdb_episode_group_id.is_null())
                    .select((WorkRow::as_select(), WorkMetadataRow::as_select()))
                    .load::<(WorkRow, WorkMetadataRow)>(conn)?;
                Ok(rows
                    .into_iter()
                    .map(|(w, m)| {
                        (
                            Self::row_to_entity(w),
                            WorkMetadata {
                                work_id: m.work_id,
                                tmdb_id: m.tmdb_id,
                                tmdb_episode_group_id: m.tmdb_episode_group_id,
                                bangumi_id: m.bangumi_id,
                                tvdb_id: m.tvdb_id,
                                douban_id: m.douban_id,
                                imdb_id: m.imdb_id,
                            },
                        )
                    })
                    .collect())
            })
            .await
    }

    async fn find_by_bangumi_id(&self, bangumi_id: i32) -> AppResult<Option<(Work, WorkMetadata)>> {
        self.db
            .run_blocking(move |conn| {
                let row = works::table
                    .inner_join(work_metadata::table)
                    .filter(work_metadata::bangumi_id.eq(bangumi_id))
                    .select((WorkRow::as_select(), WorkMetadataRow::as_select()))
                    .first::<(WorkRow, WorkMetadataRow)>(conn)
                    .optional()?;
                Ok(row.map(|(w, m)| {
                    (
                        Self::row_to_entity(w),
                        WorkMetadata {
                            work_id: m.work_id,
                            tmdb_id: m.tmdb_id,
                            tmdb_episode_group_id: m.tmdb_episode_group_id,
                            bangumi_id: m.bangumi_id,
                            tvdb_id: m.tvdb_id,
                            douban_id: m.douban_id,
                            imdb_id: m.imdb_id,
                        },
                    )
                }))
            })
            .await
    }
}

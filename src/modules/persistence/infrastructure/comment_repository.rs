use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use uuid::Uuid;

use crate::modules::comment::Comment;
use crate::modules::persistence::CommentRepository;
use crate::schema::comments;
use crate::shared::database::Database;
use crate::shared::errors::AppResult;

use super::models::CommentRow;

pub struct CommentRepositoryImpl {
    db: Arc<Database>,
}

impl CommentRepositoryImpl {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn row_to_entity(row: CommentRow) -> Comment {
        Comment {
            id: row.id,
            episode_id: row.episode_id,
            cid: row.cid,
            p: row.p,
            m: row.m,
            t: row.t,
        }
    }

    fn entity_to_row(comment: &Comment) -> CommentRow {
        CommentRow {
            id: comment.id,
            episode_id: comment.episode_id,
            cid: comment.cid,
            p: comment.p.clone(),
            m: comment.m.clone(),
            t: comment.t,
        }
    }
}

#[async_trait]
impl CommentRepository for CommentRepositoryImpl {
    /// Insert-ignore on `(episode_id, cid)`, reported back as the rows
    /// actually inserted so the caller can increment `Episode.comment_count`
    /// by exactly that amount (§3).
    async fn insert_ignore_batch(&self, episode_id: Uuid, comments_batch: &[Comment]) -> AppResult<i32> {
        let rows: Vec<CommentRow> = comments_batch
            .iter()
            .map(|c| {
                let mut row = Self::entity_to_row(c);
                row.episode_id = episode_id;
                row
            })
            .collect();
        self.db
            .run_blocking(move |conn| {
                let inserted = diesel::insert_into(comments::table)
                    .values(&rows)
                    .on_conflict((comments::episode_id, comments::cid))
                    .do_nothing()
                    .execute(conn)?;
                Ok(inserted as i32)
            })
            .await
    }

    async fn list_for_episode(&self, episode_id: Uuid) -> AppResult<Vec<Comment>> {
        self.db
            .run_blocking(move |conn| {
                let rows = comments::table
                    .filter(comments::episode_id.eq(episode_id))
                    .load::<CommentRow>(conn)?;
                Ok(rows.into_iter().map(Self::row_to_entity).collect())
            })
            .await
    }

    async fn clear_for_episode(&self, episode_id: Uuid) -> AppResult<()> {
        self.db
            .run_blocking(move |conn| {
                diesel::delete(comments::table.filter(comments::episode_id.eq(episode_id))).execute(conn)?;
                Ok(())
            })
            .await
    }
}

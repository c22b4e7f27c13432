use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::modules::comment::{TaskHistory, TaskStatus};
use crate::modules::persistence::TaskHistoryRepository;
use crate::schema::task_history;
use crate::shared::database::Database;
use crate::shared::errors::{AppError, AppResult};

use super::models::TaskHistoryRow;

impl FromStr for TaskStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(TaskStatus::Queued),
            "running" => Ok(TaskStatus::Running),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            other => Err(AppError::ParseError(format!("unknown task status: {}", other))),
        }
    }
}

pub struct TaskHistoryRepositoryImpl {
    db: Arc<Database>,
}

impl TaskHistoryRepositoryImpl {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn row_to_entity(row: TaskHistoryRow) -> AppResult<TaskHistory> {
        Ok(TaskHistory {
            id: row.id,
            title: row.title,
            status: TaskStatus::from_str(&row.status)?,
            progress: row.progress,
            description: row.description,
            created_at: row.created_at,
            finished_at: row.finished_at,
        })
    }

    fn entity_to_row(history: &TaskHistory) -> TaskHistoryRow {
        TaskHistoryRow {
            id: history.id,
            title: history.title.clone(),
            status: history.status.to_string(),
            progress: history.progress,
            description: history.description.clone(),
            created_at: history.created_at,
            finished_at: history.finished_at,
        }
    }
}

#[async_trait]
impl TaskHistoryRepository for TaskHistoryRepositoryImpl {
    async fn create(&self, history: TaskHistory) -> AppResult<TaskHistory> {
        let row = Self::entity_to_row(&history);
        self.db
            .run_blocking(move |conn| {
                diesel::insert_into(task_history::table).values(&row).execute(conn)?;
                Ok(())
            })
            .await?;
        Ok(history)
    }

    async fn update_progress(&self, id: Uuid, progress: i32, description: &str) -> AppResult<()> {
        let description = description.to_string();
        self.db
            .run_blocking(move |conn| {
                diesel::update(task_history::table.find(id))
                    .set((
                        task_history::progress.eq(progress),
                        task_history::description.eq(description),
                    ))
                    .execute(conn)?;
                Ok(())
            })
            .await
    }

    /// Enforces the monotonic status machine (§4.4) before writing; an
    /// illegal transition is a programming error in the task engine, not a
    /// recoverable condition, so it surfaces as `AppError::InternalError`.
    async fn transition(&self, id: Uuid, status: TaskStatus, description: &str) -> AppResult<()> {
        let description = description.to_string();
        self.db
            .run_blocking(move |conn| {
                let current = task_history::table
                    .find(id)
                    .select(task_history::status)
                    .first::<String>(conn)?;
                let current = TaskStatus::from_str(&current)?;
                if !current.can_transition_to(status) {
                    return Err(AppError::InternalError(format!(
                        "illegal task transition {} -> {}",
                        current, status
                    )));
                }
                let finished_at = matches!(status, TaskStatus::Completed | TaskStatus::Failed)
                    .then(Utc::now);
                diesel::update(task_history::table.find(id))
                    .set((
                        task_history::status.eq(status.to_string()),
                        task_history::description.eq(description),
                        task_history::finished_at.eq(finished_at),
                    ))
                    .execute(conn)?;
                Ok(())
            })
            .await
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<TaskHistory>> {
        self.db
            .run_blocking(move |conn| {
                let row = task_history::table
                    .find(id)
                    .first::<TaskHistoryRow>(conn)
                    .optional()?;
                row.map(Self::row_to_entity).transpose()
            })
            .await
    }

    async fn list_recent(&self, limit: i64) -> AppResult<Vec<TaskHistory>> {
        self.db
            .run_blocking(move |conn| {
                let rows = task_history::table
                    .order(task_history::created_at.desc())
                    .limit(limit)
                    .load::<TaskHistoryRow>(conn)?;
                rows.into_iter().map(Self::row_to_entity).collect()
            })
            .await
    }
}

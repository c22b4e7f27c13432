use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::modules::comment::ScheduledTask;
use crate::modules::persistence::ScheduledTaskRepository;
use crate::schema::scheduled_tasks;
use crate::shared::database::Database;
use crate::shared::errors::AppResult;

use super::models::ScheduledTaskRow;

pub struct ScheduledTaskRepositoryImpl {
    db: Arc<Database>,
}

impl ScheduledTaskRepositoryImpl {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn row_to_entity(row: ScheduledTaskRow) -> ScheduledTask {
        ScheduledTask {
            id: row.id,
            name: row.name,
            job_type: row.job_type,
            cron_expression: row.cron_expression,
            enabled: row.enabled,
            last_run: row.last_run,
            next_run: row.next_run,
        }
    }

    fn entity_to_row(task: &ScheduledTask) -> ScheduledTaskRow {
        ScheduledTaskRow {
            id: task.id,
            name: task.name.clone(),
            job_type: task.job_type.clone(),
            cron_expression: task.cron_expression.clone(),
            enabled: task.enabled,
            last_run: task.last_run,
            next_run: task.next_run,
        }
    }
}

#[async_trait]
impl ScheduledTaskRepository for ScheduledTaskRepositoryImpl {
    async fn list(&self) -> AppResult<Vec<ScheduledTask>> {
        self.db
            .run_blocking(move |conn| {
                let rows = scheduled_tasks::table.load::<ScheduledTaskRow>(conn)?;
                Ok(rows.into_iter().map(Self::row_to_entity).collect())
            })
            .await
    }

    async fn list_enabled(&self) -> AppResult<Vec<ScheduledTask>> {
        self.db
            .run_blocking(move |conn| {
                let rows = scheduled_tasks::table
                    .filter(scheduled_tasks::enabled.eq(true))
                    .load::<ScheduledTaskRow>(conn)?;
                Ok(rows.into_iter().map(Self::row_to_entity).collect())
            })
            .await
    }

    async fn upsert(&self, task: ScheduledTask) -> AppResult<()> {
        let row = Self::entity_to_row(&task);
        self.db
            .run_blocking(move |conn| {
                diesel::insert_into(scheduled_tasks::table)
                    .values(&row)
                    .on_conflict(scheduled_tasks::id)
                    .do_update()
                    .set(&row)
                    .execute(conn)?;
                Ok(())
            })
            .await
    }

    async fn record_run(
        &self,
        id: Uuid,
        last_run: DateTime<Utc>,
        next_run: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        self.db
            .run_blocking(move |conn| {
                diesel::update(scheduled_tasks::table.find(id))
                    .set((
                        scheduled_tasks::last_run.eq(last_run),
                        scheduled_tasks::next_run.eq(next_run),
                    ))
                    .execute(conn)?;
                Ok(())
            })
            .await
    }
}

use async_trait::async_trait;

use crate::shared::errors::AppResult;

/// §4.5 "Each registered job is a factory `(pool) -> task body`." The pool
/// is threaded through at construction time instead, so the trait itself
/// only needs the body.
#[async_trait]
pub trait ScheduledJob: Send + Sync {
    /// Matches a `scheduled_tasks.job_type` row; used to look the
    /// implementation up when registering or running a task on demand.
    fn job_type(&self) -> &'static str;

    async fn run(&self) -> AppResult<()>;
}

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

use crate::modules::comment::ScheduledTask;
use crate::modules::persistence::ScheduledTaskRepository;
use crate::shared::errors::{AppError, AppResult};
use crate::{log_error, log_info, log_warn};

use super::job::ScheduledJob;

/// §4.5 "Scheduler": cron-expression-driven job runner. Each registered
/// job fires its body directly (not through the task engine) and records
/// `last_run`/`next_run` on both success and error.
pub struct SchedulerEngine {
    scheduler: JobScheduler,
    tasks: Arc<dyn ScheduledTaskRepository>,
    jobs: HashMap<String, Arc<dyn ScheduledJob>>,
    cron_job_ids: Mutex<HashMap<Uuid, Uuid>>,
}

impl SchedulerEngine {
    pub async fn new(
        tasks: Arc<dyn ScheduledTaskRepository>,
        implementations: Vec<Arc<dyn ScheduledJob>>,
    ) -> AppResult<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::InternalError(format!("failed to start cron scheduler: {}", e)))?;
        let jobs = implementations.into_iter().map(|j| (j.job_type().to_string(), j)).collect();
        Ok(Self { scheduler, tasks, jobs, cron_job_ids: Mutex::new(HashMap::new()) })
    }

    /// §4.5 "Jobs list is persisted; on startup, all enabled jobs are
    /// registered with the trigger; disabled rows are registered but
    /// paused." The underlying cron library has no pause/resume
    /// primitive, so a disabled row is registered the same as an enabled
    /// one and its body no-ops on every tick until re-enabled.
    pub async fn start(&self) -> AppResult<()> {
        for row in self.tasks.list().await? {
            self.register(row).await?;
        }
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::InternalError(format!("failed to start cron scheduler: {}", e)))
    }

    async fn register(&self, row: ScheduledTask) -> AppResult<()> {
        let implementation = match self.jobs.get(&row.job_type) {
            Some(j) => Arc::clone(j),
            None => {
                log_warn!("scheduler: no implementation registered for job_type '{}'", row.job_type);
                return Ok(());
            }
        };
        let tasks = Arc::clone(&self.tasks);
        let task_id = row.id;
        let enabled = row.enabled;

        let job = Job::new_async(row.cron_expression.as_str(), move |uuid, sched| {
            let implementation = Arc::clone(&implementation);
            let tasks = Arc::clone(&tasks);
            Box::pin(async move {
                if !enabled {
                    return;
                }
                run_and_record(task_id, uuid, implementation, tasks, sched).await;
            })
        })
        .map_err(|e| AppError::InternalError(format!("invalid cron expression for {}: {}", row.name, e)))?;

        let cron_job_id = self
            .scheduler
            .add(job)
            .await
            .map_err(|e| AppError::InternalError(format!("failed to register job {}: {}", row.name, e)))?;
        self.cron_job_ids.lock().await.insert(task_id, cron_job_id);
        Ok(())
    }

    /// §4.5 "RunNow(task_id): advance the job's next fire time to 'now'."
    /// Runs the job body immediately, outside the cron trigger, since the
    /// body already performs the same execution + record_run bookkeeping
    /// a real tick would have.
    pub async fn run_now(&self, task_id: Uuid) -> AppResult<()> {
        let row = self
            .tasks
            .list()
            .await?
            .into_iter()
            .find(|t| t.id == task_id)
            .ok_or_else(|| AppError::NotFound(format!("scheduled task {}", task_id)))?;
        let implementation = self
            .jobs
            .get(&row.job_type)
            .cloned()
            .ok_or_else(|| AppError::UnknownProvider(row.job_type.clone()))?;
        let cron_job_id = self
            .cron_job_ids
            .lock()
            .await
            .get(&task_id)
            .copied()
            .ok_or_else(|| AppError::NotFound(format!("cron registration for scheduled task {}", task_id)))?;
        run_and_record(task_id, cron_job_id, implementation, Arc::clone(&self.tasks), self.scheduler.clone()).await;
        Ok(())
    }

    /// §5 "Scheduler shutdown waits for in-flight jobs to yield at the
    /// next `await`."
    pub async fn shutdown(mut self) -> AppResult<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::InternalError(format!("scheduler shutdown failed: {}", e)))
    }
}

/// Runs `job` and persists `last_run`/`next_run` on both success and
/// error (§4.5). `next_run` is read back from the cron scheduler itself
/// after the run so a manually-triggered `run_now` still reflects the
/// job's real next scheduled tick, not `now`.
async fn run_and_record(
    task_id: Uuid,
    cron_job_id: Uuid,
    job: Arc<dyn ScheduledJob>,
    tasks: Arc<dyn ScheduledTaskRepository>,
    mut scheduler: JobScheduler,
) {
    let started_at = chrono::Utc::now();
    log_info!("scheduler: running job '{}'", job.job_type());
    if let Err(err) = job.run().await {
        log_error!("scheduler: job '{}' failed: {}", job.job_type(), err);
    }
    let next_run = match scheduler.next_tick_for_job(cron_job_id).await {
        Ok(next) => next,
        Err(err) => {
            log_warn!("scheduler: failed to read next tick for job {}: {}", cron_job_id, err);
            None
        }
    };
    if let Err(err) = tasks.record_run(task_id, started_at, next_run).await {
        log_error!("scheduler: failed to record run for task {}: {}", task_id, err);
    }
}

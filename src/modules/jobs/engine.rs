use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::modules::comment::{TaskHistory, TaskStatus};
use crate::modules::persistence::TaskHistoryRepository;
use crate::shared::errors::{AppError, AppResult};
use crate::{log_error, log_info};

use super::types::{ProgressFn, TaskFactory};

struct QueuedTask {
    id: Uuid,
    factory: TaskFactory,
}

/// §4.4 "Task Engine": in-memory FIFO queue, exactly one worker.
pub struct TaskEngine {
    history: Arc<dyn TaskHistoryRepository>,
    sender: mpsc::UnboundedSender<QueuedTask>,
}

impl TaskEngine {
    /// Spawns the single worker loop and returns a handle submitters share.
    pub fn start(history: Arc<dyn TaskHistoryRepository>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(Self::run(Arc::clone(&history), receiver));
        Self { history, sender }
    }

    /// §4.4 "Submit(coroutine_factory, title) -> task_id." The history row
    /// is created synchronously so the caller can poll it immediately;
    /// the factory itself doesn't run until the worker dequeues it.
    pub async fn submit(&self, title: impl Into<String>, factory: TaskFactory) -> AppResult<Uuid> {
        let history = TaskHistory {
            id: Uuid::new_v4(),
            title: title.into(),
            status: TaskStatus::Queued,
            progress: 0,
            description: "queued".to_string(),
            created_at: chrono::Utc::now(),
            finished_at: None,
        };
        let created = self.history.create(history).await?;
        let id = created.id;
        self.sender
            .send(QueuedTask { id, factory })
            .map_err(|_| AppError::Cancelled)?;
        Ok(id)
    }

    /// §4.4 "Shutdown: cancel the worker loop; currently-running task is
    /// allowed to finish its current await point, then discarded." Closing
    /// the sender lets the worker's `recv` return `None` once the channel
    /// drains, without interrupting a task already mid-flight.
    pub fn shutdown(self) {
        drop(self.sender);
    }

    async fn run(history: Arc<dyn TaskHistoryRepository>, mut receiver: mpsc::UnboundedReceiver<QueuedTask>) {
        log_info!("task engine worker started");
        while let Some(task) = receiver.recv().await {
            Self::run_one(&history, task).await;
        }
        log_info!("task engine worker exiting");
    }

    async fn run_one(history: &Arc<dyn TaskHistoryRepository>, task: QueuedTask) {
        let QueuedTask { id, factory } = task;
        if let Err(e) = history.transition(id, TaskStatus::Running, "running").await {
            log_error!("task {} failed to transition to running: {}", id, e);
            return;
        }

        let callback_history = Arc::clone(history);
        let progress: Arc<ProgressFn> = Arc::new(move |progress, description| {
            let history = Arc::clone(&callback_history);
            let description = description.to_string();
            // §4.4 "May be called from any goroutine/thread; manager
            // serializes writes to the task record." Each update is its
            // own fire-and-forget write; ordering among progress updates
            // (as opposed to the terminal state transition) isn't
            // load-bearing.
            tokio::spawn(async move {
                if let Err(e) = history.update_progress(id, progress, &description).await {
                    log_error!("task {} progress update failed: {}", id, e);
                }
            });
        });

        match factory(progress).await {
            Ok(description) => {
                if let Err(e) = history.transition(id, TaskStatus::Completed, &description).await {
                    log_error!("task {} failed to transition to completed: {}", id, e);
                }
            }
            Err(e) => {
                log_error!("task {} failed: {}", id, e);
                if let Err(e2) = history.transition(id, TaskStatus::Failed, &e.to_string()).await {
                    log_error!("task {} failed to transition to failed: {}", id, e2);
                }
            }
        }
    }
}

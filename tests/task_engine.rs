use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use danmu_aggregator::modules::comment::{TaskHistory, TaskStatus};
use danmu_aggregator::modules::jobs::TaskEngine;
use danmu_aggregator::modules::persistence::TaskHistoryRepository;
use danmu_aggregator::shared::errors::AppResult;

struct FakeTaskHistoryRepository {
    rows: Mutex<Vec<TaskHistory>>,
}

impl FakeTaskHistoryRepository {
    fn new() -> Self {
        Self { rows: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl TaskHistoryRepository for FakeTaskHistoryRepository {
    async fn create(&self, history: TaskHistory) -> AppResult<TaskHistory> {
        self.rows.lock().unwrap().push(history.clone());
        Ok(history)
    }

    async fn update_progress(&self, id: Uuid, progress: i32, description: &str) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
            row.progress = progress;
            row.description = description.to_string();
        }
        Ok(())
    }

    async fn transition(&self, id: Uuid, status: TaskStatus, description: &str) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
            row.status = status;
            row.description = description.to_string();
            if matches!(status, TaskStatus::Completed | TaskStatus::Failed) {
                row.finished_at = Some(chrono::Utc::now());
            }
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<TaskHistory>> {
        Ok(self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn list_recent(&self, limit: i64) -> AppResult<Vec<TaskHistory>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().rev().take(limit as usize).cloned().collect())
    }
}

/// §4.4: submit runs the factory exactly once and transitions
/// queued -> running -> completed monotonically, persisting the final
/// description the factory returned.
#[tokio::test]
async fn submitted_task_completes_and_persists_final_description() {
    let history = Arc::new(FakeTaskHistoryRepository::new());
    let engine = TaskEngine::start(history.clone());

    let task_id = engine
        .submit("unit test task", Box::new(|progress| {
            Box::pin(async move {
                progress(50, "halfway");
                Ok("done".to_string())
            })
        }))
        .await
        .unwrap();

    // The worker loop runs on a spawned task; give it a moment to drain.
    let mut observed = None;
    for _ in 0..50 {
        let row = history.get(task_id).await.unwrap();
        if let Some(r) = &row {
            if r.status == TaskStatus::Completed {
                observed = Some(r.clone());
                break;
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    let row = observed.expect("task should have completed");
    assert_eq!(row.status, TaskStatus::Completed);
    assert_eq!(row.description, "done");
    assert!(row.finished_at.is_some());
}

/// §4.4: transitions are monotonic — queued can reach running and
/// completed, but never regress.
#[test]
fn task_status_transitions_are_monotonic() {
    assert!(TaskStatus::Queued.can_transition_to(TaskStatus::Running));
    assert!(TaskStatus::Running.can_transition_to(TaskStatus::Completed));
    assert!(TaskStatus::Running.can_transition_to(TaskStatus::Failed));
    assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::Running));
    assert!(!TaskStatus::Queued.can_transition_to(TaskStatus::Completed));
}

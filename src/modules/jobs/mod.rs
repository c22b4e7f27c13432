//! §4.4 "Task Engine": in-memory FIFO queue, exactly one worker, monotonic
//! state transitions persisted to `task_history`.

mod engine;
mod types;

pub use engine::TaskEngine;
pub use types::{ProgressFn, TaskFactory};

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::shared::errors::AppResult;

/// §4.4 "Progress callback contract: `(progress_int_0_100,
/// description_string)`."
pub type ProgressFn = dyn Fn(i32, &str) + Send + Sync;

/// §4.4 "the factory is invoked with a progress-callback closure the first
/// time the worker picks it up; this lets tasks receive a bound callback
/// without capturing internal state."
pub type TaskFactory =
    Box<dyn FnOnce(Arc<ProgressFn>) -> Pin<Box<dyn Future<Output = AppResult<String>> + Send>> + Send>;

//! §4.3 "Import Engine": generic import, full source refresh,
//! single-episode refresh. Emits progress via the task engine's
//! `ProgressFn` contract but owns none of the queueing itself.

mod engine;
mod types;

pub use engine::ImportEngine;
pub use types::{ExternalIds, GenericImportRequest};

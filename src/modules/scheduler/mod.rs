//! §4.5 "Scheduler": cron-expression-driven recurring jobs, distinct from
//! the one-shot FIFO task engine in `modules::jobs`.

mod engine;
mod job;
mod tmdb_auto_map;

pub use engine::SchedulerEngine;
pub use job::ScheduledJob;
pub use tmdb_auto_map::TmdbAutoMapJob;

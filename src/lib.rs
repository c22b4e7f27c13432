//! Aggregates danmaku comment streams for films and series from multiple
//! providers, normalizes them into one schema, and serves them back
//! through a dandanplay-compatible playback API (§1 OVERVIEW).

pub mod modules;
pub mod schema;
pub mod shared;
pub mod state;

//! §4.6 "Match Dispatcher (Webhook)": resolves a webhook's loosely-typed
//! title/season/kind into a concrete provider source and emits the
//! generic-import task that will actually fetch it.

mod dispatcher;
mod similarity;
mod types;

pub use dispatcher::MatchDispatcher;
pub use similarity::{SimilarityStrategy, TokenSetRatioStrategy};
pub use types::MatchRequest;

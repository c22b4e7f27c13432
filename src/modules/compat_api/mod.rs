//! §6 "Compatibility playback API": the dandanplay-compatible surface media
//! players talk to, nested under `/api/{token}` and duplicated verbatim
//! under `/api/{token}/v2`.

mod dto;
mod filename_match;
mod handlers;
mod router;

pub use dto::*;
pub use filename_match::{parse_filename, ParsedFilename};
pub use router::router;

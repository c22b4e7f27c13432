//! §2 "Provider adapter (abstract)" and "Concrete adapters ×5+": a common
//! contract six independent scraping clients implement, plus the registry
//! that discovers and fans work out across them (§4.2).

pub mod adapters;
pub mod registry;
pub mod season;
mod title_filter;
pub mod traits;

pub use registry::ProviderRegistry;
pub use title_filter::{is_junk_title, is_movie_phrase, strip_junk_phrases};
pub use traits::{
    NormalizedComment, ProviderAdapter, ProviderEpisodeInfo, ProviderSearchInfo, RateLimiterInfo,
};

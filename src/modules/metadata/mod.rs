//! §4.5.1 "TMDB auto-map job": a typed TMDB client plus the alias-extraction
//! helper the scheduler job applies to its response.

mod alias;
mod client;

pub use alias::{extract_aliases, AliasCandidates};
pub use client::{
    TmdbAlternativeTitle, TmdbAlternativeTitles, TmdbClient, TmdbEpisodeGroup, TmdbEpisodeGroupDetail,
    TmdbEpisodeGroupSeason, TmdbGroupEpisode, TmdbHttpClient, TmdbTvDetail,
};

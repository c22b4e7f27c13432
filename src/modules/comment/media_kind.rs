use serde::{Deserialize, Serialize};

/// §3 / GLOSSARY: "one of {tv_series, movie, ova, other}. Influences
/// iteration (movies collapse to a single episode) and matching."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    TvSeries,
    Movie,
    Ova,
    Other,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::TvSeries => "tv_series",
            MediaKind::Movie => "movie",
            MediaKind::Ova => "ova",
            MediaKind::Other => "other",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tv_series" => Ok(MediaKind::TvSeries),
            "movie" => Ok(MediaKind::Movie),
            "ova" => Ok(MediaKind::Ova),
            "other" => Ok(MediaKind::Other),
            other => Err(format!("unknown media kind: {}", other)),
        }
    }
}

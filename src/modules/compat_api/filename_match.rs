use std::sync::OnceLock;

use regex::Regex;

/// §6 `POST /match`: "parse filename via a cascade of regexes (`[group]
/// title - NN`, `title - NN`, `[group] title NN`, `title NN`; fallback:
/// treat as movie episode 1 after stripping brackets and quality tags)."
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFilename {
    pub title: String,
    pub episode: i32,
    pub is_movie: bool,
}

fn bracketed_title_dash_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\[[^\]]+\]\s*(.+?)\s*-\s*(\d{1,4})\b").expect("pattern is valid"))
}

fn title_dash_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.+?)\s*-\s*(\d{1,4})\b").expect("pattern is valid"))
}

fn bracketed_title_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\[[^\]]+\]\s*(.+?)\s+(\d{1,4})\b").expect("pattern is valid"))
}

fn title_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.+?)\s+(\d{1,4})\b").expect("pattern is valid"))
}

fn bracket_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[[^\]]*\]").expect("pattern is valid"))
}

fn quality_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(1080p|720p|2160p|4k|hevc|x264|x265|aac|flac|bdrip|web-?dl)\b")
            .expect("pattern is valid")
    })
}

fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

/// Runs the cascade in order, returning the first match; falls back to
/// movie-episode-1 after stripping bracket groups and quality tags.
pub fn parse_filename(file_name: &str) -> ParsedFilename {
    let stem = strip_extension(file_name.trim());

    for regex in [bracketed_title_dash_number(), title_dash_number(), bracketed_title_number(), title_number()] {
        if let Some(caps) = regex.captures(stem) {
            let title = caps.get(1).unwrap().as_str().trim().to_string();
            let episode: i32 = caps.get(2).unwrap().as_str().parse().unwrap_or(1);
            if !title.is_empty() {
                return ParsedFilename { title, episode, is_movie: false };
            }
        }
    }

    let without_brackets = bracket_tag().replace_all(stem, "");
    let without_quality = quality_tag().replace_all(&without_brackets, "");
    let title = without_quality.trim().trim_matches(['-', '_', '.']).trim().to_string();

    ParsedFilename { title: if title.is_empty() { stem.to_string() } else { title }, episode: 1, is_movie: true }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracketed_group_title_dash_number() {
        let parsed = parse_filename("[Group] Show Name - 05.mkv");
        assert_eq!(parsed, ParsedFilename { title: "Show Name".to_string(), episode: 5, is_movie: false });
    }

    #[test]
    fn plain_title_dash_number() {
        let parsed = parse_filename("Show Name - 12.mp4");
        assert_eq!(parsed.title, "Show Name");
        assert_eq!(parsed.episode, 12);
    }

    #[test]
    fn bracketed_group_title_space_number() {
        let parsed = parse_filename("[Group] Show Name 07.mkv");
        assert_eq!(parsed.title, "Show Name");
        assert_eq!(parsed.episode, 7);
    }

    #[test]
    fn plain_title_space_number() {
        let parsed = parse_filename("Show Name 03.mkv");
        assert_eq!(parsed.title, "Show Name");
        assert_eq!(parsed.episode, 3);
    }

    #[test]
    fn falls_back_to_movie_episode_one() {
        let parsed = parse_filename("[Group] Some Movie [1080p][x264].mkv");
        assert!(parsed.is_movie);
        assert_eq!(parsed.episode, 1);
        assert_eq!(parsed.title, "Some Movie");
    }
}

use regex::Regex;
use std::sync::OnceLock;

/// §4.1 "junk-title rule": excludes OP/ED/SP/OVA/PV/Trailer and Chinese
/// equivalents (预告/花絮/彩蛋) plus menu/bonus markers. Matched
/// case-insensitively against the whole raw title, not just a suffix,
/// since providers embed these markers in varying positions.
fn junk_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(OP|ED|SP|OVA|PV|Trailer|NCOP|NCED|menu|bonus)\b|预告|花絮|彩蛋",
        )
        .expect("junk title pattern is valid")
    })
}

pub fn is_junk_title(title: &str) -> bool {
    junk_regex().is_match(title)
}

/// §4.1 movie-phrase regex used by the match dispatcher (§4.6) to coerce a
/// candidate's kind to movie before filtering.
fn movie_phrase_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)剧场版|劇場版|movie|映画").expect("movie phrase pattern is valid")
    })
}

pub fn is_movie_phrase(title: &str) -> bool {
    movie_phrase_regex().is_match(title)
}

/// Strips a known junk marker suffix/prefix so the remaining text is the
/// base title search results are grouped under (§8 scenario 2: `"Show S2
/// PV"` parses to base title `"Show"`).
pub fn strip_junk_phrases(title: &str) -> String {
    let trimmed = title
        .replace("NCOP", "")
        .replace("NCED", "")
        .replace("- NCOP", "")
        .replace("- NCED", "");
    trimmed.trim().trim_end_matches('-').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_known_junk_markers() {
        assert!(is_junk_title("Show S2 PV"));
        assert!(is_junk_title("Show - NCOP"));
        assert!(is_junk_title("预告片"));
        assert!(!is_junk_title("Show Season 2"));
    }

    #[test]
    fn movie_phrase_detection() {
        assert!(is_movie_phrase("某某 剧场版"));
        assert!(is_movie_phrase("Some Movie"));
        assert!(!is_movie_phrase("Show Season 2"));
    }
}

use super::client::TmdbAlternativeTitle;

/// §4.5.1 step 4: "extract aliases by country code (US→en with GB
/// fallback; JP with Type=='Romaji'→romaji else jp; CN/HK/TW→cn); clean by
/// stripping '劇場版'/'the movie' phrases and trailing punctuation."
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AliasCandidates {
    pub en: Option<String>,
    pub jp: Option<String>,
    pub romaji: Option<String>,
    pub cn: Vec<String>,
}

fn clean(title: &str) -> String {
    let without_phrases = title.replace("劇場版", "").replace("the movie", "").replace("The Movie", "");
    without_phrases.trim().trim_end_matches(['.', ',', '!', '?', '-']).trim().to_string()
}

pub fn extract_aliases(titles: &[TmdbAlternativeTitle]) -> AliasCandidates {
    let mut out = AliasCandidates::default();
    let mut gb_fallback: Option<String> = None;

    for title in titles {
        let cleaned = clean(&title.title);
        if cleaned.is_empty() {
            continue;
        }
        match title.iso_3166_1.as_str() {
            "US" => {
                out.en.get_or_insert(cleaned);
            }
            "GB" => {
                gb_fallback.get_or_insert(cleaned);
            }
            "JP" if title.kind == "Romaji" => {
                out.romaji.get_or_insert(cleaned);
            }
            "JP" => {
                out.jp.get_or_insert(cleaned);
            }
            "CN" | "HK" | "TW" => out.cn.push(cleaned),
            _ => {}
        }
    }

    if out.en.is_none() {
        out.en = gb_fallback;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title(iso: &str, text: &str, kind: &str) -> TmdbAlternativeTitle {
        TmdbAlternativeTitle {
            iso_3166_1: iso.to_string(),
            title: text.to_string(),
            kind: kind.to_string(),
        }
    }

    #[test]
    fn us_preferred_over_gb() {
        let candidates = extract_aliases(&[title("GB", "Show (UK)", ""), title("US", "Show", "")]);
        assert_eq!(candidates.en, Some("Show".to_string()));
    }

    #[test]
    fn gb_used_when_us_absent() {
        let candidates = extract_aliases(&[title("GB", "Show (UK)", "")]);
        assert_eq!(candidates.en, Some("Show (UK)".to_string()));
    }

    #[test]
    fn romaji_and_jp_are_distinct_slots() {
        let candidates = extract_aliases(&[title("JP", "Shou", "Romaji"), title("JP", "ショウ", "")]);
        assert_eq!(candidates.romaji, Some("Shou".to_string()));
        assert_eq!(candidates.jp, Some("ショウ".to_string()));
    }

    #[test]
    fn strips_movie_phrase_and_trailing_punctuation() {
        let candidates = extract_aliases(&[title("CN", "秀 劇場版.", "")]);
        assert_eq!(candidates.cn, vec!["秀".to_string()]);
    }
}

use regex::Regex;
use std::sync::OnceLock;

/// §4.1 / §8: `season("Show S03") == season("Show Season 3") ==
/// season("Show 第三季") == season("Show III") == season("Show Ⅲ") == 3`;
/// `season("Show") == 1`. Returns `(base_title, season_number)` with the
/// season marker stripped from the base title.
pub fn extract_season(title: &str) -> (String, i32) {
    if let Some((base, n)) = try_sxx(title) {
        return (base, n);
    }
    if let Some((base, n)) = try_season_word(title) {
        return (base, n);
    }
    if let Some((base, n)) = try_chinese_season(title) {
        return (base, n);
    }
    if let Some((base, n)) = try_roman(title) {
        return (base, n);
    }
    if let Some((base, n)) = try_fullwidth_roman(title) {
        return (base, n);
    }
    (title.trim().to_string(), 1)
}

fn sxx_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bS(\d{1,2})\b").expect("S\\d+ pattern is valid"))
}

fn try_sxx(title: &str) -> Option<(String, i32)> {
    let re = sxx_regex();
    let caps = re.captures(title)?;
    let n: i32 = caps.get(1)?.as_str().parse().ok()?;
    Some((strip_match(title, &caps[0]), n))
}

fn season_word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bSeason\s*(\d{1,2})\b").expect("Season \\d+ pattern is valid"))
}

fn try_season_word(title: &str) -> Option<(String, i32)> {
    let re = season_word_regex();
    let caps = re.captures(title)?;
    let n: i32 = caps.get(1)?.as_str().parse().ok()?;
    Some((strip_match(title, &caps[0]), n))
}

fn chinese_season_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"第([一二三四五六七八九十\d]+)[季部]").expect("第...季 pattern is valid")
    })
}

fn try_chinese_season(title: &str) -> Option<(String, i32)> {
    let re = chinese_season_regex();
    let caps = re.captures(title)?;
    let raw = caps.get(1)?.as_str();
    let n = raw.parse::<i32>().ok().or_else(|| chinese_numeral_to_i32(raw))?;
    Some((strip_match(title, &caps[0]), n))
}

fn chinese_numeral_to_i32(s: &str) -> Option<i32> {
    let digits: Vec<char> = s.chars().collect();
    match digits.as_slice() {
        ['十'] => Some(10),
        [d] => single_cn_digit(*d),
        ['十', d] => single_cn_digit(*d).map(|v| 10 + v),
        [d, '十'] => single_cn_digit(*d).map(|v| v * 10),
        _ => None,
    }
}

fn single_cn_digit(c: char) -> Option<i32> {
    match c {
        '一' => Some(1),
        '二' => Some(2),
        '三' => Some(3),
        '四' => Some(4),
        '五' => Some(5),
        '六' => Some(6),
        '七' => Some(7),
        '八' => Some(8),
        '九' => Some(9),
        _ => None,
    }
}

const ROMAN_NUMERALS: [&str; 12] = [
    "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X", "XI", "XII",
];

fn roman_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([IVX]+)\b").expect("roman numeral pattern is valid"))
}

fn try_roman(title: &str) -> Option<(String, i32)> {
    let re = roman_regex();
    let caps = re.captures(title)?;
    let token = caps.get(1)?.as_str();
    let n = ROMAN_NUMERALS.iter().position(|r| *r == token)? as i32 + 1;
    Some((strip_match(title, &caps[0]), n))
}

const FULLWIDTH_ROMAN: [char; 12] = [
    '\u{2160}', '\u{2161}', '\u{2162}', '\u{2163}', '\u{2164}', '\u{2165}', '\u{2166}', '\u{2167}',
    '\u{2168}', '\u{2169}', '\u{216A}', '\u{216B}',
];

fn try_fullwidth_roman(title: &str) -> Option<(String, i32)> {
    for (idx, ch) in FULLWIDTH_ROMAN.iter().enumerate() {
        if let Some(pos) = title.find(*ch) {
            let matched = &title[pos..pos + ch.len_utf8()];
            return Some((strip_match(title, matched), idx as i32 + 1));
        }
    }
    None
}

fn strip_match(title: &str, matched: &str) -> String {
    title.replacen(matched, "", 1).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_forms_agree_on_season_three() {
        assert_eq!(extract_season("Show S03").1, 3);
        assert_eq!(extract_season("Show Season 3").1, 3);
        assert_eq!(extract_season("Show 第三季").1, 3);
        assert_eq!(extract_season("Show III").1, 3);
        assert_eq!(extract_season("Show Ⅲ").1, 3);
    }

    #[test]
    fn defaults_to_one() {
        assert_eq!(extract_season("Show").1, 1);
    }

    #[test]
    fn strips_marker_from_base_title() {
        let (base, season) = extract_season("Show S2 PV");
        assert_eq!(base, "Show PV");
        assert_eq!(season, 2);
    }
}

/// §3 Work invariant: title is normalized so `:` -> `：` (fullwidth colon).
///
/// Idempotent per §8: `normalize(normalize(title)) == normalize(title)`,
/// which holds trivially here since the replacement target never matches
/// the source pattern.
pub fn normalize_title(title: &str) -> String {
    title.replace(':', "：")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_ascii_colon() {
        assert_eq!(normalize_title("Show: Part Two"), "Show： Part Two");
    }

    #[test]
    fn idempotent() {
        let once = normalize_title("A: B: C");
        let twice = normalize_title(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn no_colon_is_unchanged() {
        assert_eq!(normalize_title("Show Name"), "Show Name");
    }
}

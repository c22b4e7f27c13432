use std::collections::BTreeSet;

use strsim::normalized_levenshtein;

/// Grounded on the teacher's `SimilarityStrategy` trait
/// (`modules/provider/domain/services/search_processor/similarity_strategy.rs`):
/// a pluggable 0.0-1.0 string-similarity calculation.
pub trait SimilarityStrategy: Send + Sync {
    fn calculate(&self, query: &str, target: &str) -> f64;
    fn name(&self) -> &'static str;
}

/// §4.6 step 4 "fuzzy_token_set_ratio": tokenizes both strings into
/// lowercase word sets, builds the three fuzzywuzzy `token_set_ratio`
/// comparison strings (shared tokens; shared+query-only; shared+target-only)
/// and returns the best pairwise ratio among them. Order-insensitive and
/// robust to one title being a superset of the other's words, which a
/// plain edit-distance ratio is not.
pub struct TokenSetRatioStrategy;

impl TokenSetRatioStrategy {
    fn tokenize(s: &str) -> BTreeSet<String> {
        s.split_whitespace().map(|w| w.to_lowercase()).collect()
    }

    fn join(tokens: &BTreeSet<String>) -> String {
        tokens.iter().cloned().collect::<Vec<_>>().join(" ")
    }
}

impl SimilarityStrategy for TokenSetRatioStrategy {
    fn calculate(&self, query: &str, target: &str) -> f64 {
        let query_tokens = Self::tokenize(query);
        let target_tokens = Self::tokenize(target);

        let intersection: BTreeSet<String> = query_tokens.intersection(&target_tokens).cloned().collect();
        let query_only: BTreeSet<String> = query_tokens.difference(&target_tokens).cloned().collect();
        let target_only: BTreeSet<String> = target_tokens.difference(&query_tokens).cloned().collect();

        let base = Self::join(&intersection);
        let with_query_only = if base.is_empty() {
            Self::join(&query_only)
        } else {
            format!("{} {}", base, Self::join(&query_only))
        };
        let with_target_only = if base.is_empty() {
            Self::join(&target_only)
        } else {
            format!("{} {}", base, Self::join(&target_only))
        };

        let candidates = [
            normalized_levenshtein(&base, &with_query_only),
            normalized_levenshtein(&base, &with_target_only),
            normalized_levenshtein(&with_query_only, &with_target_only),
        ];
        candidates.into_iter().fold(0.0_f64, f64::max)
    }

    fn name(&self) -> &'static str {
        "TokenSetRatio"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_titles_score_one() {
        let strategy = TokenSetRatioStrategy;
        assert_eq!(strategy.calculate("Attack on Titan", "Attack on Titan"), 1.0);
    }

    #[test]
    fn word_order_does_not_matter() {
        let strategy = TokenSetRatioStrategy;
        let a = strategy.calculate("Attack on Titan", "Titan on Attack");
        assert_eq!(a, 1.0);
    }

    #[test]
    fn superset_of_words_scores_higher_than_edit_distance_would() {
        let strategy = TokenSetRatioStrategy;
        let score = strategy.calculate("Naruto", "Naruto Shippuden Special Edition");
        assert!(score > 0.6);
    }

    #[test]
    fn unrelated_titles_score_low() {
        let strategy = TokenSetRatioStrategy;
        let score = strategy.calculate("Attack on Titan", "Your Lie in April");
        assert!(score < 0.5);
    }
}

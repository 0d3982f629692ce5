//! Fuzzy string similarity used by the location resolver

use sakuna_core::ScorerKind;

/// String similarity capability, scored 0..=100
pub trait SimilarityScorer: Send + Sync {
    fn score(&self, a: &str, b: &str) -> u8;
}

/// Lower-case, turn non-alphanumerics into spaces, sort the tokens
pub fn sorted_tokens(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase();

    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// LCS length using two-row DP
fn lcs_length(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
        curr.fill(0);
    }
    prev[b.len()]
}

/// Indel similarity ratio over sorted tokens
///
/// `round(200 * LCS / (|a| + |b|))`; an input that is empty after
/// processing scores 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenSortRatio;

impl SimilarityScorer for TokenSortRatio {
    fn score(&self, a: &str, b: &str) -> u8 {
        let a: Vec<char> = sorted_tokens(a).chars().collect();
        let b: Vec<char> = sorted_tokens(b).chars().collect();
        if a.is_empty() || b.is_empty() {
            return 0;
        }

        let lcs = lcs_length(&a, &b);
        let ratio = 200.0 * lcs as f64 / (a.len() + b.len()) as f64;
        ratio.round().clamp(0.0, 100.0) as u8
    }
}

/// Normalised Levenshtein similarity over sorted tokens
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenSortLevenshtein;

impl SimilarityScorer for TokenSortLevenshtein {
    fn score(&self, a: &str, b: &str) -> u8 {
        let a = sorted_tokens(a);
        let b = sorted_tokens(b);
        if a.is_empty() || b.is_empty() {
            return 0;
        }

        (strsim::normalized_levenshtein(&a, &b) * 100.0).round() as u8
    }
}

pub fn scorer_for(kind: ScorerKind) -> Box<dyn SimilarityScorer> {
    match kind {
        ScorerKind::TokenSortRatio => Box::new(TokenSortRatio),
        ScorerKind::TokenSortLevenshtein => Box::new(TokenSortLevenshtein),
    }
}

/// Best-scoring choice at or above `threshold`
///
/// Ties go to the earliest choice.
pub fn best_match<'c, I>(
    scorer: &dyn SimilarityScorer,
    query: &str,
    choices: I,
    threshold: u8,
) -> Option<&'c str>
where
    I: IntoIterator<Item = &'c str>,
{
    let mut best: Option<(&str, u8)> = None;
    for choice in choices {
        let score = scorer.score(query, choice);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((choice, score));
        }
    }

    best.filter(|(_, score)| *score >= threshold)
        .map(|(choice, _)| choice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sorted_tokens() {
        assert_eq!(sorted_tokens("Region IV-A"), "a iv region");
        assert_eq!(sorted_tokens("  City of  Calamba "), "calamba city of");
        assert_eq!(sorted_tokens("--"), "");
    }

    #[test]
    fn test_token_sort_ratio() {
        let scorer = TokenSortRatio;
        assert_eq!(scorer.score("Laguna", "laguna"), 100);
        assert_eq!(scorer.score("Calamba City", "city calamba"), 100);
        // lagunna vs laguna: LCS 6, lengths 7 + 6
        assert_eq!(scorer.score("Lagunna", "laguna"), 92);
        assert_eq!(scorer.score("", "laguna"), 0);
        assert!(scorer.score("Lgna", "laguna") < 85);
    }

    #[test]
    fn test_levenshtein_scorer() {
        let scorer = TokenSortLevenshtein;
        assert_eq!(scorer.score("Batangas", "BATANGAS"), 100);
        assert_eq!(scorer.score("Batangs", "batangas"), 88);
        assert_eq!(scorer.score("", "batangas"), 0);
    }

    #[test]
    fn test_best_match_tie_goes_first() {
        let choices = ["abcx", "abcy", "zzzz"];
        let best = best_match(&TokenSortRatio, "abcz", choices.iter().copied(), 50);
        assert_eq!(best, Some("abcx"));

        let none = best_match(&TokenSortRatio, "qqqq", choices.iter().copied(), 50);
        assert_eq!(none, None);
    }

    proptest! {
        #[test]
        fn test_ratio_symmetric_and_bounded(a in "[a-zA-Z ]{0,20}", b in "[a-zA-Z ]{0,20}") {
            let ab = TokenSortRatio.score(&a, &b);
            prop_assert_eq!(ab, TokenSortRatio.score(&b, &a));
            prop_assert!(ab <= 100);
        }

        #[test]
        fn test_ratio_identity(a in "[a-z]{1,12}( [a-z]{1,12}){0,3}") {
            prop_assert_eq!(TokenSortRatio.score(&a, &a), 100);
        }
    }
}

//! # Aggregator Module
//!
//! Merges the per-signal match lists into one verdict.
//!
//! A recipe can be found by several signals at once (an identical photo is
//! also perceptually identical). The final list holds each recipe once, at
//! the highest confidence any signal gave it, best match first.

use crate::core::matcher::DuplicateMatch;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outcome of a duplicate check
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DuplicateCheckResult {
    pub is_duplicate: bool,
    /// Sorted by descending confidence, one entry per recipe
    pub matches: Vec<DuplicateMatch>,
}

impl DuplicateCheckResult {
    /// A result with no matches
    pub fn none() -> Self {
        Self::default()
    }

    /// The highest-confidence match, if any
    pub fn best_match(&self) -> Option<&DuplicateMatch> {
        self.matches.first()
    }
}

/// Stateless merger of match lists
#[derive(Debug, Default, Clone, Copy)]
pub struct ScoreAggregator;

impl ScoreAggregator {
    /// Create a new aggregator
    pub fn new() -> Self {
        Self
    }

    /// Concatenate, dedupe by recipe id keeping the max confidence, and
    /// sort best first.
    pub fn merge<I>(&self, lists: I) -> DuplicateCheckResult
    where
        I: IntoIterator<Item = Vec<DuplicateMatch>>,
    {
        let mut merged: Vec<DuplicateMatch> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for m in lists.into_iter().flatten() {
            match positions.get(&m.recipe_id) {
                Some(&index) => {
                    if m.confidence > merged[index].confidence {
                        merged[index] = m;
                    }
                }
                None => {
                    positions.insert(m.recipe_id.clone(), merged.len());
                    merged.push(m);
                }
            }
        }

        merged.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        DuplicateCheckResult {
            is_duplicate: !merged.is_empty(),
            matches: merged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::matcher::MatchType;

    #[test]
    fn no_matches_is_not_a_duplicate() {
        let result = ScoreAggregator::new().merge(vec![vec![], vec![], vec![]]);

        assert!(!result.is_duplicate);
        assert!(result.matches.is_empty());
        assert!(result.best_match().is_none());
        assert_eq!(result, DuplicateCheckResult::none());
    }

    #[test]
    fn same_recipe_from_two_signals_is_kept_once_at_max() {
        let exact = vec![DuplicateMatch::exact_image("r1", "Mojito", 1.0)];
        let similar = vec![DuplicateMatch::similar_image("r1", "Mojito", 0, 1.0)];

        let result = ScoreAggregator::new().merge(vec![exact, similar]);

        assert_eq!(result.matches.len(), 1);
        // Ties keep the first signal that reported the recipe
        assert_eq!(result.matches[0].match_type, MatchType::ExactImage);
    }

    #[test]
    fn higher_confidence_replaces_lower() {
        let similar = vec![DuplicateMatch::similar_image("r1", "Mojito", 12, 0.8125)];
        let recipe = vec![DuplicateMatch::same_recipe("r1", "Mojito", 0.95)];

        let result = ScoreAggregator::new().merge(vec![similar, recipe]);

        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].match_type, MatchType::SameRecipe);
        assert_eq!(result.matches[0].confidence, 0.95);
    }

    #[test]
    fn results_sorted_by_descending_confidence() {
        let similar = vec![
            DuplicateMatch::similar_image("a", "A", 6, 0.90625),
            DuplicateMatch::similar_image("b", "B", 1, 0.984375),
        ];
        let recipe = vec![DuplicateMatch::same_recipe("c", "C", 0.95)];

        let result = ScoreAggregator::new().merge(vec![vec![], similar, recipe]);
        let ids: Vec<&str> = result.matches.iter().map(|m| m.recipe_id.as_str()).collect();

        assert!(result.is_duplicate);
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert_eq!(result.best_match().map(|m| m.recipe_id.as_str()), Some("b"));
    }

    #[test]
    fn result_serializes_like_api_response() {
        let result = ScoreAggregator::new().merge(vec![vec![DuplicateMatch::exact_image("r1", "Negroni", 1.0)]]);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["is_duplicate"], true);
        assert_eq!(json["matches"][0]["match_type"], "exact_image");
        assert_eq!(json["matches"][0]["recipe_name"], "Negroni");
    }
}

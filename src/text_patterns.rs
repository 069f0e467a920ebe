//! Keyword tallies over recommendation and impact text.

use serde::{Deserialize, Serialize};

use crate::models::Evaluation;

/// Keyword lists for the two tallies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordLists {
    /// Words signalling something to work on
    pub improvement: Vec<String>,
    /// Words signalling something to keep doing
    pub continuation: Vec<String>,
}

impl Default for KeywordLists {
    fn default() -> Self {
        let words = |list: &[&str]| list.iter().map(ToString::to_string).collect();
        Self {
            improvement: words(&["improve", "strengthen", "enhance", "focus", "practice", "defer", "deepen"]),
            continuation: words(&["continue", "leverage", "maintain", "keep"]),
        }
    }
}

/// Result of [`tally_keywords`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KeywordTally {
    /// Texts examined
    pub total: usize,
    /// Texts containing at least one improvement keyword
    pub improvement: usize,
    /// Texts containing at least one continuation keyword
    pub continuation: usize,
}

fn contains_any(haystack: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|kw| haystack.contains(&kw.to_lowercase()))
}

/// Count texts matching each list by case-insensitive substring.
///
/// The lists are not exclusive; one text may count toward both.
pub fn tally_keywords<'a>(texts: impl IntoIterator<Item = &'a str>, lists: &KeywordLists) -> KeywordTally {
    texts.into_iter().fold(KeywordTally::default(), |mut tally, text| {
        let lowered = text.to_lowercase();
        tally.total += 1;
        if contains_any(&lowered, &lists.improvement) {
            tally.improvement += 1;
        }
        if contains_any(&lowered, &lists.continuation) {
            tally.continuation += 1;
        }
        tally
    })
}

/// Tally over every evaluation's recommendation text.
#[must_use]
pub fn recommendation_patterns(evaluations: &[Evaluation], lists: &KeywordLists) -> KeywordTally {
    tally_keywords(evaluations.iter().map(|e| e.metadata.recommendation.as_str()), lists)
}

/// Tally over every evaluation's impact text.
#[must_use]
pub fn impact_patterns(evaluations: &[Evaluation], lists: &KeywordLists) -> KeywordTally {
    tally_keywords(evaluations.iter().map(|e| e.metadata.impact.as_str()), lists)
}

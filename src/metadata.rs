//! Parsing of the `scoringMetadata` column.
//!
//! The column holds a JSON object with optional `raw`, `score`, `impact`,
//! `recommendation` and `thinkingWithCitation.citations[].quote` keys.
//! Parsing is fail-soft: one malformed row must not abort a batch, so every
//! failure collapses to [`ScoringMetadata::default`].

use serde::Deserialize;
use serde_json::Value;

use crate::models::{Citation, ScoringMetadata};
use crate::normalize::coerce_score;

#[derive(Debug, Default, Deserialize)]
struct RawMetadata {
    #[serde(default)]
    raw: Option<String>,
    #[serde(default)]
    score: Option<Value>,
    #[serde(default)]
    impact: Option<String>,
    #[serde(default)]
    recommendation: Option<String>,
    #[serde(rename = "thinkingWithCitation", default)]
    thinking_with_citation: Option<RawThinking>,
}

#[derive(Debug, Default, Deserialize)]
struct RawThinking {
    #[serde(default)]
    citations: Option<Vec<RawCitation>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCitation {
    #[serde(default)]
    quote: Option<String>,
}

impl From<RawMetadata> for ScoringMetadata {
    fn from(raw: RawMetadata) -> Self {
        let declared_score = raw.score.and_then(|value| match value {
            Value::Number(n) => coerce_score(n.as_f64()),
            Value::String(s) => coerce_score(s.as_str()),
            _ => None,
        });

        let citations = raw
            .thinking_with_citation
            .and_then(|t| t.citations)
            .unwrap_or_default()
            .into_iter()
            .map(|c| Citation { quote: c.quote.unwrap_or_default() })
            .collect();

        Self {
            raw: raw.raw.unwrap_or_default(),
            declared_score,
            impact: raw.impact.unwrap_or_default(),
            recommendation: raw.recommendation.unwrap_or_default(),
            citations,
        }
    }
}

/// Parse one metadata cell.
///
/// Absent or blank input, invalid JSON, a non-object document or a
/// wrongly-typed known key all yield the empty default record.
#[must_use]
pub fn parse_scoring_metadata(blob: Option<&str>) -> ScoringMetadata {
    let Some(text) = blob.map(str::trim).filter(|t| !t.is_empty()) else {
        return ScoringMetadata::default();
    };

    match serde_json::from_str::<RawMetadata>(text) {
        Ok(raw) => raw.into(),
        Err(e) => {
            tracing::trace!(error = %e, "Unparseable scoring metadata, using defaults");
            ScoringMetadata::default()
        }
    }
}

/// True when the cell carries something but it could not be parsed.
///
/// Used only for data-quality tallies; an absent cell is not malformed.
#[must_use]
pub fn is_malformed(blob: Option<&str>) -> bool {
    blob.map(str::trim)
        .filter(|t| !t.is_empty())
        .is_some_and(|text| serde_json::from_str::<RawMetadata>(text).is_err())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_metadata() {
        let blob = r#"{
            "raw": "model output",
            "score": 4,
            "impact": "Built trust early",
            "recommendation": "Continue asking open questions",
            "thinkingWithCitation": {"citations": [{"quote": "What made you reach out?"}, {"quote": "Tell me more", "ts": 12}]}
        }"#;
        let parsed = parse_scoring_metadata(Some(blob));
        assert_eq!(parsed.raw, "model output");
        assert_eq!(parsed.declared_score, Some(4.0));
        assert_eq!(parsed.impact, "Built trust early");
        assert_eq!(parsed.recommendation, "Continue asking open questions");
        assert_eq!(parsed.citation_count(), 2);
        assert_eq!(parsed.citations[1].quote, "Tell me more");
    }

    #[test]
    fn test_not_json() {
        let parsed = parse_scoring_metadata(Some("not json"));
        assert!(parsed.is_empty());
        assert_eq!(parsed.citation_count(), 0);
        assert!(is_malformed(Some("not json")));
    }

    #[test]
    fn test_absent_is_not_malformed() {
        assert!(parse_scoring_metadata(None).is_empty());
        assert!(parse_scoring_metadata(Some("   ")).is_empty());
        assert!(!is_malformed(None));
        assert!(!is_malformed(Some("")));
    }

    #[test]
    fn test_wrong_types_fall_back_to_defaults() {
        assert!(parse_scoring_metadata(Some("[1, 2, 3]")).is_empty());
        assert!(parse_scoring_metadata(Some("42")).is_empty());
        assert!(parse_scoring_metadata(Some(r#"{"impact": 7}"#)).is_empty());
        assert!(parse_scoring_metadata(Some(r#"{"thinkingWithCitation": "none"}"#)).is_empty());
    }

    #[test]
    fn test_missing_keys_default_individually() {
        let parsed = parse_scoring_metadata(Some(r#"{"recommendation": "Practice discovery", "impact": null}"#));
        assert_eq!(parsed.recommendation, "Practice discovery");
        assert_eq!(parsed.impact, "");
        assert!(parsed.citations.is_empty());
    }

    #[test]
    fn test_citation_without_quote() {
        let parsed = parse_scoring_metadata(Some(r#"{"thinkingWithCitation": {"citations": [{"speaker": "rep"}]}}"#));
        assert_eq!(parsed.citation_count(), 1);
        assert_eq!(parsed.citations[0].quote, "");
    }
}

//! Data models for call recordings and skill evaluations
//!
//! This module contains the raw CSV row shapes, the normalized records the
//! rest of the crate works on, and the typed scoring metadata.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A recording row exactly as it appears in the recordings CSV
///
/// Numeric columns use `csv::invalid_option`, so a blank or non-numeric cell
/// deserializes to `None` instead of failing the whole file.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordingRow {
    /// Unique recording identifier
    #[serde(rename = "recordingid")]
    pub recording_id: String,
    /// Owning user (sales rep) identifier
    #[serde(rename = "userId", default)]
    pub user_id: String,
    /// Creation timestamp, ISO-like text
    #[serde(rename = "dateCreated", default)]
    pub date_created: Option<String>,
    /// Total call duration in milliseconds
    #[serde(rename = "durationInMilliseconds", default, deserialize_with = "csv::invalid_option")]
    pub duration_ms: Option<f64>,
    /// Conversation duration in milliseconds
    #[serde(rename = "conversationTime", default, deserialize_with = "csv::invalid_option")]
    pub conversation_time: Option<f64>,
    /// Time the rep spent speaking, in milliseconds
    #[serde(rename = "repSpeakingTime", default, deserialize_with = "csv::invalid_option")]
    pub rep_speaking_time: Option<f64>,
    /// Words spoken by the rep
    #[serde(rename = "repWordCount", default, deserialize_with = "csv::invalid_option")]
    pub rep_word_count: Option<f64>,
    /// Questions asked by the rep
    #[serde(rename = "repQuestionsCount", default, deserialize_with = "csv::invalid_option")]
    pub rep_questions: Option<f64>,
    /// Questions asked by the customer
    #[serde(rename = "customerQuestionsCount", default, deserialize_with = "csv::invalid_option")]
    pub customer_questions: Option<f64>,
    /// Outcome label (won / lost / anything else)
    #[serde(default)]
    pub outcome: String,
}

/// An evaluation row exactly as it appears in the scoring CSV
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationRow {
    /// Recording this evaluation belongs to
    #[serde(rename = "recordingid")]
    pub recording_id: String,
    /// User identifier as recorded by the scoring system
    #[serde(rename = "userId", default)]
    pub user_id: String,
    /// Evaluation timestamp, ISO-like text
    #[serde(rename = "recordingdate", default)]
    pub recording_date: Option<String>,
    /// Name of the evaluated skill
    #[serde(rename = "skillName", default)]
    pub skill_name: String,
    /// Raw score text, coerced later
    #[serde(default)]
    pub score: Option<String>,
    /// JSON-encoded scoring metadata
    #[serde(rename = "scoringMetadata", default)]
    pub scoring_metadata: Option<String>,
}

/// Categorical result of a sales call
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Outcome {
    /// Deal won
    Won,
    /// Deal lost
    Lost,
    /// Any other label, kept verbatim
    Other(String),
}

impl Outcome {
    /// Parse an outcome label; `won`/`lost` match case-insensitively
    #[must_use]
    pub fn parse(label: &str) -> Self {
        let trimmed = label.trim();
        if trimmed.eq_ignore_ascii_case("won") {
            Self::Won
        } else if trimmed.eq_ignore_ascii_case("lost") {
            Self::Lost
        } else {
            Self::Other(trimmed.to_string())
        }
    }

    /// Label used as a column/group key
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Won => "won",
            Self::Lost => "lost",
            Self::Other(label) => label,
        }
    }

    /// True for won deals
    #[must_use]
    pub const fn is_won(&self) -> bool {
        matches!(self, Self::Won)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw per-call counters used to derive the computed metrics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordingCounts {
    /// Total duration in milliseconds (NaN when missing)
    pub duration_ms: f64,
    /// Conversation duration in milliseconds (NaN when missing)
    pub conversation_time: f64,
    /// Rep speaking time in milliseconds (NaN when missing)
    pub rep_speaking_time: f64,
    /// Rep word count
    pub rep_word_count: f64,
    /// Rep question count
    pub rep_questions: f64,
    /// Customer question count
    pub customer_questions: f64,
}

/// Metrics computed from [`RecordingCounts`]
///
/// `speaking_ratio` is NaN when the conversation time is zero; callers taking
/// means must skip NaN rather than read it as zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedMetrics {
    /// Total duration in minutes
    pub duration_minutes: f64,
    /// Conversation duration in minutes
    pub conversation_time_minutes: f64,
    /// Rep speaking time in minutes
    pub rep_speaking_time_minutes: f64,
    /// Rep speaking time over conversation time
    pub speaking_ratio: f64,
    /// Rep questions over all questions plus one
    pub questions_ratio: f64,
}

/// A normalized sales call recording
#[derive(Debug, Clone)]
pub struct Recording {
    /// Unique recording identifier
    pub recording_id: String,
    /// Owning user identifier
    pub user_id: String,
    /// Creation time, if the timestamp parsed
    pub date_created: Option<NaiveDateTime>,
    /// Raw counters with missing values as NaN
    pub counts: RecordingCounts,
    /// Derived metrics
    pub derived: DerivedMetrics,
    /// Call outcome
    pub outcome: Outcome,
}

impl Recording {
    /// Calendar day the recording was created on
    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        self.date_created.map(|ts| ts.date())
    }
}

/// A quoted transcript excerpt supporting an evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// The quoted text
    pub quote: String,
}

/// Structured view of the `scoringMetadata` JSON blob
///
/// Every field has a default, and a blob that fails to parse produces the
/// all-default record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoringMetadata {
    /// Raw model output text
    pub raw: String,
    /// Score stated inside the metadata, when present and numeric
    pub declared_score: Option<f64>,
    /// Free-text impact description
    pub impact: String,
    /// Free-text coaching recommendation
    pub recommendation: String,
    /// Supporting citations, in order
    pub citations: Vec<Citation>,
}

impl ScoringMetadata {
    /// Number of citations attached to the evaluation
    #[must_use]
    pub fn citation_count(&self) -> usize {
        self.citations.len()
    }

    /// True when nothing could be extracted
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// A normalized skill evaluation
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Recording this evaluation belongs to
    pub recording_id: String,
    /// User identifier from the scoring system
    pub user_id: String,
    /// Evaluation time, if the timestamp parsed
    pub recording_date: Option<NaiveDateTime>,
    /// Evaluated skill
    pub skill_name: String,
    /// Coerced score in [1, 5], or `None` when missing/non-numeric
    pub score: Option<f64>,
    /// Parsed scoring metadata
    pub metadata: ScoringMetadata,
}

impl Evaluation {
    /// Calendar day of the evaluation
    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        self.recording_date.map(|ts| ts.date())
    }
}

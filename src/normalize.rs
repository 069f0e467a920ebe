//! Field normalization: unit conversion, derived ratios, score coercion
//! and timestamp parsing.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::models::{DerivedMetrics, RecordingCounts};

/// Milliseconds per minute
pub const MS_PER_MINUTE: f64 = 60_000.0;

/// Lowest valid skill score
pub const MIN_SCORE: f64 = 1.0;
/// Highest valid skill score
pub const MAX_SCORE: f64 = 5.0;

/// Anything a score can arrive as.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreInput<'a> {
    /// Text straight from a CSV cell
    Text(&'a str),
    /// An already numeric value
    Number(f64),
    /// No value at all
    Missing,
}

impl<'a> From<&'a str> for ScoreInput<'a> {
    fn from(s: &'a str) -> Self {
        Self::Text(s)
    }
}

impl<'a> From<Option<&'a str>> for ScoreInput<'a> {
    fn from(s: Option<&'a str>) -> Self {
        s.map_or(Self::Missing, Self::Text)
    }
}

impl From<f64> for ScoreInput<'_> {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<Option<f64>> for ScoreInput<'_> {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Self::Missing, Self::Number)
    }
}

/// Coerce a raw score to a number in `[MIN_SCORE, MAX_SCORE]`.
///
/// Non-numeric text, non-finite numbers and out-of-range values become
/// `None` (missing), never zero. Applying it to its own output is a no-op.
#[must_use]
pub fn coerce_score<'a>(input: impl Into<ScoreInput<'a>>) -> Option<f64> {
    let value = match input.into() {
        ScoreInput::Text(text) => text.trim().parse::<f64>().ok()?,
        ScoreInput::Number(v) => v,
        ScoreInput::Missing => return None,
    };

    (value.is_finite() && (MIN_SCORE..=MAX_SCORE).contains(&value)).then_some(value)
}

/// Missing or negative durations become NaN.
#[must_use]
pub fn coerce_duration(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v >= 0.0 => v,
        _ => f64::NAN,
    }
}

/// Missing counts become NaN.
#[must_use]
pub fn coerce_count(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(f64::NAN)
}

/// Compute the derived per-call metrics.
///
/// Divisions are exact. `speaking_ratio` is NaN when the conversation time
/// is zero. `questions_ratio` adds one to the denominator so it is defined
/// for every pair of valid counts; low-volume calls skew toward zero.
#[must_use]
pub fn derive_metrics(counts: &RecordingCounts) -> DerivedMetrics {
    let speaking_ratio = if counts.conversation_time == 0.0 {
        f64::NAN
    } else {
        counts.rep_speaking_time / counts.conversation_time
    };

    DerivedMetrics {
        duration_minutes: counts.duration_ms / MS_PER_MINUTE,
        conversation_time_minutes: counts.conversation_time / MS_PER_MINUTE,
        rep_speaking_time_minutes: counts.rep_speaking_time / MS_PER_MINUTE,
        speaking_ratio,
        questions_ratio: counts.rep_questions
            / (counts.rep_questions + counts.customer_questions + 1.0),
    }
}

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse an ISO-like timestamp.
///
/// Offsets are dropped after parsing, keeping the wall-clock time the
/// source stated, so the calendar day matches the source's own day.
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.naive_local());
    }
    if let Some(dt) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    {
        return Some(dt);
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

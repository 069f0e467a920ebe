//! Inner join of recordings and evaluations on the recording identifier.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::models::{Evaluation, Outcome, Recording};

/// One (recording, evaluation) pair produced by [`merge`].
///
/// Both sources carry a user identifier; the accessors are tagged with the
/// source instead of picking one.
#[derive(Debug, Clone, Copy)]
pub struct MergedRecord<'a> {
    /// Recording side of the pair
    pub recording: &'a Recording,
    /// Evaluation side of the pair
    pub evaluation: &'a Evaluation,
}

impl<'a> MergedRecord<'a> {
    /// Join key
    #[must_use]
    pub fn recording_id(&self) -> &'a str {
        &self.recording.recording_id
    }

    /// `userId` from the recordings dataset
    #[must_use]
    pub fn user_id_recording(&self) -> &'a str {
        &self.recording.user_id
    }

    /// `userId` from the evaluations dataset
    #[must_use]
    pub fn user_id_scoring(&self) -> &'a str {
        &self.evaluation.user_id
    }

    /// Evaluated skill
    #[must_use]
    pub fn skill_name(&self) -> &'a str {
        &self.evaluation.skill_name
    }

    /// Coerced score
    #[must_use]
    pub fn score(&self) -> Option<f64> {
        self.evaluation.score
    }

    /// Outcome of the call
    #[must_use]
    pub fn outcome(&self) -> &'a Outcome {
        &self.recording.outcome
    }

    /// Calendar day of the evaluation timestamp
    #[must_use]
    pub fn evaluation_date(&self) -> Option<NaiveDate> {
        self.evaluation.date()
    }

    /// Recommendation text from the scoring metadata
    #[must_use]
    pub fn recommendation(&self) -> &'a str {
        &self.evaluation.metadata.recommendation
    }

    /// Impact text from the scoring metadata
    #[must_use]
    pub fn impact(&self) -> &'a str {
        &self.evaluation.metadata.impact
    }
}

/// Counts describing how much of each side found a partner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JoinStats {
    /// Rows produced
    pub merged_rows: usize,
    /// Recordings with no evaluation
    pub unmatched_recordings: usize,
    /// Evaluations with no recording
    pub unmatched_evaluations: usize,
}

/// Inner-join recordings and evaluations on `recording_id`.
///
/// Output order follows the recordings, then evaluation order within each
/// recording. Duplicate ids fan out to every matching pair; unmatched rows on
/// either side are dropped.
#[must_use]
pub fn merge<'a>(recordings: &'a [Recording], evaluations: &'a [Evaluation]) -> Vec<MergedRecord<'a>> {
    let mut by_recording: HashMap<&str, Vec<&Evaluation>> = HashMap::new();
    for evaluation in evaluations {
        by_recording
            .entry(evaluation.recording_id.as_str())
            .or_default()
            .push(evaluation);
    }

    recordings
        .iter()
        .flat_map(|recording| {
            by_recording
                .get(recording.recording_id.as_str())
                .into_iter()
                .flatten()
                .copied()
                .map(move |evaluation| MergedRecord { recording, evaluation })
        })
        .collect()
}

/// Describe the join of `recordings` and `evaluations` without materializing it.
#[must_use]
pub fn join_stats(recordings: &[Recording], evaluations: &[Evaluation]) -> JoinStats {
    let recording_ids: HashSet<&str> = recordings.iter().map(|r| r.recording_id.as_str()).collect();
    let mut evaluation_counts: HashMap<&str, usize> = HashMap::new();
    for evaluation in evaluations {
        *evaluation_counts.entry(evaluation.recording_id.as_str()).or_default() += 1;
    }

    let merged_rows = recordings
        .iter()
        .map(|r| evaluation_counts.get(r.recording_id.as_str()).copied().unwrap_or(0))
        .sum();

    JoinStats {
        merged_rows,
        unmatched_recordings: recordings
            .iter()
            .filter(|r| !evaluation_counts.contains_key(r.recording_id.as_str()))
            .count(),
        unmatched_evaluations: evaluations
            .iter()
            .filter(|e| !recording_ids.contains(e.recording_id.as_str()))
            .count(),
    }
}

/// Flat, serializable form of a merged record.
#[derive(Debug, Clone, Serialize)]
pub struct MergedRow<'a> {
    /// Join key
    #[serde(rename = "recordingid")]
    pub recording_id: &'a str,
    /// User id from the recordings side
    #[serde(rename = "userId_recording")]
    pub user_id_recording: &'a str,
    /// User id from the evaluations side
    #[serde(rename = "userId_scoring")]
    pub user_id_scoring: &'a str,
    /// Recording creation time
    #[serde(rename = "dateCreated")]
    pub date_created: Option<NaiveDateTime>,
    /// Evaluation time
    #[serde(rename = "recordingdate")]
    pub recording_date: Option<NaiveDateTime>,
    /// Call outcome
    pub outcome: &'a str,
    /// Duration in minutes
    pub duration_minutes: f64,
    /// Rep speaking ratio
    pub speaking_ratio: f64,
    /// Rep questions ratio
    pub questions_ratio: f64,
    /// Skill name
    #[serde(rename = "skillName")]
    pub skill_name: &'a str,
    /// Coerced score
    pub score: Option<f64>,
    /// Impact text
    pub impact_text: &'a str,
    /// Recommendation text
    pub recommendation_text: &'a str,
    /// Number of citations
    pub num_citations: usize,
}

impl<'a> From<&MergedRecord<'a>> for MergedRow<'a> {
    fn from(m: &MergedRecord<'a>) -> Self {
        Self {
            recording_id: m.recording_id(),
            user_id_recording: m.user_id_recording(),
            user_id_scoring: m.user_id_scoring(),
            date_created: m.recording.date_created,
            recording_date: m.evaluation.recording_date,
            outcome: m.outcome().label(),
            duration_minutes: m.recording.derived.duration_minutes,
            speaking_ratio: m.recording.derived.speaking_ratio,
            questions_ratio: m.recording.derived.questions_ratio,
            skill_name: m.skill_name(),
            score: m.score(),
            impact_text: m.impact(),
            recommendation_text: m.recommendation(),
            num_citations: m.evaluation.metadata.citation_count(),
        }
    }
}

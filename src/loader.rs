//! CSV loading for the recordings and evaluations datasets.
//!
//! Loading reads a file fully into memory, deserializes each row with
//! `csv` + `serde`, and normalizes it. A missing file or a CSV whose header
//! cannot be read is fatal. Short rows get their trailing cells defaulted,
//! malformed cells are coerced, and rows that still fail are skipped and
//! tallied.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{AnalyticsError, Result};
use crate::metadata::{is_malformed, parse_scoring_metadata};
use crate::models::{Evaluation, EvaluationRow, Outcome, Recording, RecordingCounts, RecordingRow};
use crate::normalize::{coerce_count, coerce_duration, coerce_score, derive_metrics, parse_timestamp};

/// Per-load tally of values that had to be coerced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadTally {
    /// Rows read
    pub rows: usize,
    /// Rows whose timestamp did not parse
    pub bad_timestamps: usize,
    /// Evaluation rows with a missing or non-numeric score
    pub missing_scores: usize,
    /// Evaluation rows whose metadata was present but unparseable
    pub malformed_metadata: usize,
    /// Rows that could not be deserialized and were dropped
    pub skipped_rows: usize,
}

/// Deserialize every readable row, tallying the ones that are not.
///
/// The reader is flexible, so a short row is padded with defaults rather
/// than rejected. I/O errors and an unreadable header are still fatal.
fn deserialize_rows<R: Read, T: DeserializeOwned>(reader: R, tally: &mut LoadTally) -> Result<Vec<T>> {
    let mut csv_reader = ReaderBuilder::new().flexible(true).from_reader(reader);
    csv_reader.headers()?;

    let mut rows = Vec::new();
    for row in csv_reader.deserialize::<T>() {
        match row {
            Ok(row) => rows.push(row),
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => return Err(e.into()),
            Err(e) => {
                debug!(error = %e, "Skipping unreadable CSV row");
                tally.skipped_rows += 1;
            }
        }
    }
    Ok(rows)
}

/// Normalize one recording row.
#[must_use]
pub fn normalize_recording(row: RecordingRow) -> Recording {
    let counts = RecordingCounts {
        duration_ms: coerce_duration(row.duration_ms),
        conversation_time: coerce_duration(row.conversation_time),
        rep_speaking_time: coerce_duration(row.rep_speaking_time),
        rep_word_count: coerce_count(row.rep_word_count),
        rep_questions: coerce_count(row.rep_questions),
        customer_questions: coerce_count(row.customer_questions),
    };

    Recording {
        recording_id: row.recording_id.trim().to_string(),
        user_id: row.user_id.trim().to_string(),
        date_created: row.date_created.as_deref().and_then(parse_timestamp),
        derived: derive_metrics(&counts),
        counts,
        outcome: Outcome::parse(&row.outcome),
    }
}

/// Normalize one evaluation row.
#[must_use]
pub fn normalize_evaluation(row: EvaluationRow) -> Evaluation {
    Evaluation {
        recording_id: row.recording_id.trim().to_string(),
        user_id: row.user_id.trim().to_string(),
        recording_date: row.recording_date.as_deref().and_then(parse_timestamp),
        skill_name: row.skill_name.trim().to_string(),
        score: coerce_score(row.score.as_deref()),
        metadata: parse_scoring_metadata(row.scoring_metadata.as_deref()),
    }
}

/// Read recordings from any CSV source with a header row.
pub fn read_recordings<R: Read>(reader: R) -> Result<(Vec<Recording>, LoadTally)> {
    let mut tally = LoadTally::default();
    let rows: Vec<RecordingRow> = deserialize_rows(reader, &mut tally)?;
    let mut recordings = Vec::with_capacity(rows.len());

    for row in rows {
        let had_timestamp = row.date_created.as_deref().is_some_and(|s| !s.trim().is_empty());
        let recording = normalize_recording(row);
        if had_timestamp && recording.date_created.is_none() {
            tally.bad_timestamps += 1;
        }
        recordings.push(recording);
    }

    tally.rows = recordings.len();
    Ok((recordings, tally))
}

/// Read evaluations from any CSV source with a header row.
pub fn read_evaluations<R: Read>(reader: R) -> Result<(Vec<Evaluation>, LoadTally)> {
    let mut tally = LoadTally::default();
    let rows: Vec<EvaluationRow> = deserialize_rows(reader, &mut tally)?;
    let mut evaluations = Vec::with_capacity(rows.len());

    for row in rows {
        if is_malformed(row.scoring_metadata.as_deref()) {
            tally.malformed_metadata += 1;
        }
        let had_timestamp = row.recording_date.as_deref().is_some_and(|s| !s.trim().is_empty());
        let evaluation = normalize_evaluation(row);
        if had_timestamp && evaluation.recording_date.is_none() {
            tally.bad_timestamps += 1;
        }
        if evaluation.score.is_none() {
            tally.missing_scores += 1;
        }
        evaluations.push(evaluation);
    }

    tally.rows = evaluations.len();
    Ok((evaluations, tally))
}

fn open_input(path: &Path) -> Result<File> {
    if !path.is_file() {
        return Err(AnalyticsError::InputNotFound(path.to_path_buf()));
    }
    Ok(File::open(path)?)
}

/// Load the recordings CSV at `path`.
pub fn load_recordings(path: &Path) -> Result<(Vec<Recording>, LoadTally)> {
    debug!("Loading recordings from {}", path.display());
    let (recordings, tally) = read_recordings(open_input(path)?)?;
    if tally.skipped_rows > 0 {
        warn!(count = tally.skipped_rows, "Skipped unreadable recording rows");
    }
    if tally.bad_timestamps > 0 {
        warn!(count = tally.bad_timestamps, "Recordings with unparseable dateCreated");
    }
    Ok((recordings, tally))
}

/// Load the evaluations CSV at `path`.
pub fn load_evaluations(path: &Path) -> Result<(Vec<Evaluation>, LoadTally)> {
    debug!("Loading evaluations from {}", path.display());
    let (evaluations, tally) = read_evaluations(open_input(path)?)?;
    if tally.skipped_rows > 0 {
        warn!(count = tally.skipped_rows, "Skipped unreadable evaluation rows");
    }
    if tally.malformed_metadata > 0 {
        warn!(count = tally.malformed_metadata, "Evaluations with malformed scoringMetadata");
    }
    if tally.bad_timestamps > 0 {
        warn!(count = tally.bad_timestamps, "Evaluations with unparseable recordingdate");
    }
    Ok((evaluations, tally))
}

//! Tests for CSV loading and normalization

mod common;

use std::fs;

use common::{DISCOVER, EVALUATIONS_CSV, RECORDINGS_CSV};
use sales_call_insights::loader::{load_evaluations, load_recordings, read_evaluations, read_recordings};
use sales_call_insights::{AnalyticsError, Outcome};
use tempfile::tempdir;

#[test]
fn test_recordings_are_normalized() {
    let (recordings, tally) = read_recordings(RECORDINGS_CSV.as_bytes()).unwrap();
    assert_eq!(tally.rows, 5);
    assert_eq!(tally.bad_timestamps, 0);

    let r1 = &recordings[0];
    assert_eq!(r1.recording_id, "r1");
    assert_eq!(r1.outcome, Outcome::Won);
    assert!((r1.derived.duration_minutes - 10.0).abs() < 1e-12);
    assert!((r1.derived.speaking_ratio - 0.5).abs() < 1e-12);
    assert!((r1.derived.questions_ratio - 10.0 / 15.0).abs() < 1e-12);
    assert_eq!(r1.date().unwrap().to_string(), "2025-08-06");
}

#[test]
fn test_zero_conversation_time_gives_nan_ratio() {
    let (recordings, _) = read_recordings(RECORDINGS_CSV.as_bytes()).unwrap();
    assert!(recordings[1].derived.speaking_ratio.is_nan());
}

#[test]
fn test_negative_duration_is_nan() {
    let (recordings, _) = read_recordings(RECORDINGS_CSV.as_bytes()).unwrap();
    assert!(recordings[4].counts.duration_ms.is_nan());
    assert!(recordings[4].derived.duration_minutes.is_nan());
}

#[test]
fn test_evaluation_tallies() {
    let (evaluations, tally) = read_evaluations(EVALUATIONS_CSV.as_bytes()).unwrap();
    assert_eq!(tally.rows, 7);
    assert_eq!(tally.malformed_metadata, 1);
    assert_eq!(tally.missing_scores, 1);
    assert_eq!(evaluations[1].skill_name, DISCOVER);
}

#[test]
fn test_malformed_metadata_row_is_retained() {
    let (evaluations, _) = read_evaluations(EVALUATIONS_CSV.as_bytes()).unwrap();
    let r2 = evaluations.iter().find(|e| e.recording_id == "r2").unwrap();
    assert_eq!(r2.score, Some(2.0));
    assert_eq!(r2.metadata.impact, "");
    assert_eq!(r2.metadata.recommendation, "");
    assert_eq!(r2.metadata.citation_count(), 0);
}

#[test]
fn test_non_numeric_score_is_missing() {
    let (evaluations, _) = read_evaluations(EVALUATIONS_CSV.as_bytes()).unwrap();
    let closing = evaluations.iter().find(|e| e.skill_name == "Closing").unwrap();
    assert_eq!(closing.score, None);
    assert!(closing.metadata.is_empty());
}

#[test]
fn test_unparseable_timestamp_is_tallied() {
    let csv = "\
recordingid,userId,dateCreated,durationInMilliseconds,conversationTime,repSpeakingTime,repWordCount,repQuestionsCount,customerQuestionsCount,outcome
r1,u1,yesterday,1000,1000,500,10,1,1,won
r2,u1,,1000,1000,500,10,1,1,lost
";
    let (recordings, tally) = read_recordings(csv.as_bytes()).unwrap();
    assert_eq!(tally.bad_timestamps, 1);
    assert!(recordings[0].date_created.is_none());
    assert!(recordings[1].date_created.is_none());
}

#[test]
fn test_extra_columns_are_ignored() {
    let csv = "\
recordingid,userId,dateCreated,durationInMilliseconds,conversationTime,repSpeakingTime,repWordCount,repQuestionsCount,customerQuestionsCount,outcome,teamName
r1,u1,2025-08-01 12:00:00,60000,60000,30000,10,1,1,won,east
";
    let (recordings, _) = read_recordings(csv.as_bytes()).unwrap();
    assert_eq!(recordings.len(), 1);
    assert!((recordings[0].derived.duration_minutes - 1.0).abs() < 1e-12);
}

#[test]
fn test_load_from_files() {
    let dir = tempdir().unwrap();
    let recordings_path = dir.path().join("recordings.csv");
    let evaluations_path = dir.path().join("evaluations.csv");
    fs::write(&recordings_path, RECORDINGS_CSV).unwrap();
    fs::write(&evaluations_path, EVALUATIONS_CSV).unwrap();

    let (recordings, _) = load_recordings(&recordings_path).unwrap();
    let (evaluations, _) = load_evaluations(&evaluations_path).unwrap();
    assert_eq!(recordings.len(), 5);
    assert_eq!(evaluations.len(), 7);
}

#[test]
fn test_missing_file_is_fatal() {
    let dir = tempdir().unwrap();
    let err = load_recordings(&dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, AnalyticsError::InputNotFound(_)));
}

#[test]
fn test_short_recording_row_is_padded() {
    let csv = "\
recordingid,userId,dateCreated,durationInMilliseconds,conversationTime,repSpeakingTime,repWordCount,repQuestionsCount,customerQuestionsCount,outcome
r1,u1,2025-08-06,60000,60000,30000,100,1,1,won
r2,u1,2025-08-07,1000,1000,500,10,1,1
";
    let (recordings, tally) = read_recordings(csv.as_bytes()).unwrap();
    assert_eq!(recordings.len(), 2);
    assert_eq!(tally.skipped_rows, 0);
    assert_eq!(recordings[1].recording_id, "r2");
    assert!(!recordings[1].outcome.is_won());
    assert!((recordings[1].derived.speaking_ratio - 0.5).abs() < 1e-12);
}

#[test]
fn test_evaluation_row_without_metadata_cell() {
    let csv = "\
recordingid,userId,recordingdate,skillName,score,scoringMetadata
r1,u1,2025-08-06,Rapport,4,
r2,u1,2025-08-07,Rapport,3
r3,u1,2025-08-08
";
    let (evaluations, tally) = read_evaluations(csv.as_bytes()).unwrap();
    assert_eq!(evaluations.len(), 3);
    assert_eq!(tally.skipped_rows, 0);
    assert_eq!(tally.malformed_metadata, 0);
    assert_eq!(evaluations[1].score, Some(3.0));
    assert!(evaluations[1].metadata.is_empty());
    assert_eq!(evaluations[2].score, None);
    assert_eq!(tally.missing_scores, 1);
}

#[test]
fn test_undecodable_row_is_skipped_and_tallied() {
    let mut bytes = b"recordingid,userId,dateCreated,durationInMilliseconds,conversationTime,repSpeakingTime,repWordCount,repQuestionsCount,customerQuestionsCount,outcome\n\
r1,u1,2025-08-06,60000,60000,30000,100,1,1,won\n"
        .to_vec();
    bytes.extend_from_slice(b"r2,\xff\xfe,2025-08-07,1000,1000,500,10,1,1,lost\n");
    bytes.extend_from_slice(b"r3,u2,2025-08-08,1000,1000,500,10,1,1,lost\n");

    let (recordings, tally) = read_recordings(bytes.as_slice()).unwrap();
    let ids: Vec<&str> = recordings.iter().map(|r| r.recording_id.as_str()).collect();
    assert_eq!(ids, vec!["r1", "r3"]);
    assert_eq!(tally.skipped_rows, 1);
    assert_eq!(tally.rows, 2);
}

#[test]
fn test_csv_error_message_is_not_doubled() {
    let csv_error = csv::Reader::from_reader("a,b\n1\n".as_bytes())
        .records()
        .next()
        .unwrap()
        .unwrap_err();
    let expected = csv_error.to_string();
    assert_eq!(AnalyticsError::from(csv_error).to_string(), expected);
}

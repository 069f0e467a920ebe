//! Comprehensive unit tests for validation.rs module

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use sales_call_insights::temporal::PeriodWindow;
use sales_call_insights::validation::InputValidator;
use tempfile::tempdir;

fn window(early: (i32, u32, u32), late: (i32, u32, u32)) -> PeriodWindow {
    PeriodWindow {
        early_end: NaiveDate::from_ymd_opt(early.0, early.1, early.2).unwrap(),
        late_start: NaiveDate::from_ymd_opt(late.0, late.1, late.2).unwrap(),
    }
}

#[test]
fn test_validate_input_file_exists() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("recordings.csv");
    fs::write(&path, "recordingid\n").unwrap();
    assert!(InputValidator::validate_input_file(&path).is_ok());
}

#[test]
fn test_validate_input_file_other_extension_is_allowed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("recordings.txt");
    fs::write(&path, "recordingid\n").unwrap();
    assert!(InputValidator::validate_input_file(&path).is_ok());
}

#[test]
fn test_validate_input_file_missing() {
    let dir = tempdir().unwrap();
    assert!(InputValidator::validate_input_file(&dir.path().join("absent.csv")).is_err());
}

#[test]
fn test_validate_input_file_directory() {
    let dir = tempdir().unwrap();
    assert!(InputValidator::validate_input_file(dir.path()).is_err());
}

#[test]
fn test_validate_input_file_empty_path() {
    assert!(InputValidator::validate_input_file(Path::new("")).is_err());
}

#[test]
fn test_validate_output_dir() {
    let dir = tempdir().unwrap();
    assert!(InputValidator::validate_output_dir(dir.path()).is_ok());
    assert!(InputValidator::validate_output_dir(&dir.path().join("not-yet-created")).is_ok());
    assert!(InputValidator::validate_output_dir(Path::new("")).is_err());
}

#[test]
fn test_validate_output_dir_is_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("file.csv");
    fs::write(&path, "x").unwrap();
    assert!(InputValidator::validate_output_dir(&path).is_err());
}

#[test]
fn test_validate_output_dir_too_long() {
    let long_path = "a".repeat(4097);
    assert!(InputValidator::validate_output_dir(Path::new(&long_path)).is_err());
}

#[test]
fn test_validate_period_window() {
    assert!(InputValidator::validate_period_window(&window((2025, 8, 15), (2025, 9, 15))).is_ok());
    assert!(InputValidator::validate_period_window(&window((2025, 9, 15), (2025, 9, 15))).is_err());
    assert!(InputValidator::validate_period_window(&window((2025, 10, 1), (2025, 9, 15))).is_err());
}

#[test]
fn test_validate_period_window_wide_gap_is_allowed() {
    assert!(InputValidator::validate_period_window(&window((2020, 1, 1), (2025, 1, 1))).is_ok());
}

#[test]
fn test_validate_score_thresholds() {
    assert!(InputValidator::validate_score_thresholds(2.0, 4.0).is_ok());
    assert!(InputValidator::validate_score_thresholds(1.0, 5.0).is_ok());
    assert!(InputValidator::validate_score_thresholds(4.0, 4.0).is_err());
    assert!(InputValidator::validate_score_thresholds(4.0, 2.0).is_err());
    assert!(InputValidator::validate_score_thresholds(0.0, 4.0).is_err());
    assert!(InputValidator::validate_score_thresholds(2.0, 6.0).is_err());
    assert!(InputValidator::validate_score_thresholds(f64::NAN, 4.0).is_err());
}

#[test]
fn test_validate_model_name() {
    assert!(InputValidator::validate_model_name("gpt-3.5-turbo").is_ok());
    assert!(InputValidator::validate_model_name("org/model:latest").is_ok());
    assert!(InputValidator::validate_model_name("").is_err());
    assert!(InputValidator::validate_model_name("   ").is_err());
    assert!(InputValidator::validate_model_name("gpt 4").is_err());
    assert!(InputValidator::validate_model_name(&"m".repeat(101)).is_err());
}

#[test]
fn test_validate_api_key() {
    assert!(InputValidator::validate_api_key("sk-test123").is_ok());
    assert!(InputValidator::validate_api_key("").is_err());
    assert!(InputValidator::validate_api_key("   ").is_err());
    assert!(InputValidator::validate_api_key("sk-test 123").is_err());
    assert!(InputValidator::validate_api_key("sk-test\n").is_err());
}

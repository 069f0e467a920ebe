use anyhow::{anyhow, Result};
use std::path::Path;

use crate::normalize::{MAX_SCORE, MIN_SCORE};
use crate::temporal::PeriodWindow;

/// Validation utilities for inputs and settings
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate an input CSV path
    pub fn validate_input_file(path: &Path) -> Result<()> {
        if path.as_os_str().is_empty() {
            return Err(anyhow!("Input path cannot be empty"));
        }

        if !path.exists() {
            return Err(anyhow!("Input file does not exist: {path:?}"));
        }

        if !path.is_file() {
            return Err(anyhow!("Input path is not a file: {path:?}"));
        }

        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            tracing::warn!(path = %path.display(), "Input file does not have a .csv extension");
        }

        Ok(())
    }

    /// Validate output directory path
    pub fn validate_output_dir(path: &Path) -> Result<()> {
        if path.as_os_str().is_empty() {
            return Err(anyhow!("Output directory cannot be empty"));
        }

        if path.is_file() {
            return Err(anyhow!("Output path is an existing file: {path:?}"));
        }

        let path_str = path.to_string_lossy();
        if path_str.len() > 4096 {
            return Err(anyhow!("Output path too long (max 4096 characters)"));
        }

        Ok(())
    }

    /// Validate the early/late period cutoffs
    pub fn validate_period_window(window: &PeriodWindow) -> Result<()> {
        if window.early_end >= window.late_start {
            return Err(anyhow!(
                "Early period must end before the late period starts ({} >= {})",
                window.early_end,
                window.late_start
            ));
        }

        let gap = (window.late_start - window.early_end).num_days();
        if gap > 365 {
            tracing::warn!(gap_days = gap, "Early and late periods are more than a year apart");
        }

        Ok(())
    }

    /// Validate high/low score thresholds
    pub fn validate_score_thresholds(low: f64, high: f64) -> Result<()> {
        for (name, value) in [("low", low), ("high", high)] {
            if !value.is_finite() || !(MIN_SCORE..=MAX_SCORE).contains(&value) {
                return Err(anyhow!(
                    "{name} score threshold must be within {MIN_SCORE}..={MAX_SCORE}, got {value}"
                ));
            }
        }

        if low >= high {
            return Err(anyhow!("Low score threshold must be below the high threshold"));
        }

        Ok(())
    }

    /// Validate a completion model name
    pub fn validate_model_name(model: &str) -> Result<()> {
        if model.trim().is_empty() {
            return Err(anyhow!("Model name cannot be empty"));
        }

        if model.len() > 100 {
            return Err(anyhow!("Model name too long (max 100 characters)"));
        }

        if !model
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' || c == ':' || c == '/')
        {
            return Err(anyhow!("Model name contains invalid characters"));
        }

        Ok(())
    }

    /// Validate an API key read from the environment
    pub fn validate_api_key(key: &str) -> Result<()> {
        if key.trim().is_empty() {
            return Err(anyhow!("API key cannot be empty"));
        }

        if key.chars().any(char::is_whitespace) {
            return Err(anyhow!("API key contains whitespace"));
        }

        Ok(())
    }
}

//! Error types for the sales-call-insights library.
//!
//! Per-row data problems never become errors; they are absorbed where they
//! occur and counted in [`crate::pipeline::DataQuality`]. What remains here is
//! the small set of conditions that stop a run.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, analysing or exporting call data.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// An input dataset path does not exist or is not a file
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// CSV reading or writing failed
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Required credential missing from the environment
    #[error("Missing credential: environment variable {0} is not set")]
    MissingCredential(String),

    /// Transport-level failure talking to the completion API
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The completion API answered, but not with something usable
    #[error("Completion API error: {0}")]
    Llm(String),

    /// General error with context
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Result with AnalyticsError
pub type Result<T> = std::result::Result<T, AnalyticsError>;

impl From<anyhow::Error> for AnalyticsError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

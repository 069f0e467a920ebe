//! Sales Call Insights - skill scores versus call outcomes
//!
//! A Rust library for joining sales-call recordings with per-skill
//! evaluations and measuring how skill scores relate to deal outcomes.
//!
//! # Features
//!
//! - Fail-soft CSV loading with data-quality tallies
//! - Skill, outcome, user and period aggregations
//! - Skill correlation matrix and keyword tallies
//! - Chart data export (CSV or JSON)
//! - Optional LLM summaries with cost tracking

/// Grouped statistics
pub mod aggregate;
/// Configuration management
pub mod config;
/// Skill correlations
pub mod correlation;
/// Error types
pub mod error;
/// Table and JSON export
pub mod file_writer;
/// LLM analyses and results
pub mod insights;
/// Completion client and cost tracking
pub mod llm;
/// CSV loading
pub mod loader;
/// Logging setup and utilities
pub mod logging;
/// Recording/evaluation join
pub mod merge;
/// Scoring metadata parsing
pub mod metadata;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Field coercion and derived metrics
pub mod normalize;
/// Load, merge and aggregate in one pass
pub mod pipeline;
/// LLM prompt construction
pub mod prompts;
/// Plain-text reports
pub mod report;
/// NaN-aware descriptive statistics
pub mod stats;
/// Daily and period comparisons
pub mod temporal;
/// Keyword tallies
pub mod text_patterns;
/// Text helpers
pub mod utils;
/// Input validation
pub mod validation;

// Re-export key components for easier access
pub use error::{AnalyticsError, Result};
pub use merge::{merge, MergedRecord};
pub use models::{Evaluation, Outcome, Recording};
pub use pipeline::{AnalysisReport, Datasets};

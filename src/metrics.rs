use anyhow::Result;
use metrics::{counter, gauge, histogram};
use std::time::Duration;

use crate::loader::LoadTally;
use crate::merge::JoinStats;

/// Metric names used across the pipeline
pub struct MetricsCollector {
    // Ingestion
    pub rows_loaded_total: &'static str,
    pub bad_timestamps_total: &'static str,
    pub missing_scores_total: &'static str,
    pub malformed_metadata_total: &'static str,
    pub skipped_rows_total: &'static str,
    pub load_duration: &'static str,

    // Join
    pub merged_rows: &'static str,
    pub unmatched_rows: &'static str,

    // LLM
    pub llm_requests_total: &'static str,
    pub llm_request_duration: &'static str,
    pub llm_tokens_total: &'static str,
    pub llm_cost_dollars: &'static str,

    // Export
    pub export_files_created_total: &'static str,
    pub export_duration: &'static str,

    // Errors
    pub errors_total: &'static str,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            rows_loaded_total: "call_insights_rows_loaded_total",
            bad_timestamps_total: "call_insights_bad_timestamps_total",
            missing_scores_total: "call_insights_missing_scores_total",
            malformed_metadata_total: "call_insights_malformed_metadata_total",
            skipped_rows_total: "call_insights_skipped_rows_total",
            load_duration: "call_insights_load_duration_seconds",

            merged_rows: "call_insights_merged_rows",
            unmatched_rows: "call_insights_unmatched_rows",

            llm_requests_total: "call_insights_llm_requests_total",
            llm_request_duration: "call_insights_llm_request_duration_seconds",
            llm_tokens_total: "call_insights_llm_tokens_total",
            llm_cost_dollars: "call_insights_llm_cost_dollars",

            export_files_created_total: "call_insights_export_files_created_total",
            export_duration: "call_insights_export_duration_seconds",

            errors_total: "call_insights_errors_total",
        }
    }
}

impl MetricsCollector {
    /// Initialize metrics collection
    pub fn init() -> Result<()> {
        metrics::set_global_recorder(metrics::NoopRecorder)
            .map_err(|e| anyhow::anyhow!("Failed to initialize metrics recorder: {}", e))?;

        Ok(())
    }

    /// Record one dataset load
    pub fn record_load(&self, dataset: &'static str, tally: &LoadTally, duration: Duration) {
        counter!(self.rows_loaded_total, "dataset" => dataset).increment(tally.rows as u64);
        counter!(self.bad_timestamps_total, "dataset" => dataset).increment(tally.bad_timestamps as u64);
        counter!(self.missing_scores_total, "dataset" => dataset).increment(tally.missing_scores as u64);
        counter!(self.malformed_metadata_total, "dataset" => dataset)
            .increment(tally.malformed_metadata as u64);
        counter!(self.skipped_rows_total, "dataset" => dataset).increment(tally.skipped_rows as u64);
        histogram!(self.load_duration, "dataset" => dataset).record(duration.as_secs_f64());
    }

    /// Record the shape of the recordings/evaluations join
    pub fn record_join(&self, stats: &JoinStats) {
        gauge!(self.merged_rows).set(stats.merged_rows as f64);
        gauge!(self.unmatched_rows, "side" => "recordings").set(stats.unmatched_recordings as f64);
        gauge!(self.unmatched_rows, "side" => "evaluations").set(stats.unmatched_evaluations as f64);
    }

    /// Record one completion request
    pub fn record_llm_request(&self, analysis: &'static str, duration: Duration, tokens: u64, cost: f64, success: bool) {
        let status = if success { "success" } else { "error" };
        counter!(self.llm_requests_total, "analysis" => analysis, "status" => status).increment(1);
        histogram!(self.llm_request_duration, "analysis" => analysis).record(duration.as_secs_f64());
        counter!(self.llm_tokens_total, "analysis" => analysis).increment(tokens);
        histogram!(self.llm_cost_dollars, "analysis" => analysis).record(cost);

        if !success {
            self.record_error("llm", analysis);
        }
    }

    /// Record export operation metrics
    pub fn record_export(&self, format: &'static str, file_count: usize, duration: Duration) {
        counter!(self.export_files_created_total, "format" => format).increment(file_count as u64);
        histogram!(self.export_duration, "format" => format).record(duration.as_secs_f64());
    }

    /// Record error metrics
    pub fn record_error(&self, error_type: &'static str, operation: &'static str) {
        counter!(self.errors_total, "type" => error_type, "operation" => operation).increment(1);
    }
}

//! File writing utilities for analysis export.
//!
//! Chart data is written as flat tables rather than images, one file per
//! chart, so any plotting tool can pick them up.

use crate::error::Result;
use crate::merge::{MergedRecord, MergedRow};
use crate::pipeline::AnalysisReport;
use csv::Writer;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Table export format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// File extension, without the dot
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// Parse a configured format name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Names of the exported chart tables, in order.
pub const CHART_NAMES: [&str; 7] = [
    "chart_01_outcome_distribution",
    "chart_02_skill_scores_by_outcome",
    "chart_03_questions_by_outcome",
    "chart_04_average_skill_scores",
    "chart_05_user_win_rates",
    "chart_06_win_rate_over_time",
    "chart_07_score_distribution",
];

/// Write `rows` to `file_path` as CSV (header from field names) or a JSON array.
pub fn write_table<T: Serialize>(rows: &[T], format: ExportFormat, file_path: &Path) -> Result<()> {
    match format {
        ExportFormat::Csv => write_csv_file(rows, file_path),
        ExportFormat::Json => write_json(rows, file_path),
    }
}

/// Write the data behind each chart into `output_dir`, overwriting existing files.
///
/// # Returns
///
/// Paths of the files written, in chart order.
pub fn export_chart_tables(report: &AnalysisReport, output_dir: &Path, format: ExportFormat) -> Result<Vec<PathBuf>> {
    create_dir_all(output_dir)?;
    let path = |index: usize| output_dir.join(format!("{}.{}", CHART_NAMES[index], format.extension()));

    let paths: Vec<PathBuf> = (0..CHART_NAMES.len()).map(path).collect();
    write_table(&report.outcome_distribution, format, &paths[0])?;
    write_table(&report.skill_outcome.entries(), format, &paths[1])?;
    write_table(&report.outcome_profiles, format, &paths[2])?;
    write_table(&report.skill_summary, format, &paths[3])?;
    write_table(&report.users, format, &paths[4])?;
    write_table(&report.daily, format, &paths[5])?;
    write_table(&report.score_distribution.bins, format, &paths[6])?;

    tracing::info!(files = paths.len(), dir = %output_dir.display(), "Chart tables exported");
    Ok(paths)
}

/// Write the merged dataset as CSV.
pub fn write_merged_csv(merged: &[MergedRecord<'_>], file_path: &Path) -> Result<()> {
    let rows: Vec<MergedRow<'_>> = merged.iter().map(MergedRow::from).collect();
    write_csv_file(&rows, file_path)
}

/// Serialize `value` as pretty JSON.
pub fn write_json<T: Serialize + ?Sized>(value: &T, file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent)?;
    }
    let file = File::create(file_path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

/// Read a JSON document written by [`write_json`].
pub fn read_json<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let file = File::open(file_path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

fn write_csv_file<T: Serialize>(rows: &[T], file_path: &Path) -> Result<()> {
    let file = File::create(file_path)?;
    let mut writer = Writer::from_writer(BufWriter::new(file));

    for row in rows {
        writer.serialize(row)?;
    }

    writer.flush()?;
    Ok(())
}

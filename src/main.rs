use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use sales_call_insights::config::AppConfig;
use sales_call_insights::file_writer::{export_chart_tables, read_json, write_json, write_merged_csv, ExportFormat};
use sales_call_insights::insights::{write_insights, InsightExtractor, InsightReport};
use sales_call_insights::llm::{read_api_key, OpenAiClient};
use sales_call_insights::logging::{init_logging, LogFormat, OperationTimer};
use sales_call_insights::metrics::MetricsCollector;
use sales_call_insights::pipeline::Datasets;
use sales_call_insights::prompts::PromptInputs;
use sales_call_insights::report::{write_analysis, write_deep_analysis};
use sales_call_insights::validation::InputValidator;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Recordings CSV (defaults to data.recordings_path)
    #[arg(long)]
    recordings: Option<PathBuf>,

    /// Evaluations CSV (defaults to data.evaluations_path)
    #[arg(long)]
    evaluations: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the main analysis and export chart tables
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        /// Output directory for chart tables
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Table format
        #[arg(short, long, value_enum)]
        format: Option<ExportFormat>,

        /// Print the analysis without writing files
        #[arg(long)]
        no_export: bool,

        /// Also write the merged dataset as CSV
        #[arg(long)]
        merged: bool,
    },
    /// Print skill correlations, keyword tallies and data quality
    Deep {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Run the LLM analyses and save the results
    Insights {
        #[command(flatten)]
        input: InputArgs,

        /// Completion model
        #[arg(short, long)]
        model: Option<String>,

        /// Results file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// User to treat as the top performer
        #[arg(long)]
        top_user: Option<String>,

        /// User to treat as the bottom performer
        #[arg(long)]
        bottom_user: Option<String>,
    },
    /// Print a saved results file
    ShowInsights {
        /// Results file
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Print the effective configuration
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging; the guard must outlive every log call
    let _log_guard = init_logging(
        Some(&config.get_log_level()),
        config.logging.file_path.as_deref().map(Path::new),
        LogFormat::from_name(&config.logging.format),
    )?;

    if let Err(e) = MetricsCollector::init() {
        debug!("Metrics recorder not installed: {}", e);
    }

    info!("Starting call-insights");
    let metrics = MetricsCollector::default();

    match cli.command {
        Commands::Analyze {
            input,
            output_dir,
            format,
            no_export,
            merged,
        } => analyze(&config, &metrics, &input, output_dir, format, no_export, merged)?,
        Commands::Deep { input } => deep(&config, &metrics, &input)?,
        Commands::Insights {
            input,
            model,
            output,
            top_user,
            bottom_user,
        } => insights(&config, &metrics, &input, model, output, top_user, bottom_user).await?,
        Commands::ShowInsights { input } => show_insights(&config, input)?,
        Commands::ShowConfig => {
            io::stdout().lock().write_all(config.to_yaml()?.as_bytes())?;
        }
    }

    Ok(())
}

/// Resolve input paths and load both datasets
fn load_datasets(config: &AppConfig, metrics: &MetricsCollector, input: &InputArgs) -> Result<Datasets> {
    let recordings = input.recordings.clone().unwrap_or_else(|| config.recordings_path());
    let evaluations = input.evaluations.clone().unwrap_or_else(|| config.evaluations_path());
    InputValidator::validate_input_file(&recordings)?;
    InputValidator::validate_input_file(&evaluations)?;

    Datasets::load(&recordings, &evaluations, metrics).context("Failed to load datasets")
}

/// Main analysis plus chart table export
fn analyze(
    config: &AppConfig, metrics: &MetricsCollector, input: &InputArgs, output_dir: Option<PathBuf>,
    format: Option<ExportFormat>, no_export: bool, merged: bool,
) -> Result<()> {
    let datasets = load_datasets(config, metrics, input)?;
    let report = datasets.analyze(&config.analysis);

    let mut out = io::stdout().lock();
    write_analysis(&report, &mut out)?;

    if no_export {
        return Ok(());
    }

    let dir = output_dir.unwrap_or_else(|| PathBuf::from(&config.output.directory));
    InputValidator::validate_output_dir(&dir)?;
    let format = format
        .or_else(|| ExportFormat::from_name(&config.output.export_format))
        .unwrap_or(ExportFormat::Csv);

    let timer = OperationTimer::new("export");
    let mut files = export_chart_tables(&report, &dir, format)
        .with_context(|| format!("Failed to export chart tables to {}", dir.display()))?;
    if merged {
        let merged_path = dir.join("merged_dataset.csv");
        write_merged_csv(&datasets.merged(), &merged_path)?;
        files.push(merged_path);
    }
    metrics.record_export(format.extension(), files.len(), timer.elapsed());
    timer.finish();

    writeln!(out)?;
    writeln!(out, "Wrote {} files to {}", files.len(), dir.display())?;
    Ok(())
}

/// Supplementary analysis
fn deep(config: &AppConfig, metrics: &MetricsCollector, input: &InputArgs) -> Result<()> {
    let datasets = load_datasets(config, metrics, input)?;
    let report = datasets.analyze(&config.analysis);
    write_deep_analysis(&report, &mut io::stdout().lock())?;
    Ok(())
}

/// LLM analyses
async fn insights(
    config: &AppConfig, metrics: &MetricsCollector, input: &InputArgs, model: Option<String>, output: Option<PathBuf>,
    top_user: Option<String>, bottom_user: Option<String>,
) -> Result<()> {
    // Fail before doing any work if the credential is missing
    let api_key = read_api_key(&config.llm.api_key_env)?;
    let model = model.unwrap_or_else(|| config.llm.model.clone());
    InputValidator::validate_model_name(&model)?;

    let datasets = load_datasets(config, metrics, input)?;
    let merged = datasets.merged();
    let report = datasets.analyze(&config.analysis);

    let client = OpenAiClient::new(api_key, &config.llm)?;
    let extractor = InsightExtractor::new(client, model, config.llm.temperature, config.llm.budget);
    let inputs = PromptInputs {
        merged: &merged,
        report: &report,
        settings: &config.analysis,
        top_user: top_user.as_deref().or(config.llm.top_user.as_deref()),
        bottom_user: bottom_user.as_deref().or(config.llm.bottom_user.as_deref()),
    };

    let timer = OperationTimer::new("insights");
    let results = extractor.run(&inputs).await;
    timer.finish();

    let path = output.unwrap_or_else(|| PathBuf::from(&config.output.insights_file));
    write_json(&results, &path).with_context(|| format!("Failed to save results to {}", path.display()))?;
    info!("Results saved to {}", path.display());

    write_insights(&results, &mut io::stdout().lock())?;
    Ok(())
}

/// Print a saved results file
fn show_insights(config: &AppConfig, input: Option<PathBuf>) -> Result<()> {
    let path = input.unwrap_or_else(|| PathBuf::from(&config.output.insights_file));
    let results: InsightReport =
        read_json(&path).with_context(|| format!("Failed to read results from {}", path.display()))?;
    write_insights(&results, &mut io::stdout().lock())?;
    Ok(())
}

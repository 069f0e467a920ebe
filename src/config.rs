use anyhow::Result;
use chrono::NaiveDate;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::temporal::PeriodWindow;
use crate::text_patterns::KeywordLists;
use crate::validation::InputValidator;

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub data: DataConfig,
    pub logging: LoggingConfig,
    pub analysis: AnalysisConfig,
    pub llm: LlmConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub recordings_path: String,
    pub evaluations_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub format: String, // "json" or "text"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Last day of the early comparison window
    pub early_end: NaiveDate,
    /// First day of the late comparison window
    pub late_start: NaiveDate,
    /// Skill examined in the deep dive
    pub focus_skill: String,
    /// Scores at or above this are "high"
    pub high_score_threshold: f64,
    /// Scores at or below this are "low"
    pub low_score_threshold: f64,
    pub keywords: KeywordLists,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub api_base: String,
    pub api_key_env: String,
    pub temperature: f32,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    /// Spend ceiling reported as `remaining_budget`
    pub budget: f64,
    /// Override the automatically chosen top performer
    pub top_user: Option<String>,
    /// Override the automatically chosen bottom performer
    pub bottom_user: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub directory: String,
    pub export_format: String,
    pub insights_file: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: DataConfig {
                recordings_path: "ds_takehome_recording.csv".to_string(),
                evaluations_path: "ds_takehome_scoring_metadata.csv".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
            analysis: AnalysisConfig {
                early_end: NaiveDate::from_ymd_opt(2025, 8, 15).unwrap_or_default(),
                late_start: NaiveDate::from_ymd_opt(2025, 9, 15).unwrap_or_default(),
                focus_skill: "Discover the \"Why\"".to_string(),
                high_score_threshold: 4.0,
                low_score_threshold: 2.0,
                keywords: KeywordLists::default(),
            },
            llm: LlmConfig {
                model: "gpt-3.5-turbo".to_string(),
                api_base: "https://api.openai.com/v1".to_string(),
                api_key_env: "OPENAI_API_KEY".to_string(),
                temperature: 0.3,
                request_timeout_secs: 60,
                max_retries: 3,
                retry_backoff_ms: 500,
                budget: 100.0,
                top_user: None,
                bottom_user: None,
            },
            output: OutputConfig {
                directory: "./output".to_string(),
                export_format: "csv".to_string(),
                insights_file: "llm_analysis_results.json".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    pub fn load() -> Result<Self> {
        let config = Config::builder()
            // Start with default values
            .add_source(Config::try_from(&Self::default())?)
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(File::with_name("config").required(false))
            // e.g. CALL_INSIGHTS__LLM__MODEL=gpt-4
            .add_source(Environment::with_prefix("CALL_INSIGHTS").separator("__"))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {}", e))?;

        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            ));
        }

        InputValidator::validate_period_window(&self.period_window())?;
        InputValidator::validate_score_thresholds(
            self.analysis.low_score_threshold,
            self.analysis.high_score_threshold,
        )?;
        if self.analysis.focus_skill.trim().is_empty() {
            return Err(anyhow::anyhow!("focus_skill cannot be empty"));
        }
        if self.analysis.keywords.improvement.is_empty() || self.analysis.keywords.continuation.is_empty() {
            return Err(anyhow::anyhow!("keyword lists cannot be empty"));
        }

        InputValidator::validate_model_name(&self.llm.model)?;
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(anyhow::anyhow!("temperature must be between 0 and 2"));
        }
        if self.llm.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("request_timeout_secs must be greater than 0"));
        }
        if self.llm.budget < 0.0 {
            return Err(anyhow::anyhow!("budget cannot be negative"));
        }
        if self.llm.api_key_env.trim().is_empty() {
            return Err(anyhow::anyhow!("api_key_env cannot be empty"));
        }

        let valid_exports = ["csv", "json"];
        if !valid_exports.contains(&self.output.export_format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid export format: {}. Must be one of: {:?}",
                self.output.export_format,
                valid_exports
            ));
        }

        Ok(())
    }

    /// The early/late comparison window
    #[must_use]
    pub const fn period_window(&self) -> PeriodWindow {
        PeriodWindow {
            early_end: self.analysis.early_end,
            late_start: self.analysis.late_start,
        }
    }

    /// Recordings CSV path
    #[must_use]
    pub fn recordings_path(&self) -> PathBuf {
        PathBuf::from(&self.data.recordings_path)
    }

    /// Evaluations CSV path
    #[must_use]
    pub fn evaluations_path(&self) -> PathBuf {
        PathBuf::from(&self.data.evaluations_path)
    }

    /// Get log level from environment or config
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }

    /// Render the effective configuration as YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.analysis.early_end, NaiveDate::from_ymd_opt(2025, 8, 15).unwrap());
    }

    #[test]
    fn test_config_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let mut config = AppConfig::default();
        config.llm.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_defaults_survive_config_roundtrip() {
        let built = Config::builder()
            .add_source(Config::try_from(&AppConfig::default()).unwrap())
            .build()
            .unwrap();
        let config: AppConfig = built.try_deserialize().unwrap();
        assert_eq!(config.analysis.late_start, NaiveDate::from_ymd_opt(2025, 9, 15).unwrap());
        assert_eq!(config.analysis.keywords, KeywordLists::default());
        assert!(config.llm.top_user.is_none());
    }
}

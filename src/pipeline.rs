//! End-to-end analysis: load both datasets, merge, and aggregate.

use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::aggregate::{
    focus_skill_stats, outcome_distribution, outcome_profiles, overview, score_distribution,
    skill_outcome_scores, skill_summary, user_summary, win_rate_spread, DatasetOverview,
    FocusSkillStats, OutcomeCount, OutcomeProfile, ScoreDistribution, SkillOutcomeTable,
    SkillSummary, UserSummary, WinRateSpread,
};
use crate::config::AnalysisConfig;
use crate::correlation::{skill_correlations, CorrelationMatrix};
use crate::error::Result;
use crate::loader::{load_evaluations, load_recordings, LoadTally};
use crate::logging::OperationTimer;
use crate::merge::{join_stats, merge, JoinStats, MergedRecord};
use crate::metrics::MetricsCollector;
use crate::models::{Evaluation, Recording};
use crate::temporal::{daily_summary, period_comparison, DailySummary, PeriodComparison, PeriodWindow};
use crate::text_patterns::{impact_patterns, recommendation_patterns, KeywordTally};

/// Everything that was coerced or dropped while loading and joining
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DataQuality {
    /// Recordings load
    pub recordings: LoadTally,
    /// Evaluations load
    pub evaluations: LoadTally,
    /// Join outcome
    pub join: JoinStats,
}

/// Both normalized datasets
#[derive(Debug, Clone)]
pub struct Datasets {
    /// Normalized recordings, in file order
    pub recordings: Vec<Recording>,
    /// Normalized evaluations, in file order
    pub evaluations: Vec<Evaluation>,
    /// Load and join tallies
    pub quality: DataQuality,
}

impl Datasets {
    /// Wrap already-normalized records, computing the join tally.
    #[must_use]
    pub fn new(recordings: Vec<Recording>, evaluations: Vec<Evaluation>) -> Self {
        let join = join_stats(&recordings, &evaluations);
        Self {
            recordings,
            evaluations,
            quality: DataQuality { join, ..DataQuality::default() },
        }
    }

    /// Load and normalize both CSV files.
    pub fn load(recordings_path: &Path, evaluations_path: &Path, metrics: &MetricsCollector) -> Result<Self> {
        let timer = OperationTimer::new("load_datasets");

        let started = Instant::now();
        let (recordings, recording_tally) = load_recordings(recordings_path)?;
        metrics.record_load("recordings", &recording_tally, started.elapsed());

        let started = Instant::now();
        let (evaluations, evaluation_tally) = load_evaluations(evaluations_path)?;
        metrics.record_load("evaluations", &evaluation_tally, started.elapsed());

        let mut datasets = Self::new(recordings, evaluations);
        datasets.quality.recordings = recording_tally;
        datasets.quality.evaluations = evaluation_tally;
        metrics.record_join(&datasets.quality.join);

        info!(
            recordings = datasets.recordings.len(),
            evaluations = datasets.evaluations.len(),
            merged = datasets.quality.join.merged_rows,
            unmatched_recordings = datasets.quality.join.unmatched_recordings,
            unmatched_evaluations = datasets.quality.join.unmatched_evaluations,
            "Datasets loaded"
        );
        timer.finish();
        Ok(datasets)
    }

    /// Inner join of the two datasets.
    #[must_use]
    pub fn merged(&self) -> Vec<MergedRecord<'_>> {
        merge(&self.recordings, &self.evaluations)
    }

    /// Run every aggregation.
    #[must_use]
    pub fn analyze(&self, settings: &AnalysisConfig) -> AnalysisReport {
        let timer = OperationTimer::new("analyze");
        let merged = self.merged();
        let users = user_summary(&self.recordings, &merged);
        let window = PeriodWindow {
            early_end: settings.early_end,
            late_start: settings.late_start,
        };

        let report = AnalysisReport {
            overview: overview(&self.recordings, &self.evaluations),
            outcome_distribution: outcome_distribution(&self.recordings),
            skill_summary: skill_summary(&self.evaluations),
            skill_outcome: skill_outcome_scores(&merged),
            outcome_profiles: outcome_profiles(&self.recordings),
            win_rate_spread: win_rate_spread(&users),
            users,
            daily: daily_summary(&self.recordings, &merged),
            periods: period_comparison(&self.recordings, &merged, &window),
            focus_skill: focus_skill_stats(&settings.focus_skill, &self.evaluations, &merged),
            score_distribution: score_distribution(&self.evaluations),
            correlations: skill_correlations(&merged),
            recommendation_keywords: recommendation_patterns(&self.evaluations, &settings.keywords),
            impact_keywords: impact_patterns(&self.evaluations, &settings.keywords),
            quality: self.quality,
        };
        timer.finish();
        report
    }
}

/// All aggregates for one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// Headline dataset figures
    pub overview: DatasetOverview,
    /// Recordings per outcome label
    pub outcome_distribution: Vec<OutcomeCount>,
    /// Per-skill score statistics, best first
    pub skill_summary: Vec<SkillSummary>,
    /// Mean score per skill and outcome
    pub skill_outcome: SkillOutcomeTable,
    /// Question and talk-time averages per outcome
    pub outcome_profiles: Vec<OutcomeProfile>,
    /// Per-user figures, highest win rate first
    pub users: Vec<UserSummary>,
    /// Highest and lowest user win rate; `None` without users
    pub win_rate_spread: Option<WinRateSpread>,
    /// One row per calendar day
    pub daily: Vec<DailySummary>,
    /// Early versus late window
    pub periods: PeriodComparison,
    /// Deep dive on the configured focus skill
    pub focus_skill: FocusSkillStats,
    /// Frequency of each score value
    pub score_distribution: ScoreDistribution,
    /// Skill-by-skill correlations
    pub correlations: CorrelationMatrix,
    /// Keyword tally over recommendation texts
    pub recommendation_keywords: KeywordTally,
    /// Keyword tally over impact texts
    pub impact_keywords: KeywordTally,
    /// Load and join tallies
    pub quality: DataQuality,
}

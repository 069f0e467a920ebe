//! Runs the six LLM analyses and persists the results.

use std::io::{self, Write};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::llm::{estimate_cost, CompletionClient, CompletionRequest, CostLedger, CostSummary};
use crate::metrics::MetricsCollector;
use crate::prompts::{self, InsightKind, PromptInputs};

/// Results of one insights run; an analysis that failed is `None`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightReport {
    /// Themes in high versus low score recommendations
    pub recommendation_themes: Option<String>,
    /// Language patterns in cited quotes
    pub citation_patterns: Option<String>,
    /// Focus skill deep dive
    pub discover_why_analysis: Option<String>,
    /// Early versus late period root causes
    pub temporal_decline: Option<String>,
    /// Top versus bottom performer coaching plan
    pub user_coaching: Option<String>,
    /// Won versus lost impact themes
    pub impact_analysis: Option<String>,
    /// Spend for the run
    pub cost_summary: CostSummary,
}

impl InsightReport {
    /// Text produced for `kind`, if any
    #[must_use]
    pub fn get(&self, kind: InsightKind) -> Option<&str> {
        let slot = match kind {
            InsightKind::RecommendationThemes => &self.recommendation_themes,
            InsightKind::CitationPatterns => &self.citation_patterns,
            InsightKind::FocusSkill => &self.discover_why_analysis,
            InsightKind::TemporalDecline => &self.temporal_decline,
            InsightKind::UserCoaching => &self.user_coaching,
            InsightKind::ImpactAnalysis => &self.impact_analysis,
        };
        slot.as_deref()
    }

    fn slot_mut(&mut self, kind: InsightKind) -> &mut Option<String> {
        match kind {
            InsightKind::RecommendationThemes => &mut self.recommendation_themes,
            InsightKind::CitationPatterns => &mut self.citation_patterns,
            InsightKind::FocusSkill => &mut self.discover_why_analysis,
            InsightKind::TemporalDecline => &mut self.temporal_decline,
            InsightKind::UserCoaching => &mut self.user_coaching,
            InsightKind::ImpactAnalysis => &mut self.impact_analysis,
        }
    }
}

/// Sends each analysis prompt through a [`CompletionClient`]
pub struct InsightExtractor<C> {
    client: C,
    model: String,
    temperature: f32,
    budget: f64,
    metrics: MetricsCollector,
}

impl<C: CompletionClient> InsightExtractor<C> {
    pub fn new(client: C, model: impl Into<String>, temperature: f32, budget: f64) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
            budget,
            metrics: MetricsCollector::default(),
        }
    }

    /// Run every analysis in order.
    ///
    /// A failed or unbuildable analysis is logged and left empty; the rest
    /// still run. Only successful completions are charged to the ledger.
    pub async fn run(&self, inputs: &PromptInputs<'_>) -> InsightReport {
        let mut report = InsightReport::default();
        let mut ledger = CostLedger::new(self.budget);

        for kind in InsightKind::ALL {
            let Some(prompt) = prompts::build(kind, inputs) else {
                warn!(analysis = kind.key(), "Not enough data to build prompt, skipping");
                continue;
            };
            let request = CompletionRequest {
                model: self.model.clone(),
                prompt,
                max_tokens: kind.max_tokens(),
                temperature: self.temperature,
            };

            info!(analysis = kind.key(), "Running analysis: {}", kind.title());
            let started = Instant::now();
            match self.client.complete(&request).await {
                Ok(completion) => {
                    let cost = estimate_cost(&self.model, &completion.usage);
                    ledger = ledger.record(&completion.usage, cost);
                    self.metrics
                        .record_llm_request(kind.key(), started.elapsed(), completion.usage.total(), cost, true);
                    info!(
                        analysis = kind.key(),
                        tokens = completion.usage.total(),
                        cost,
                        "Analysis complete"
                    );
                    *report.slot_mut(kind) = Some(completion.text.trim().to_string());
                }
                Err(err) => {
                    self.metrics.record_llm_request(kind.key(), started.elapsed(), 0, 0.0, false);
                    error!(analysis = kind.key(), error = %err, "Analysis failed");
                }
            }
        }

        report.cost_summary = ledger.summary();
        info!(
            total_tokens = report.cost_summary.total_tokens,
            total_cost = report.cost_summary.total_cost,
            "Insights run finished"
        );
        report
    }
}

/// Render a saved report for reading.
pub fn write_insights(report: &InsightReport, out: &mut impl Write) -> io::Result<()> {
    let rule = "=".repeat(80);
    writeln!(out, "{rule}")?;
    writeln!(out, "LLM ANALYSIS RESULTS")?;
    writeln!(out, "{rule}")?;

    for (index, kind) in InsightKind::ALL.iter().enumerate() {
        writeln!(out)?;
        writeln!(out, "{}. {}", index + 1, kind.title().to_uppercase())?;
        writeln!(out, "{}", "-".repeat(80))?;
        writeln!(out, "{}", report.get(*kind).unwrap_or("No results available"))?;
    }

    let cost = &report.cost_summary;
    writeln!(out)?;
    writeln!(out, "{rule}")?;
    writeln!(out, "COST SUMMARY")?;
    writeln!(out, "{rule}")?;
    writeln!(out, "Total tokens:     {}", cost.total_tokens)?;
    writeln!(out, "Total cost:       ${:.4}", cost.total_cost)?;
    writeln!(out, "Remaining budget: ${:.2}", cost.remaining_budget)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::error::AnalyticsError;
    use crate::llm::{Completion, MockCompletionClient, TokenUsage};
    use crate::loader::{read_evaluations, read_recordings};
    use crate::pipeline::Datasets;

    const RECORDINGS: &str = "\
recordingid,userId,dateCreated,durationInMilliseconds,conversationTime,repSpeakingTime,repWordCount,repQuestionsCount,customerQuestionsCount,outcome
r1,alice,2025-08-06T10:00:00Z,600000,500000,250000,900,10,4,won
r2,bob,2025-09-20T10:00:00Z,300000,250000,200000,700,3,6,lost
";

    const EVALUATIONS: &str = r#"recordingid,userId,recordingdate,skillName,score,scoringMetadata
r1,alice,2025-08-06T10:00:00Z,Rapport,5,"{""impact"":""Built trust"",""recommendation"":""Keep mirroring"",""thinkingWithCitation"":{""citations"":[{""quote"":""Tell me more""}]}}"
r2,bob,2025-09-20T10:00:00Z,Rapport,1,"{""impact"":""Customer disengaged"",""recommendation"":""Practice open questions"",""thinkingWithCitation"":{""citations"":[{""quote"":""So, price?""}]}}"
"#;

    fn datasets() -> Datasets {
        let (recordings, _) = read_recordings(RECORDINGS.as_bytes()).unwrap();
        let (evaluations, _) = read_evaluations(EVALUATIONS.as_bytes()).unwrap();
        Datasets::new(recordings, evaluations)
    }

    #[tokio::test]
    async fn test_failed_prompt_does_not_abort_run() {
        let data = datasets();
        let config = AppConfig::default();
        let merged = data.merged();
        let report = data.analyze(&config.analysis);
        let inputs = PromptInputs {
            merged: &merged,
            report: &report,
            settings: &config.analysis,
            top_user: None,
            bottom_user: None,
        };

        let mut client = MockCompletionClient::new();
        client.expect_complete().times(6).returning(|request| {
            if request.prompt.contains("QUOTES FROM HIGH-SCORING CALLS") {
                Err(AnalyticsError::Llm("rate limited".to_string()))
            } else {
                Ok(Completion {
                    text: format!("  ok {}  ", request.max_tokens),
                    usage: TokenUsage { prompt_tokens: 100, completion_tokens: 50 },
                })
            }
        });

        let extractor = InsightExtractor::new(client, "gpt-3.5-turbo", 0.3, 100.0);
        let insights = extractor.run(&inputs).await;

        assert!(insights.citation_patterns.is_none());
        assert_eq!(insights.recommendation_themes.as_deref(), Some("ok 800"));
        assert_eq!(insights.discover_why_analysis.as_deref(), Some("ok 1000"));
        assert!(insights.user_coaching.is_some());
        assert!(insights.impact_analysis.is_some());
        assert_eq!(insights.cost_summary.total_tokens, 5 * 150);
        assert!(insights.cost_summary.remaining_budget < 100.0);
    }

    #[test]
    fn test_write_insights_marks_missing() {
        let report = InsightReport {
            temporal_decline: Some("Scores fell after onboarding.".to_string()),
            ..InsightReport::default()
        };
        let mut out = Vec::new();
        write_insights(&report, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Scores fell after onboarding."));
        assert_eq!(text.matches("No results available").count(), 5);
    }

    #[test]
    fn test_report_json_keys() {
        let json = serde_json::to_value(InsightReport::default()).unwrap();
        for kind in InsightKind::ALL {
            assert!(json.get(kind.key()).is_some(), "missing key {}", kind.key());
        }
        assert!(json["cost_summary"].get("remaining_budget").is_some());
    }
}

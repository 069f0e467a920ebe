//! Prompt construction for the six LLM analyses.
//!
//! Each builder samples non-empty texts from the merged dataset, truncates
//! them on character boundaries and fills a fixed template with figures from
//! the [`AnalysisReport`].

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::aggregate::weakest_skill;
use crate::config::AnalysisConfig;
use crate::merge::MergedRecord;
use crate::models::Outcome;
use crate::pipeline::AnalysisReport;
use crate::stats::mean;
use crate::utils::{bullet_list, fmt_num, non_empty};

/// The six analyses, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InsightKind {
    RecommendationThemes,
    CitationPatterns,
    FocusSkill,
    TemporalDecline,
    UserCoaching,
    ImpactAnalysis,
}

impl InsightKind {
    pub const ALL: [Self; 6] = [
        Self::RecommendationThemes,
        Self::CitationPatterns,
        Self::FocusSkill,
        Self::TemporalDecline,
        Self::UserCoaching,
        Self::ImpactAnalysis,
    ];

    /// Key in the persisted results document
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::RecommendationThemes => "recommendation_themes",
            Self::CitationPatterns => "citation_patterns",
            Self::FocusSkill => "discover_why_analysis",
            Self::TemporalDecline => "temporal_decline",
            Self::UserCoaching => "user_coaching",
            Self::ImpactAnalysis => "impact_analysis",
        }
    }

    /// Human-readable section title
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::RecommendationThemes => "Key Themes in Recommendations",
            Self::CitationPatterns => "Citation Pattern Analysis",
            Self::FocusSkill => "Skill Deep Dive",
            Self::TemporalDecline => "Temporal Decline Root Cause Analysis",
            Self::UserCoaching => "User-Specific Coaching Recommendations",
            Self::ImpactAnalysis => "Impact Text Analysis",
        }
    }

    /// Completion length limit
    #[must_use]
    pub const fn max_tokens(self) -> u32 {
        match self {
            Self::RecommendationThemes | Self::CitationPatterns | Self::ImpactAnalysis => 800,
            Self::FocusSkill | Self::TemporalDecline | Self::UserCoaching => 1000,
        }
    }
}

/// Everything a prompt may draw on
#[derive(Debug, Clone, Copy)]
pub struct PromptInputs<'a> {
    /// Joined rows texts are sampled from
    pub merged: &'a [MergedRecord<'a>],
    /// Computed figures quoted in the prompts
    pub report: &'a AnalysisReport,
    /// Thresholds and focus skill
    pub settings: &'a AnalysisConfig,
    /// Explicit top performer; otherwise the highest win rate
    pub top_user: Option<&'a str>,
    /// Explicit bottom performer; otherwise the lowest win rate
    pub bottom_user: Option<&'a str>,
}

impl<'a> PromptInputs<'a> {
    fn is_high(&self, score: Option<f64>) -> bool {
        score.is_some_and(|s| s >= self.settings.high_score_threshold)
    }

    fn is_low(&self, score: Option<f64>) -> bool {
        score.is_some_and(|s| s <= self.settings.low_score_threshold)
    }

    fn recommendations_where(&self, limit: usize, keep: impl Fn(&MergedRecord<'a>) -> bool) -> Vec<&'a str> {
        non_empty(self.merged.iter().filter(|m| keep(m)).map(MergedRecord::recommendation), limit)
    }

    fn impacts_where(&self, limit: usize, keep: impl Fn(&MergedRecord<'a>) -> bool) -> Vec<&'a str> {
        non_empty(self.merged.iter().filter(|m| keep(m)).map(MergedRecord::impact), limit)
    }
}

/// Build the prompt for `kind`, or `None` when the data cannot support it.
#[must_use]
pub fn build(kind: InsightKind, inputs: &PromptInputs<'_>) -> Option<String> {
    match kind {
        InsightKind::RecommendationThemes => Some(recommendation_themes(inputs)),
        InsightKind::CitationPatterns => Some(citation_patterns(inputs)),
        InsightKind::FocusSkill => Some(focus_skill(inputs)),
        InsightKind::TemporalDecline => Some(temporal_decline(inputs)),
        InsightKind::UserCoaching => user_coaching(inputs),
        InsightKind::ImpactAnalysis => Some(impact_analysis(inputs)),
    }
}

fn recommendation_themes(inputs: &PromptInputs<'_>) -> String {
    let high = inputs.recommendations_where(20, |m| inputs.is_high(m.score()));
    let low = inputs.recommendations_where(20, |m| inputs.is_low(m.score()));

    format!(
        "Analyze these sales coaching recommendations and identify the top 5 themes.\n\n\
         HIGH SCORE RECOMMENDATIONS (score >= {high_t}):\n{high}\n\n\
         LOW SCORE RECOMMENDATIONS (score <= {low_t}):\n{low}\n\n\
         For each theme, provide:\n\
         1. Theme name\n\
         2. Brief description\n\
         3. Whether it is more common in high or low scores\n\
         4. Key action items\n\n\
         Format as a structured list.",
        high_t = inputs.settings.high_score_threshold,
        low_t = inputs.settings.low_score_threshold,
        high = bullet_list(&high, 200),
        low = bullet_list(&low, 200),
    )
}

/// Up to three quotes per evaluation, stopping a side once it has 30.
fn sample_quotes<'a>(inputs: &PromptInputs<'a>) -> (Vec<&'a str>, Vec<&'a str>) {
    const PER_RECORD: usize = 3;
    const PER_SIDE: usize = 30;

    let mut high = Vec::new();
    let mut low = Vec::new();
    for record in inputs.merged {
        let quotes = non_empty(
            record.evaluation.metadata.citations.iter().map(|c| c.quote.as_str()),
            PER_RECORD,
        );
        if quotes.is_empty() {
            continue;
        }
        if inputs.is_high(record.score()) && high.len() < PER_SIDE {
            high.extend(quotes);
        } else if inputs.is_low(record.score()) && low.len() < PER_SIDE {
            low.extend(quotes);
        }
    }
    (high, low)
}

fn citation_patterns(inputs: &PromptInputs<'_>) -> String {
    let (high, low) = sample_quotes(inputs);
    let head = |quotes: &[&str]| bullet_list(&quotes[..quotes.len().min(20)], 150);

    format!(
        "Analyze these quotes from sales calls and identify patterns.\n\n\
         QUOTES FROM HIGH-SCORING CALLS:\n{}\n\n\
         QUOTES FROM LOW-SCORING CALLS:\n{}\n\n\
         Identify:\n\
         1. Language patterns that distinguish high from low scores\n\
         2. Specific phrases or approaches that work well\n\
         3. Common mistakes or problematic language\n\
         4. Actionable insights for sales reps\n\n\
         Provide specific examples.",
        head(&high),
        head(&low),
    )
}

fn focus_skill(inputs: &PromptInputs<'_>) -> String {
    let skill = inputs.settings.focus_skill.as_str();
    let of_skill = |m: &MergedRecord<'_>| m.skill_name() == skill;

    let high_impacts = inputs.impacts_where(10, |m| of_skill(m) && inputs.is_high(m.score()));
    let low_impacts = inputs.impacts_where(10, |m| of_skill(m) && inputs.is_low(m.score()));
    let high_recs = inputs.recommendations_where(10, |m| of_skill(m) && inputs.is_high(m.score()));

    let standing = match weakest_skill(&inputs.report.skill_summary) {
        Some(weakest) if weakest.skill == skill => "the lowest average score",
        _ => "an average score",
    };

    format!(
        "The skill \"{skill}\" has {standing} ({mean}/5.0) across all reps.\n\n\
         HIGH SCORE IMPACTS (what worked):\n{}\n\n\
         LOW SCORE IMPACTS (what did not work):\n{}\n\n\
         RECOMMENDATIONS FOR IMPROVEMENT:\n{}\n\n\
         Based on this, provide:\n\
         1. The 3 most critical gaps preventing reps from excelling at this skill\n\
         2. Specific, actionable coaching recommendations\n\
         3. Example questions or phrases that would improve scores\n\
         4. A prioritized training plan\n\n\
         Be specific and practical.",
        bullet_list(&high_impacts, usize::MAX),
        bullet_list(&low_impacts, usize::MAX),
        bullet_list(&high_recs, usize::MAX),
        mean = fmt_num(inputs.report.focus_skill.mean, 2),
    )
}

fn temporal_decline(inputs: &PromptInputs<'_>) -> String {
    let periods = &inputs.report.periods;
    let window = periods.window;
    let early = |m: &MergedRecord<'_>| m.evaluation_date().is_some_and(|d| d <= window.early_end);
    let late = |m: &MergedRecord<'_>| m.evaluation_date().is_some_and(|d| d >= window.late_start);

    format!(
        "Win rate moved from {early_wr}% to {late_wr}% and mean skill score from {early_s} to {late_s} \
         ({decline}% decline) between the early and late periods.\n\n\
         EARLY PERIOD RECOMMENDATIONS (through {early_end}):\n{}\n\n\
         LATE PERIOD RECOMMENDATIONS (from {late_start}):\n{}\n\n\
         EARLY PERIOD IMPACTS:\n{}\n\n\
         LATE PERIOD IMPACTS:\n{}\n\n\
         Analyze what changed and provide:\n\
         1. Key differences in recommendations between periods\n\
         2. Potential root causes for the decline\n\
         3. Specific hypotheses to investigate\n\
         4. Immediate intervention recommendations\n\n\
         Focus on actionable insights.",
        bullet_list(&inputs.recommendations_where(15, early), 180),
        bullet_list(&inputs.recommendations_where(15, late), 180),
        bullet_list(&inputs.impacts_where(10, early), 150),
        bullet_list(&inputs.impacts_where(10, late), 150),
        early_wr = fmt_num(periods.early.win_rate, 0),
        late_wr = fmt_num(periods.late.win_rate, 0),
        early_s = fmt_num(periods.early.mean_score, 2),
        late_s = fmt_num(periods.late.mean_score, 2),
        decline = fmt_num(periods.score_decline_pct(), 0),
        early_end = window.early_end,
        late_start = window.late_start,
    )
}

/// The (top, bottom) users to compare: explicit choices win, otherwise the
/// ends of the win-rate ranking.
#[must_use]
pub fn coaching_pair<'a>(inputs: &PromptInputs<'a>) -> Option<(&'a str, &'a str)> {
    let ranked: Vec<&str> = inputs
        .report
        .users
        .iter()
        .filter(|u| !u.win_rate.is_nan())
        .map(|u| u.user_id.as_str())
        .collect();
    let top = inputs.top_user.or_else(|| ranked.first().copied())?;
    let bottom = inputs.bottom_user.or_else(|| ranked.last().copied())?;
    (top != bottom).then_some((top, bottom))
}

fn user_block(inputs: &PromptInputs<'_>, label: &str, user: &str) -> String {
    let mut scores: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for record in inputs.merged.iter().filter(|m| m.user_id_recording() == user) {
        if let Some(score) = record.score() {
            scores.entry(record.skill_name()).or_default().push(score);
        }
    }
    let skill_scores = scores
        .into_iter()
        .map(|(skill, values)| format!("{skill}: {}", fmt_num(mean(values), 2)))
        .collect::<Vec<_>>()
        .join(", ");

    let win_rate = inputs
        .report
        .users
        .iter()
        .find(|u| u.user_id == user)
        .map_or(f64::NAN, |u| u.win_rate);
    let recs = inputs.recommendations_where(10, |m| m.user_id_recording() == user);

    let mut block = String::new();
    let _ = writeln!(block, "{label} ({}% win rate):", fmt_num(win_rate, 0));
    let _ = writeln!(block, "Skill Scores: {skill_scores}");
    let _ = write!(block, "Sample Recommendations:\n{}", bullet_list(&recs, 150));
    block
}

fn user_coaching(inputs: &PromptInputs<'_>) -> Option<String> {
    let (top, bottom) = coaching_pair(inputs)?;

    Some(format!(
        "Compare two sales reps with very different performance:\n\n\
         {}\n\n{}\n\n\
         Provide:\n\
         1. Key differences in their approaches (based on recommendations)\n\
         2. A specific coaching plan for the bottom performer\n\
         3. What the bottom performer should learn from the top performer\n\
         4. A prioritized skill development plan\n\n\
         Be specific and actionable.",
        user_block(inputs, "TOP PERFORMER", top),
        user_block(inputs, "BOTTOM PERFORMER", bottom),
    ))
}

fn impact_analysis(inputs: &PromptInputs<'_>) -> String {
    let won = inputs.impacts_where(20, |m| *m.outcome() == Outcome::Won);
    let lost = inputs.impacts_where(20, |m| *m.outcome() == Outcome::Lost);

    format!(
        "Analyze the \"impact\" descriptions from sales call evaluations.\n\n\
         IMPACTS FROM WON DEALS:\n{}\n\n\
         IMPACTS FROM LOST DEALS:\n{}\n\n\
         Identify:\n\
         1. Common themes in won versus lost deal impacts\n\
         2. Language patterns that predict success\n\
         3. Key behaviors that differentiate won from lost deals\n\
         4. Actionable insights for improving outcomes\n\n\
         Focus on what actually drives wins.",
        bullet_list(&won, usize::MAX),
        bullet_list(&lost, usize::MAX),
    )
}

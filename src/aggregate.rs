//! Grouped statistics over skills, outcomes and users.
//!
//! Every function here is pure over slices of normalized records. Groups are
//! keyed through `BTreeMap` so ties and table rows come out in a stable,
//! alphabetical order.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::merge::MergedRecord;
use crate::models::{Evaluation, Outcome, Recording};
use crate::stats::{desc_nan_last, mean, percentage, sample_std, Summary};

/// Score statistics for one skill
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillSummary {
    /// Skill name
    pub skill: String,
    /// Mean score
    pub mean: f64,
    /// Sample standard deviation
    pub std: f64,
    /// Evaluations with a usable score
    pub count: usize,
    /// All evaluations of this skill, scored or not
    pub rows: usize,
    /// Lowest score
    pub min: f64,
    /// Highest score
    pub max: f64,
}

/// Per-skill score statistics, sorted by mean descending (NaN last).
#[must_use]
pub fn skill_summary(evaluations: &[Evaluation]) -> Vec<SkillSummary> {
    let mut groups: BTreeMap<&str, Vec<Option<f64>>> = BTreeMap::new();
    for evaluation in evaluations {
        groups
            .entry(evaluation.skill_name.as_str())
            .or_default()
            .push(evaluation.score);
    }

    let mut summaries: Vec<SkillSummary> = groups
        .into_iter()
        .map(|(skill, scores)| {
            let summary = Summary::from_values(scores.iter().flatten().copied());
            SkillSummary {
                skill: skill.to_string(),
                mean: summary.mean,
                std: summary.std,
                count: summary.count,
                rows: scores.len(),
                min: summary.min,
                max: summary.max,
            }
        })
        .collect();

    summaries.sort_by(|a, b| desc_nan_last(a.mean, b.mean));
    summaries
}

/// The skill with the lowest mean score.
#[must_use]
pub fn weakest_skill(summaries: &[SkillSummary]) -> Option<&SkillSummary> {
    summaries
        .iter()
        .filter(|s| !s.mean.is_nan())
        .min_by(|a, b| a.mean.total_cmp(&b.mean))
}

/// One (skill, outcome) cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutcomeCell {
    /// Mean score; 0 when the combination never occurs, NaN when it occurs
    /// but no row carries a score
    pub mean: f64,
    /// Rows with a usable score
    pub count: usize,
    /// All merged rows for the combination
    pub rows: usize,
}

impl OutcomeCell {
    const ABSENT: Self = Self { mean: 0.0, count: 0, rows: 0 };
}

/// Mean score per skill, one column per outcome
///
/// Absent combinations are filled with 0 while ratios elsewhere use NaN.
/// A 0 here is only trustworthy once `count` has been checked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillOutcomeTable {
    /// Outcome labels, one per column, sorted
    pub outcomes: Vec<String>,
    /// One row per skill, sorted by skill name
    pub rows: Vec<SkillOutcomeRow>,
}

/// A row of [`SkillOutcomeTable`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillOutcomeRow {
    /// Skill name
    pub skill: String,
    /// Cells aligned with [`SkillOutcomeTable::outcomes`]
    pub cells: Vec<OutcomeCell>,
}

/// Long-form entry of a [`SkillOutcomeTable`], for export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillOutcomeEntry {
    /// Skill name
    pub skill: String,
    /// Outcome label
    pub outcome: String,
    /// Mean score (0-filled)
    pub mean_score: f64,
    /// Scored rows behind the mean
    pub count: usize,
}

impl SkillOutcomeTable {
    /// Cell for `skill` × `outcome`, filled with the absent cell when the
    /// combination was never observed.
    #[must_use]
    pub fn cell(&self, skill: &str, outcome: &str) -> OutcomeCell {
        let column = self.outcomes.iter().position(|o| o == outcome);
        self.rows
            .iter()
            .find(|row| row.skill == skill)
            .zip(column)
            .map_or(OutcomeCell::ABSENT, |(row, col)| row.cells[col])
    }

    /// Mean score for `skill` × `outcome`; exactly 0 when absent.
    #[must_use]
    pub fn score(&self, skill: &str, outcome: &str) -> f64 {
        self.cell(skill, outcome).mean
    }

    /// Relative won-vs-lost difference in percent, when the lost mean is
    /// positive.
    #[must_use]
    pub fn improvement(&self, skill: &str) -> Option<f64> {
        let won = self.score(skill, Outcome::Won.label());
        let lost = self.score(skill, Outcome::Lost.label());
        (lost > 0.0).then(|| (won - lost) / lost * 100.0)
    }

    /// Flatten into one entry per cell.
    #[must_use]
    pub fn entries(&self) -> Vec<SkillOutcomeEntry> {
        self.rows
            .iter()
            .flat_map(|row| {
                self.outcomes.iter().zip(&row.cells).map(|(outcome, cell)| SkillOutcomeEntry {
                    skill: row.skill.clone(),
                    outcome: outcome.clone(),
                    mean_score: cell.mean,
                    count: cell.count,
                })
            })
            .collect()
    }
}

/// Mean score grouped by (skill, outcome).
#[must_use]
pub fn skill_outcome_scores(merged: &[MergedRecord<'_>]) -> SkillOutcomeTable {
    let mut groups: BTreeMap<(&str, &str), Vec<Option<f64>>> = BTreeMap::new();
    let mut skills = BTreeSet::new();
    let mut outcomes = BTreeSet::new();

    for record in merged {
        let skill = record.skill_name();
        let outcome = record.outcome().label();
        skills.insert(skill);
        outcomes.insert(outcome);
        groups.entry((skill, outcome)).or_default().push(record.score());
    }

    let rows = skills
        .iter()
        .map(|skill| SkillOutcomeRow {
            skill: (*skill).to_string(),
            cells: outcomes
                .iter()
                .map(|outcome| {
                    groups.get(&(*skill, *outcome)).map_or(OutcomeCell::ABSENT, |scores| {
                        let scored: Vec<f64> = scores.iter().flatten().copied().collect();
                        OutcomeCell {
                            mean: mean(scored.iter().copied()),
                            count: scored.len(),
                            rows: scores.len(),
                        }
                    })
                })
                .collect(),
        })
        .collect();

    SkillOutcomeTable {
        outcomes: outcomes.into_iter().map(str::to_string).collect(),
        rows,
    }
}

/// Number of recordings per outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeCount {
    /// Outcome label
    pub outcome: String,
    /// Recordings with that outcome
    pub count: usize,
}

/// Recording counts per outcome, most frequent first.
#[must_use]
pub fn outcome_distribution(recordings: &[Recording]) -> Vec<OutcomeCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for recording in recordings {
        *counts.entry(recording.outcome.label()).or_default() += 1;
    }

    let mut distribution: Vec<OutcomeCount> = counts
        .into_iter()
        .map(|(outcome, count)| OutcomeCount { outcome: outcome.to_string(), count })
        .collect();
    distribution.sort_by(|a, b| b.count.cmp(&a.count));
    distribution
}

/// Conversation behaviour averaged per outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeProfile {
    /// Outcome label
    pub outcome: String,
    /// Recordings in the group
    pub recordings: usize,
    /// Mean questions asked by the rep
    pub avg_rep_questions: f64,
    /// Mean questions asked by the customer
    pub avg_customer_questions: f64,
    /// Rep questions per customer question (of the means)
    pub rep_per_customer_question: f64,
    /// Mean speaking ratio over calls where it is defined
    pub avg_speaking_ratio: f64,
    /// Mean questions ratio
    pub avg_questions_ratio: f64,
    /// Mean duration in minutes
    pub avg_duration_minutes: f64,
}

/// Question strategy and talk-time profile per outcome, sorted by label.
#[must_use]
pub fn outcome_profiles(recordings: &[Recording]) -> Vec<OutcomeProfile> {
    let mut groups: BTreeMap<&str, Vec<&Recording>> = BTreeMap::new();
    for recording in recordings {
        groups.entry(recording.outcome.label()).or_default().push(recording);
    }

    groups
        .into_iter()
        .map(|(outcome, group)| {
            let avg_rep_questions = mean(group.iter().map(|r| r.counts.rep_questions));
            let avg_customer_questions = mean(group.iter().map(|r| r.counts.customer_questions));
            let rep_per_customer_question = if avg_customer_questions == 0.0 {
                f64::NAN
            } else {
                avg_rep_questions / avg_customer_questions
            };
            OutcomeProfile {
                outcome: outcome.to_string(),
                recordings: group.len(),
                avg_rep_questions,
                avg_customer_questions,
                rep_per_customer_question,
                avg_speaking_ratio: mean(group.iter().map(|r| r.derived.speaking_ratio)),
                avg_questions_ratio: mean(group.iter().map(|r| r.derived.questions_ratio)),
                avg_duration_minutes: mean(group.iter().map(|r| r.derived.duration_minutes)),
            }
        })
        .collect()
}

/// Activity, outcomes and skill level of one rep
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    /// User identifier (recordings side)
    pub user_id: String,
    /// Recordings owned by the user
    pub recordings: usize,
    /// Won recordings
    pub wins: usize,
    /// wins / recordings × 100
    pub win_rate: f64,
    /// Mean call duration in minutes
    pub avg_duration_minutes: f64,
    /// Mean rep word count
    pub avg_words: f64,
    /// Mean rep questions
    pub avg_rep_questions: f64,
    /// Mean customer questions
    pub avg_customer_questions: f64,
    /// Mean skill score over the user's merged evaluations
    pub avg_skill_score: f64,
    /// Merged evaluations that carried a score
    pub scored_evaluations: usize,
}

/// Per-user summary joined with the mean skill score, by win rate descending.
#[must_use]
pub fn user_summary(recordings: &[Recording], merged: &[MergedRecord<'_>]) -> Vec<UserSummary> {
    let mut groups: BTreeMap<&str, Vec<&Recording>> = BTreeMap::new();
    for recording in recordings {
        groups.entry(recording.user_id.as_str()).or_default().push(recording);
    }

    let mut scores: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for record in merged {
        if let Some(score) = record.score() {
            scores.entry(record.user_id_recording()).or_default().push(score);
        }
    }

    let mut users: Vec<UserSummary> = groups
        .into_iter()
        .map(|(user_id, group)| {
            let wins = group.iter().filter(|r| r.outcome.is_won()).count();
            let user_scores = scores.get(user_id).map_or(&[][..], Vec::as_slice);
            UserSummary {
                user_id: user_id.to_string(),
                recordings: group.len(),
                wins,
                win_rate: percentage(wins, group.len()),
                avg_duration_minutes: mean(group.iter().map(|r| r.derived.duration_minutes)),
                avg_words: mean(group.iter().map(|r| r.counts.rep_word_count)),
                avg_rep_questions: mean(group.iter().map(|r| r.counts.rep_questions)),
                avg_customer_questions: mean(group.iter().map(|r| r.counts.customer_questions)),
                avg_skill_score: mean(user_scores.iter().copied()),
                scored_evaluations: user_scores.len(),
            }
        })
        .collect();

    users.sort_by(|a, b| desc_nan_last(a.win_rate, b.win_rate));
    users
}

/// Gap between the best and worst win rates
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WinRateSpread {
    /// Highest per-user win rate
    pub highest: f64,
    /// Lowest per-user win rate
    pub lowest: f64,
    /// highest / lowest; NaN when the lowest is zero
    pub ratio: f64,
}

/// Spread of per-user win rates, `None` without users.
#[must_use]
pub fn win_rate_spread(users: &[UserSummary]) -> Option<WinRateSpread> {
    let rates: Vec<f64> = users.iter().map(|u| u.win_rate).filter(|r| !r.is_nan()).collect();
    if rates.is_empty() {
        return None;
    }
    let highest = rates.iter().copied().fold(f64::NAN, f64::max);
    let lowest = rates.iter().copied().fold(f64::NAN, f64::min);
    let ratio = if lowest == 0.0 { f64::NAN } else { highest / lowest };
    Some(WinRateSpread { highest, lowest, ratio })
}

/// Headline numbers for the whole dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetOverview {
    /// Recordings loaded
    pub total_recordings: usize,
    /// Distinct users among the recordings
    pub total_users: usize,
    /// Evaluations loaded
    pub total_evaluations: usize,
    /// Distinct skill names
    pub unique_skills: usize,
    /// Won recordings over all recordings, in percent
    pub overall_win_rate: f64,
    /// Mean duration in minutes
    pub avg_duration_minutes: f64,
    /// Mean of all usable scores
    pub avg_skill_score: f64,
    /// Earliest recording date
    pub first_date: Option<NaiveDate>,
    /// Latest recording date
    pub last_date: Option<NaiveDate>,
}

/// Dataset-wide overview.
#[must_use]
pub fn overview(recordings: &[Recording], evaluations: &[Evaluation]) -> DatasetOverview {
    let users: BTreeSet<&str> = recordings.iter().map(|r| r.user_id.as_str()).collect();
    let skills: BTreeSet<&str> = evaluations.iter().map(|e| e.skill_name.as_str()).collect();
    let wins = recordings.iter().filter(|r| r.outcome.is_won()).count();

    DatasetOverview {
        total_recordings: recordings.len(),
        total_users: users.len(),
        total_evaluations: evaluations.len(),
        unique_skills: skills.len(),
        overall_win_rate: percentage(wins, recordings.len()),
        avg_duration_minutes: mean(recordings.iter().map(|r| r.derived.duration_minutes)),
        avg_skill_score: mean(evaluations.iter().filter_map(|e| e.score)),
        first_date: recordings.iter().filter_map(Recording::date).min(),
        last_date: recordings.iter().filter_map(Recording::date).max(),
    }
}

/// Deep-dive numbers for a single skill
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FocusSkillStats {
    /// Skill name
    pub skill: String,
    /// Mean score
    pub mean: f64,
    /// Sample standard deviation
    pub std: f64,
    /// Mean score on won calls
    pub won_mean: f64,
    /// Mean score on lost calls
    pub lost_mean: f64,
    /// Evaluations scored exactly 1
    pub score_1_count: usize,
    /// Evaluations scored exactly 5
    pub score_5_count: usize,
    /// All evaluations of the skill
    pub total: usize,
}

impl FocusSkillStats {
    /// Share of evaluations scored 1, in percent
    #[must_use]
    pub fn score_1_pct(&self) -> f64 {
        percentage(self.score_1_count, self.total)
    }

    /// Share of evaluations scored 5, in percent
    #[must_use]
    pub fn score_5_pct(&self) -> f64 {
        percentage(self.score_5_count, self.total)
    }
}

/// Statistics for one named skill.
#[must_use]
pub fn focus_skill_stats(
    skill: &str,
    evaluations: &[Evaluation],
    merged: &[MergedRecord<'_>],
) -> FocusSkillStats {
    let of_skill: Vec<&Evaluation> = evaluations.iter().filter(|e| e.skill_name == skill).collect();
    let scores = || of_skill.iter().filter_map(|e| e.score);
    let merged_mean = |outcome: &Outcome| {
        mean(
            merged
                .iter()
                .filter(|m| m.skill_name() == skill && m.outcome() == outcome)
                .filter_map(MergedRecord::score),
        )
    };

    FocusSkillStats {
        skill: skill.to_string(),
        mean: mean(scores()),
        std: sample_std(scores()),
        won_mean: merged_mean(&Outcome::Won),
        lost_mean: merged_mean(&Outcome::Lost),
        score_1_count: scores().filter(|s| *s == 1.0).count(),
        score_5_count: scores().filter(|s| *s == 5.0).count(),
        total: of_skill.len(),
    }
}

/// Frequency of one score value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBin {
    /// Score value
    pub score: f64,
    /// Evaluations with that score
    pub count: usize,
}

/// Distribution of all usable scores
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreDistribution {
    /// One bin per distinct score, ascending
    pub bins: Vec<ScoreBin>,
    /// Mean of all usable scores
    pub mean: f64,
    /// Evaluations without a usable score
    pub missing: usize,
}

/// Histogram of exact score values.
#[must_use]
pub fn score_distribution(evaluations: &[Evaluation]) -> ScoreDistribution {
    let mut scores: Vec<f64> = evaluations.iter().filter_map(|e| e.score).collect();
    scores.sort_by(f64::total_cmp);

    let mut bins: Vec<ScoreBin> = Vec::new();
    for score in &scores {
        match bins.last_mut() {
            Some(bin) if bin.score == *score => bin.count += 1,
            _ => bins.push(ScoreBin { score: *score, count: 1 }),
        }
    }

    ScoreDistribution {
        bins,
        mean: mean(scores.iter().copied()),
        missing: evaluations.len() - scores.len(),
    }
}

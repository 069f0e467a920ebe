//! Calendar-day buckets and early/late period comparison.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::merge::MergedRecord;
use crate::models::Recording;
use crate::stats::{mean, percentage};

/// Win rate and score level for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    /// Calendar day
    pub date: NaiveDate,
    /// Recordings created that day
    pub recordings: usize,
    /// Won recordings created that day
    pub wins: usize,
    /// wins / recordings × 100; NaN on days with evaluations only
    pub win_rate: f64,
    /// Merged evaluations dated that day that carried a score
    pub scored_evaluations: usize,
    /// Mean of those scores; NaN when there are none
    pub mean_score: f64,
}

/// Bucket recordings by `dateCreated` and merged evaluations by
/// `recordingdate`, one row per day that has either.
#[must_use]
pub fn daily_summary(recordings: &[Recording], merged: &[MergedRecord<'_>]) -> Vec<DailySummary> {
    #[derive(Default)]
    struct Bucket {
        recordings: usize,
        wins: usize,
        scores: Vec<f64>,
    }

    let mut buckets: BTreeMap<NaiveDate, Bucket> = BTreeMap::new();
    for recording in recordings {
        if let Some(date) = recording.date() {
            let bucket = buckets.entry(date).or_default();
            bucket.recordings += 1;
            if recording.outcome.is_won() {
                bucket.wins += 1;
            }
        }
    }
    for record in merged {
        if let (Some(date), Some(score)) = (record.evaluation_date(), record.score()) {
            buckets.entry(date).or_default().scores.push(score);
        }
    }

    buckets
        .into_iter()
        .map(|(date, bucket)| DailySummary {
            date,
            recordings: bucket.recordings,
            wins: bucket.wins,
            win_rate: percentage(bucket.wins, bucket.recordings),
            scored_evaluations: bucket.scores.len(),
            mean_score: mean(bucket.scores),
        })
        .collect()
}

/// Fixed date cutoffs for the early and late windows
///
/// Both bounds are inclusive: early is `date <= early_end`, late is
/// `date >= late_start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodWindow {
    /// Last day of the early window
    pub early_end: NaiveDate,
    /// First day of the late window
    pub late_start: NaiveDate,
}

/// Outcome and score level within one window
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodStats {
    /// Recordings in the window
    pub recordings: usize,
    /// Won recordings in the window
    pub wins: usize,
    /// Win rate in percent; NaN for an empty window
    pub win_rate: f64,
    /// Mean merged score in the window; NaN when none
    pub mean_score: f64,
}

/// Early-versus-late comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodComparison {
    /// The cutoffs used
    pub window: PeriodWindow,
    /// Early window
    pub early: PeriodStats,
    /// Late window
    pub late: PeriodStats,
}

impl PeriodComparison {
    /// Percentage points lost between the windows
    #[must_use]
    pub fn win_rate_decline(&self) -> f64 {
        self.early.win_rate - self.late.win_rate
    }

    /// Score points lost between the windows
    #[must_use]
    pub fn score_decline(&self) -> f64 {
        self.early.mean_score - self.late.mean_score
    }

    /// Score decline relative to the early mean, in percent
    #[must_use]
    pub fn score_decline_pct(&self) -> f64 {
        if self.early.mean_score == 0.0 {
            f64::NAN
        } else {
            self.score_decline() / self.early.mean_score * 100.0
        }
    }
}

fn period_stats<'r>(
    recordings: impl Iterator<Item = &'r Recording>,
    scores: impl Iterator<Item = f64>,
) -> PeriodStats {
    let (count, wins) = recordings.fold((0, 0), |(count, wins), r| {
        (count + 1, wins + usize::from(r.outcome.is_won()))
    });
    PeriodStats {
        recordings: count,
        wins,
        win_rate: percentage(wins, count),
        mean_score: mean(scores),
    }
}

/// Compare the early and late windows.
///
/// Win rates come from recordings bucketed by `dateCreated`; scores from
/// merged rows bucketed by the evaluation date. Undated rows are skipped.
#[must_use]
pub fn period_comparison(
    recordings: &[Recording],
    merged: &[MergedRecord<'_>],
    window: &PeriodWindow,
) -> PeriodComparison {
    let stats_where = |in_window: &dyn Fn(NaiveDate) -> bool| {
        period_stats(
            recordings.iter().filter(|r| r.date().is_some_and(in_window)),
            merged
                .iter()
                .filter(|m| m.evaluation_date().is_some_and(in_window))
                .filter_map(MergedRecord::score),
        )
    };

    PeriodComparison {
        window: *window,
        early: stats_where(&|d: NaiveDate| d <= window.early_end),
        late: stats_where(&|d: NaiveDate| d >= window.late_start),
    }
}

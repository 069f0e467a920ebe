//! Skill-by-skill Pearson correlation across recordings.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::merge::MergedRecord;
use crate::stats::mean;

/// Recording × skill matrix of mean scores (NaN where a recording lacks a
/// scored evaluation for the skill)
#[derive(Debug, Clone, PartialEq)]
pub struct SkillPivot {
    /// Recording ids, one per row, sorted
    pub recordings: Vec<String>,
    /// Skill names, one per column, sorted
    pub skills: Vec<String>,
    /// `values[row][column]`
    pub values: Vec<Vec<f64>>,
}

impl SkillPivot {
    /// One column of the pivot
    #[must_use]
    pub fn column(&self, index: usize) -> Vec<f64> {
        self.values.iter().map(|row| row[index]).collect()
    }
}

/// Pivot merged rows to one row per recording and one column per skill.
///
/// Duplicate (recording, skill) entries are averaged.
#[must_use]
pub fn skill_pivot(merged: &[MergedRecord<'_>]) -> SkillPivot {
    let mut cells: BTreeMap<(&str, &str), Vec<f64>> = BTreeMap::new();
    let mut skills = BTreeSet::new();
    let mut recordings = BTreeSet::new();

    for record in merged {
        if let Some(score) = record.score() {
            recordings.insert(record.recording_id());
            skills.insert(record.skill_name());
            cells
                .entry((record.recording_id(), record.skill_name()))
                .or_default()
                .push(score);
        }
    }

    let values = recordings
        .iter()
        .map(|recording| {
            skills
                .iter()
                .map(|skill| {
                    cells
                        .get(&(*recording, *skill))
                        .map_or(f64::NAN, |scores| mean(scores.iter().copied()))
                })
                .collect()
        })
        .collect();

    SkillPivot {
        recordings: recordings.into_iter().map(str::to_string).collect(),
        skills: skills.into_iter().map(str::to_string).collect(),
        values,
    }
}

/// Pearson correlation over the positions where both inputs are non-NaN.
///
/// NaN when fewer than two such positions exist or either side has zero
/// variance over them.
#[must_use]
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter(|(x, y)| !x.is_nan() && !y.is_nan())
        .map(|(x, y)| (*x, *y))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }

    let mean_x = mean(pairs.iter().map(|p| p.0));
    let mean_y = mean(pairs.iter().map(|p| p.1));
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    // sqrt of the product keeps identical columns at exactly 1.0
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// Symmetric skill correlation matrix
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    /// Skill names, in row/column order
    pub skills: Vec<String>,
    /// `values[i][j]` is the correlation of skill i with skill j
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Correlation between two named skills, `None` if either is unknown
    #[must_use]
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.skills.iter().position(|s| s == a)?;
        let j = self.skills.iter().position(|s| s == b)?;
        Some(self.values[i][j])
    }

    /// Off-diagonal pairs sorted by correlation, strongest first (NaN skipped)
    #[must_use]
    pub fn strongest_pairs(&self) -> Vec<(&str, &str, f64)> {
        let mut pairs: Vec<(&str, &str, f64)> = Vec::new();
        for (i, a) in self.skills.iter().enumerate() {
            for (j, b) in self.skills.iter().enumerate().skip(i + 1) {
                let r = self.values[i][j];
                if !r.is_nan() {
                    pairs.push((a.as_str(), b.as_str(), r));
                }
            }
        }
        pairs.sort_by(|x, y| y.2.total_cmp(&x.2));
        pairs
    }
}

/// Pairwise Pearson correlation between skills across recordings.
#[must_use]
pub fn skill_correlations(merged: &[MergedRecord<'_>]) -> CorrelationMatrix {
    let pivot = skill_pivot(merged);
    let columns: Vec<Vec<f64>> = (0..pivot.skills.len()).map(|i| pivot.column(i)).collect();

    let values = columns
        .iter()
        .map(|a| columns.iter().map(|b| pearson(a, b)).collect())
        .collect();

    CorrelationMatrix { skills: pivot.skills, values }
}

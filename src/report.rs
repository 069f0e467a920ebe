//! Plain-text rendering of an [`AnalysisReport`].

use std::io::{self, Write};

use crate::models::Outcome;
use crate::pipeline::AnalysisReport;
use crate::utils::fmt_num;

fn section(out: &mut impl Write, title: &str) -> io::Result<()> {
    let rule = "=".repeat(80);
    writeln!(out)?;
    writeln!(out, "{rule}")?;
    writeln!(out, "{title}")?;
    writeln!(out, "{rule}")
}

/// Write the main analysis: executive summary, skill-by-outcome, skill
/// ranking, focus skill, question strategy and per-user performance.
pub fn write_analysis(report: &AnalysisReport, out: &mut impl Write) -> io::Result<()> {
    let o = &report.overview;
    section(out, "EXECUTIVE SUMMARY")?;
    writeln!(out, "Total Recordings: {}", o.total_recordings)?;
    writeln!(out, "Total Users: {}", o.total_users)?;
    writeln!(out, "Total Skill Evaluations: {}", o.total_evaluations)?;
    writeln!(out, "Unique Skills: {}", o.unique_skills)?;
    writeln!(out, "Overall Win Rate: {}%", fmt_num(o.overall_win_rate, 2))?;
    writeln!(out, "Average Call Duration: {} minutes", fmt_num(o.avg_duration_minutes, 2))?;
    writeln!(out, "Average Skill Score: {}/5.0", fmt_num(o.avg_skill_score, 2))?;
    if let (Some(first), Some(last)) = (o.first_date, o.last_date) {
        writeln!(out, "Date Range: {first} to {last}")?;
    }

    let p = &report.periods;
    writeln!(out)?;
    writeln!(out, "Early Period Win Rate (through {}): {}%", p.window.early_end, fmt_num(p.early.win_rate, 2))?;
    writeln!(out, "Late Period Win Rate (from {}): {}%", p.window.late_start, fmt_num(p.late.win_rate, 2))?;
    writeln!(out, "Win Rate Decline: {} percentage points", fmt_num(p.win_rate_decline(), 2))?;
    writeln!(out, "Early Period Skill Score: {}", fmt_num(p.early.mean_score, 2))?;
    writeln!(out, "Late Period Skill Score: {}", fmt_num(p.late.mean_score, 2))?;
    writeln!(
        out,
        "Skill Score Decline: {} points ({}%)",
        fmt_num(p.score_decline(), 2),
        fmt_num(p.score_decline_pct(), 1)
    )?;

    section(out, "SKILL SCORES BY OUTCOME")?;
    let table = &report.skill_outcome;
    write!(out, "{:<40}", "skill")?;
    for outcome in &table.outcomes {
        write!(out, "{outcome:>10}")?;
    }
    writeln!(out)?;
    for row in &table.rows {
        write!(out, "{:<40}", row.skill)?;
        for cell in &row.cells {
            write!(out, "{:>10}", fmt_num(cell.mean, 2))?;
        }
        writeln!(out)?;
    }
    writeln!(out)?;
    for row in &table.rows {
        if let Some(improvement) = table.improvement(&row.skill) {
            writeln!(
                out,
                "{}: Won={}, Lost={}, Improvement={}%",
                row.skill,
                fmt_num(table.score(&row.skill, Outcome::Won.label()), 2),
                fmt_num(table.score(&row.skill, Outcome::Lost.label()), 2),
                fmt_num(improvement, 0)
            )?;
        }
    }

    section(out, "AVERAGE SKILL SCORES")?;
    writeln!(out, "{:<40}{:>8}{:>8}{:>8}", "skill", "mean", "std", "count")?;
    for s in &report.skill_summary {
        writeln!(out, "{:<40}{:>8}{:>8}{:>8}", s.skill, fmt_num(s.mean, 2), fmt_num(s.std, 2), s.count)?;
    }

    let f = &report.focus_skill;
    writeln!(out)?;
    writeln!(out, "'{}' Statistics:", f.skill)?;
    writeln!(out, "  Average Score: {}/5.0", fmt_num(f.mean, 2))?;
    writeln!(out, "  Standard Deviation: {}", fmt_num(f.std, 2))?;
    writeln!(out, "  Won Deals Average: {}/5.0", fmt_num(f.won_mean, 2))?;
    writeln!(out, "  Lost Deals Average: {}/5.0", fmt_num(f.lost_mean, 2))?;
    writeln!(out, "  Score 1 Frequency: {} ({}%)", f.score_1_count, fmt_num(f.score_1_pct(), 1))?;
    writeln!(out, "  Score 5 Frequency: {} ({}%)", f.score_5_count, fmt_num(f.score_5_pct(), 1))?;

    section(out, "QUESTION STRATEGY BY OUTCOME")?;
    for profile in &report.outcome_profiles {
        writeln!(out, "{} ({} recordings):", profile.outcome, profile.recordings)?;
        writeln!(out, "  Rep Questions: {}", fmt_num(profile.avg_rep_questions, 2))?;
        writeln!(out, "  Customer Questions: {}", fmt_num(profile.avg_customer_questions, 2))?;
        writeln!(
            out,
            "  Ratio: {} rep questions per customer question",
            fmt_num(profile.rep_per_customer_question, 2)
        )?;
    }

    section(out, "PERFORMANCE BY REP")?;
    writeln!(out, "{:<32}{:>12}{:>10}{:>12}", "user", "recordings", "win rate", "avg score")?;
    for user in &report.users {
        writeln!(
            out,
            "{:<32}{:>12}{:>10}{:>12}",
            user.user_id,
            user.recordings,
            fmt_num(user.win_rate, 1),
            fmt_num(user.avg_skill_score, 2)
        )?;
    }
    if let Some(spread) = report.win_rate_spread {
        writeln!(out)?;
        writeln!(out, "Win Rate Range:")?;
        writeln!(out, "  Highest: {}%", fmt_num(spread.highest, 1))?;
        writeln!(out, "  Lowest: {}%", fmt_num(spread.lowest, 1))?;
        writeln!(out, "  Difference: {}x", fmt_num(spread.ratio, 1))?;
    }

    Ok(())
}

/// Write the supplementary analysis: skill correlations, keyword tallies,
/// talk-time profile and data quality.
pub fn write_deep_analysis(report: &AnalysisReport, out: &mut impl Write) -> io::Result<()> {
    section(out, "SKILL CORRELATIONS")?;
    let matrix = &report.correlations;
    for (i, skill) in matrix.skills.iter().enumerate() {
        write!(out, "{:<40}", skill)?;
        for value in &matrix.values[i] {
            write!(out, "{:>7}", fmt_num(*value, 2))?;
        }
        writeln!(out)?;
    }
    writeln!(out)?;
    writeln!(out, "Strongest pairs:")?;
    for (a, b, r) in matrix.strongest_pairs().into_iter().take(5) {
        writeln!(out, "  {a} / {b}: {}", fmt_num(r, 3))?;
    }

    section(out, "RECOMMENDATION AND IMPACT KEYWORDS")?;
    for (label, tally) in [
        ("Recommendations", report.recommendation_keywords),
        ("Impacts", report.impact_keywords),
    ] {
        writeln!(out, "{label}: {} texts", tally.total)?;
        writeln!(out, "  improvement keywords: {}", tally.improvement)?;
        writeln!(out, "  continuation keywords: {}", tally.continuation)?;
    }

    section(out, "TALK TIME BY OUTCOME")?;
    for profile in &report.outcome_profiles {
        writeln!(
            out,
            "{}: speaking ratio {}, questions ratio {}, duration {} min",
            profile.outcome,
            fmt_num(profile.avg_speaking_ratio, 3),
            fmt_num(profile.avg_questions_ratio, 3),
            fmt_num(profile.avg_duration_minutes, 1)
        )?;
    }

    let q = &report.quality;
    section(out, "DATA QUALITY")?;
    writeln!(
        out,
        "Recordings: {} rows, {} bad timestamps, {} skipped",
        q.recordings.rows, q.recordings.bad_timestamps, q.recordings.skipped_rows
    )?;
    writeln!(
        out,
        "Evaluations: {} rows, {} bad timestamps, {} missing scores, {} malformed metadata, {} skipped",
        q.evaluations.rows,
        q.evaluations.bad_timestamps,
        q.evaluations.missing_scores,
        q.evaluations.malformed_metadata,
        q.evaluations.skipped_rows
    )?;
    writeln!(
        out,
        "Join: {} merged rows, {} recordings and {} evaluations unmatched",
        q.join.merged_rows, q.join.unmatched_recordings, q.join.unmatched_evaluations
    )?;
    Ok(())
}

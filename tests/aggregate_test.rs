//! Tests for grouped statistics

mod common;

use common::{approx, datasets, DISCOVER};
use sales_call_insights::aggregate::{
    focus_skill_stats, outcome_distribution, outcome_profiles, overview, score_distribution,
    skill_outcome_scores, skill_summary, user_summary, weakest_skill, win_rate_spread,
};
use sales_call_insights::loader::{read_evaluations, read_recordings};
use sales_call_insights::merge::merge;

#[test]
fn test_skill_summary_sorted_by_mean() {
    let data = datasets();
    let summary = skill_summary(&data.evaluations);
    let skills: Vec<&str> = summary.iter().map(|s| s.skill.as_str()).collect();
    assert_eq!(skills, vec!["Rapport", DISCOVER, "Closing"]);

    let discover = &summary[1];
    assert!(approx(discover.mean, 2.5));
    assert!(approx(discover.std, (5.0_f64 / 3.0).sqrt()));
    assert_eq!(discover.count, 4);
    assert!(approx(discover.min, 1.0));
    assert!(approx(discover.max, 4.0));
}

#[test]
fn test_unscored_skill_keeps_its_rows() {
    let data = datasets();
    let summary = skill_summary(&data.evaluations);
    let closing = summary.iter().find(|s| s.skill == "Closing").unwrap();
    assert_eq!(closing.count, 0);
    assert_eq!(closing.rows, 1);
    assert!(closing.mean.is_nan());
    assert!(closing.std.is_nan());
}

#[test]
fn test_skill_rows_account_for_every_evaluation() {
    let data = datasets();
    let summary = skill_summary(&data.evaluations);
    let rows: usize = summary.iter().map(|s| s.rows).sum();
    assert_eq!(rows, data.evaluations.len());
    assert_eq!(rows, 7);
}

#[test]
fn test_weakest_skill_ignores_nan() {
    let data = datasets();
    let summary = skill_summary(&data.evaluations);
    assert_eq!(weakest_skill(&summary).unwrap().skill, DISCOVER);
}

#[test]
fn test_absent_skill_outcome_is_zero() {
    let data = datasets();
    let table = skill_outcome_scores(&data.merged());
    assert_eq!(table.outcomes, vec!["lost", "won"]);

    // Rapport was only ever scored on a won call
    assert_eq!(table.score("Rapport", "lost"), 0.0);
    assert_eq!(table.cell("Rapport", "lost").count, 0);
    assert!(approx(table.score("Rapport", "won"), 5.0));
}

#[test]
fn test_present_but_unscored_combination_is_nan() {
    let data = datasets();
    let table = skill_outcome_scores(&data.merged());
    let cell = table.cell("Closing", "won");
    assert!(cell.mean.is_nan());
    assert_eq!(cell.rows, 1);
    assert_eq!(table.score("Closing", "lost"), 0.0);
}

#[test]
fn test_improvement_requires_positive_lost_mean() {
    let data = datasets();
    let table = skill_outcome_scores(&data.merged());
    assert!(approx(table.improvement(DISCOVER).unwrap(), (3.5 - 1.5) / 1.5 * 100.0));
    assert!(table.improvement("Rapport").is_none());
    assert_eq!(table.entries().len(), 6);
}

#[test]
fn test_outcome_distribution() {
    let data = datasets();
    let distribution = outcome_distribution(&data.recordings);
    assert_eq!(distribution[0].outcome, "lost");
    assert_eq!(distribution[0].count, 3);
    assert_eq!(distribution[1].outcome, "won");
    assert_eq!(distribution[1].count, 2);
}

#[test]
fn test_outcome_profiles_skip_nan_ratios() {
    let data = datasets();
    let profiles = outcome_profiles(&data.recordings);
    let lost = profiles.iter().find(|p| p.outcome == "lost").unwrap();
    assert_eq!(lost.recordings, 3);
    assert!(approx(lost.avg_rep_questions, 3.0));
    // r2 has zero conversation time and drops out of the mean
    assert!(approx(lost.avg_speaking_ratio, 0.625));

    let won = profiles.iter().find(|p| p.outcome == "won").unwrap();
    assert!(approx(won.rep_per_customer_question, 9.0 / 3.5));
}

#[test]
fn test_user_summary() {
    let data = datasets();
    let users = user_summary(&data.recordings, &data.merged());
    let ids: Vec<&str> = users.iter().map(|u| u.user_id.as_str()).collect();
    assert_eq!(ids, vec!["alice", "bob", "carol"]);

    let alice = &users[0];
    assert_eq!(alice.recordings, 2);
    assert_eq!(alice.wins, 1);
    assert!(approx(alice.win_rate, 50.0));
    assert!(approx(alice.avg_skill_score, 11.0 / 3.0));

    let carol = &users[2];
    assert!(approx(carol.win_rate, 0.0));
    assert!(carol.avg_skill_score.is_nan());
    assert!(carol.avg_duration_minutes.is_nan());
}

#[test]
fn test_win_rate_spread_with_zero_lowest() {
    let data = datasets();
    let users = user_summary(&data.recordings, &data.merged());
    let spread = win_rate_spread(&users).unwrap();
    assert!(approx(spread.highest, 50.0));
    assert!(approx(spread.lowest, 0.0));
    assert!(spread.ratio.is_nan());
    assert!(win_rate_spread(&[]).is_none());
}

#[test]
fn test_overview() {
    let data = datasets();
    let o = overview(&data.recordings, &data.evaluations);
    assert_eq!(o.total_recordings, 5);
    assert_eq!(o.total_users, 3);
    assert_eq!(o.total_evaluations, 7);
    assert_eq!(o.unique_skills, 3);
    assert!(approx(o.overall_win_rate, 40.0));
    assert!(approx(o.avg_duration_minutes, 7.5));
    assert!(approx(o.avg_skill_score, 19.0 / 6.0));
    assert_eq!(o.first_date.unwrap().to_string(), "2025-08-06");
    assert_eq!(o.last_date.unwrap().to_string(), "2025-09-25");
}

#[test]
fn test_focus_skill_stats() {
    let data = datasets();
    let stats = focus_skill_stats(DISCOVER, &data.evaluations, &data.merged());
    assert!(approx(stats.mean, 2.5));
    assert!(approx(stats.won_mean, 3.5));
    assert!(approx(stats.lost_mean, 1.5));
    assert_eq!(stats.score_1_count, 1);
    assert_eq!(stats.score_5_count, 0);
    assert_eq!(stats.total, 4);
    assert!(approx(stats.score_1_pct(), 25.0));
}

#[test]
fn test_unknown_focus_skill_is_empty_not_error() {
    let data = datasets();
    let stats = focus_skill_stats("Negotiation", &data.evaluations, &data.merged());
    assert_eq!(stats.total, 0);
    assert!(stats.mean.is_nan());
    assert!(stats.score_1_pct().is_nan());
}

#[test]
fn test_score_distribution() {
    let data = datasets();
    let distribution = score_distribution(&data.evaluations);
    let bins: Vec<(f64, usize)> = distribution.bins.iter().map(|b| (b.score, b.count)).collect();
    assert_eq!(bins, vec![(1.0, 1), (2.0, 1), (3.0, 1), (4.0, 2), (5.0, 1)]);
    assert_eq!(distribution.missing, 1);
}

#[test]
fn test_empty_inputs_do_not_panic() {
    let (recordings, _) = read_recordings(&b"recordingid,userId,dateCreated,durationInMilliseconds,conversationTime,repSpeakingTime,repWordCount,repQuestionsCount,customerQuestionsCount,outcome\n"[..]).unwrap();
    let (evaluations, _) = read_evaluations(&b"recordingid,userId,recordingdate,skillName,score,scoringMetadata\n"[..]).unwrap();
    let merged = merge(&recordings, &evaluations);

    assert!(skill_summary(&evaluations).is_empty());
    assert!(skill_outcome_scores(&merged).rows.is_empty());
    assert!(user_summary(&recordings, &merged).is_empty());
    let o = overview(&recordings, &evaluations);
    assert!(o.overall_win_rate.is_nan());
    assert!(o.first_date.is_none());
}

use crate::analytics::domain::AgentId;
use crate::analytics::scoring::Precision;
use crate::analytics::validation::{
    analyze_quartiles, build_report, monthly_trend, pearson, validate_thresholds, AgentSample,
    ScoredCall, ValidationSummary,
};

use super::common::at;

fn sample(id: &str, score: f64, total: usize, won: usize) -> AgentSample {
    AgentSample::new(AgentId::from(id), id.to_uppercase(), score, total, won)
}

fn population(n: usize) -> Vec<AgentSample> {
    (0..n)
        .map(|index| {
            let score = ((index * 37) % 101) as f64;
            sample(&format!("a{index}"), score, 10, index % 11)
        })
        .collect()
}

#[test]
fn quartiles_partition_the_population() {
    for n in 0..=23 {
        let analysis = analyze_quartiles(&population(n));
        let sizes: usize = analysis.groups().iter().map(|group| group.sample_size).sum();
        assert_eq!(sizes, n, "population of {n}");
    }
}

#[test]
fn quartile_groups_use_ceiling_size() {
    let samples = population(5);
    let analysis = analyze_quartiles(&samples);
    let sizes: Vec<_> = analysis.groups().iter().map(|group| group.sample_size).collect();
    assert_eq!(sizes, vec![2, 2, 1, 0]);
    assert_eq!(analysis.q1.range, "Bottom 25%");
    assert_eq!(analysis.q4.range, "Top 25%");
    assert_eq!(analysis.q4.avg_score, 0.0);
}

#[test]
fn quartiles_sort_ascending_by_score() {
    let samples = vec![
        sample("high", 90.0, 10, 9),
        sample("low", 20.0, 10, 1),
        sample("mid", 60.0, 10, 5),
        sample("top", 95.0, 10, 10),
    ];
    let analysis = analyze_quartiles(&samples);
    assert_eq!(analysis.q1.avg_score, 20.0);
    assert_eq!(analysis.q1.avg_win_rate, 10.0);
    assert_eq!(analysis.q4.avg_score, 95.0);
}

#[test]
fn thresholds_are_cumulative() {
    let samples = vec![sample("a", 85.0, 10, 8), sample("b", 65.0, 10, 4), sample("c", 30.0, 10, 1)];
    let results = validate_thresholds(&samples);

    assert_eq!(results[0].sample_size, 1);
    assert!(results[0].meets_expectation);
    assert_eq!(results[1].sample_size, 2);
    assert_eq!(results[1].actual_win_rate, 60.0);
    assert!(results[1].meets_expectation);
    assert_eq!(results[2].sample_size, 3);
    assert_eq!(results[2].actual_win_rate, 43.0);
    assert!(results[2].meets_expectation);
}

#[test]
fn threshold_expectation_uses_unrounded_rate() {
    // Mean win rate 49.6 rounds to 50 but still misses the 50% floor.
    let samples = vec![sample("a", 70.0, 1000, 496)];
    let results = validate_thresholds(&samples);
    assert_eq!(results[1].actual_win_rate, 50.0);
    assert!(!results[1].meets_expectation);
}

#[test]
fn empty_threshold_buckets_report_zero() {
    let results = validate_thresholds(&[]);
    assert!(results.iter().all(|result| result.actual_win_rate == 0.0));
    assert!(!results[2].meets_expectation);
}

#[test]
fn trend_groups_by_utc_month() {
    let calls = vec![
        ScoredCall { started_at: at(2025, 4, 1, 0), overall_score: 80.0, won: true },
        ScoredCall { started_at: at(2025, 3, 31, 23), overall_score: 60.0, won: false },
        ScoredCall { started_at: at(2025, 3, 2, 8), overall_score: 71.0, won: true },
    ];
    let trend = monthly_trend(&calls);
    let months: Vec<_> = trend.iter().map(|point| point.month.as_str()).collect();
    assert_eq!(months, vec!["2025-03", "2025-04"]);
    assert_eq!(trend[0].avg_score, 66.0);
    assert_eq!(trend[0].win_rate, 50.0);
    assert_eq!(trend[0].sample_size, 2);
}

#[test]
fn verdict_requires_correlation_above_threshold() {
    let summary = ValidationSummary::from_correlation(0.3, 10);
    assert!(!summary.is_valid);

    let summary = ValidationSummary::from_correlation(0.31, 10);
    assert!(summary.is_valid);
    assert!(!summary.insufficient_sample());
}

#[test]
fn small_samples_are_flagged() {
    let report = build_report(vec![sample("solo", 80.0, 6, 3)], &[], Precision::Exact);
    assert_eq!(report.correlation, 0.0);
    assert_eq!(report.sample_size, 1);
    assert!(!report.summary.is_valid);
    assert!(report.summary.insufficient_sample());
}

#[test]
fn correlated_population_validates() {
    let samples = vec![
        sample("a", 40.0, 10, 2),
        sample("b", 55.0, 10, 4),
        sample("c", 70.0, 10, 5),
        sample("d", 90.0, 10, 8),
    ];
    let report = build_report(samples, &[], Precision::Exact);
    assert!(report.correlation > 0.9);
    assert!(report.summary.is_valid);

    let pairs: Vec<_> = report
        .agents
        .iter()
        .map(|agent| (agent.overall_score, agent.win_rate))
        .collect();
    assert_eq!(report.correlation, pearson(&pairs));
}

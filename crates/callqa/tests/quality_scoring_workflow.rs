use std::sync::Arc;

use callqa::analytics::timeframe::resolve_range;
use callqa::analytics::validation::CorrelationStrength;
use callqa::analytics::{
    AnalyticsService, CallId, CallListQuery, CallOutcome, DateRange, InMemoryStore, Precision,
    SnapshotLoader, Timeframe,
};
use callqa::config::AnalysisConfig;
use chrono::{NaiveDate, Utc};

fn service() -> AnalyticsService<InMemoryStore> {
    let data = include_bytes!("fixtures/dataset.json");
    let snapshot = SnapshotLoader::from_reader(&data[..]).expect("fixture snapshot loads");
    AnalyticsService::new(Arc::new(InMemoryStore::new(snapshot)), AnalysisConfig::default())
}

fn january() -> DateRange {
    resolve_range(
        Timeframe::Custom,
        NaiveDate::from_ymd_opt(2025, 1, 1),
        NaiveDate::from_ymd_opt(2025, 1, 31),
        Utc::now(),
    )
}

#[test]
fn call_list_scores_each_call_in_display_mode() {
    let page = service()
        .list_calls(&CallListQuery::default())
        .expect("call list");
    assert_eq!(page.pagination.total, 20);
    assert!(!page.pagination.has_more);
    assert_eq!(page.data[0].id.0, "a4-c5");
    assert_eq!(page.data[0].business_grade, "Low");

    let skipped_opening = page
        .data
        .iter()
        .find(|record| record.id.0 == "a2-c5")
        .expect("a2-c5 listed");
    assert_eq!(skipped_opening.scores.process_score, 23.0);
    assert_eq!(skipped_opening.scores.skills_score, 70.0);
    assert_eq!(skipped_opening.scores.overall_quality_score, 56.0);
}

#[test]
fn missing_mandatory_opening_is_reported_on_detail() {
    let detail = service()
        .call_detail(&CallId::from("a2-c5"))
        .expect("call detail");
    let details = detail.record.details.expect("details");
    let missing: Vec<_> = details
        .missing_signals
        .iter()
        .map(|signal| signal.tag.0.as_str())
        .collect();
    assert_eq!(missing, vec!["opening_complete"]);
    assert_eq!(detail.outcome, CallOutcome::Lost);
    assert!(!detail.is_onsite_completed);
}

#[test]
fn detail_occurrences_use_raw_signal_offsets() {
    let detail = service()
        .call_detail(&CallId::from("a1-c1"))
        .expect("call detail");
    let started = detail.record.timestamp.timestamp_millis();
    let details = detail.record.details.expect("details");
    let pitch = details
        .signals
        .iter()
        .find(|signal| signal.tag.0 == "value_pitch")
        .expect("pitch assessed");
    let offsets: Vec<_> = pitch
        .occurrences
        .iter()
        .filter_map(|occurrence| occurrence.timestamp)
        .map(|millis| millis - started)
        .collect();
    assert_eq!(offsets, vec![14_200, 47_900]);
    assert_eq!(details.raw_signals.len(), 4);
}

#[test]
fn pooled_agent_scores_hide_single_call_penalties() {
    let rows = service().agent_scorecard(&DateRange::all()).expect("scorecard");
    let scores: Vec<_> = rows
        .iter()
        .map(|row| (row.id.0.as_str(), row.overall_score))
        .collect();
    assert_eq!(
        scores,
        vec![("a4", 100.0), ("a3", 85.0), ("a2", 70.0), ("a1", 55.0)]
    );
    assert_eq!(rows[2].process, 70.0);
    assert_eq!(rows[2].win_rate, 20.0);

    let process: Vec<_> = rows[0]
        .process_details
        .iter()
        .map(|detail| detail.name.as_str())
        .collect();
    assert_eq!(process, vec!["Opening complete", "Needs discovery"]);
}

#[test]
fn custom_window_limits_recordings() {
    let rows = service().agent_scorecard(&january()).expect("scorecard");
    assert!(rows.iter().all(|row| row.recordings == 3));
}

#[test]
fn validation_report_confirms_scores_track_outcomes() {
    let report = service()
        .validation_report(&DateRange::all(), None)
        .expect("validation");

    assert_eq!(report.sample_size, 4);
    assert!(report.correlation > 0.999);
    assert!(report.summary.is_valid);
    assert_eq!(report.summary.strength, CorrelationStrength::Strong);
    assert_eq!(report.precision, Precision::Exact);

    assert_eq!(report.quartile_analysis.q1.avg_score, 55.0);
    assert_eq!(report.quartile_analysis.q1.avg_win_rate, 0.0);
    assert_eq!(report.quartile_analysis.q4.avg_score, 100.0);
    assert_eq!(report.quartile_analysis.q4.avg_win_rate, 60.0);

    let thresholds: Vec<_> = report
        .business_thresholds
        .iter()
        .map(|result| (result.sample_size, result.actual_win_rate, result.meets_expectation))
        .collect();
    assert_eq!(
        thresholds,
        vec![(2, 50.0, false), (3, 40.0, false), (4, 30.0, true)]
    );

    let trend: Vec<_> = report
        .trend_analysis
        .iter()
        .map(|point| (point.month.as_str(), point.avg_score, point.win_rate, point.sample_size))
        .collect();
    assert_eq!(
        trend,
        vec![("2025-01", 78.0, 50.0, 12), ("2025-02", 76.0, 0.0, 8)]
    );
}

#[test]
fn leaderboard_respects_minimum_call_count() {
    let service = service();
    let all = service
        .leaderboard(&DateRange::all(), Precision::Rounded, 5)
        .expect("leaderboard");
    assert_eq!(all.len(), 4);

    let january = service
        .leaderboard(&january(), Precision::Rounded, 5)
        .expect("leaderboard");
    assert!(january.is_empty());
}

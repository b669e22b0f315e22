use super::common::*;

use crate::analytics::domain::CallOutcome;
use crate::analytics::duration::{
    agent_rankings, analyze, bucket_for, distribution, summarize, DurationSample,
    MAX_BUCKET_SECS,
};

#[test]
fn every_duration_lands_in_exactly_one_bucket() {
    let calls: Vec<_> = [0, 29, 30, 150, 151, 240, 241, 359, 360, 1000, 86_400]
        .iter()
        .enumerate()
        .map(|(index, secs)| call(&format!("d{index}"), "a1", at(2025, 3, 1, 9), *secs))
        .collect();
    let samples = DurationSample::join(&calls, &[]);
    let buckets = distribution(&samples);

    let counted: usize = buckets.iter().map(|bucket| bucket.count).sum();
    assert_eq!(counted, calls.len());
    assert!(buckets.iter().all(|bucket| bucket.seconds <= MAX_BUCKET_SECS));

    let overflow = buckets.last().expect("overflow bucket");
    assert_eq!(overflow.label, "360s+");
    assert_eq!(overflow.count, 3);
    assert_eq!(bucket_for(1000), MAX_BUCKET_SECS);
}

#[test]
fn missing_durations_count_as_zero_seconds() {
    let mut silent = call("d0", "a1", at(2025, 3, 1, 9), 0);
    silent.duration = None;
    let samples = DurationSample::join(&[silent], &[]);
    let buckets = distribution(&samples);
    assert_eq!(buckets[0].label, "0s");
    assert_eq!(buckets[0].count, 1);
}

#[test]
fn summary_applies_compliance_and_friction_limits() {
    let snapshot = snapshot();
    let samples = DurationSample::join(&snapshot.calls, &snapshot.deals);
    let summary = summarize(&samples);

    assert_eq!(summary.total_calls, 4);
    assert_eq!(summary.avg_duration, 379.0);
    assert_eq!(summary.compliance_rate, 50.0);
    assert_eq!(summary.friction_rate, 50.0);
    // Both compliant calls went onsite; one of the two long calls did.
    assert_eq!(summary.predicted_gain, 1);
}

#[test]
fn predicted_gain_never_goes_negative() {
    let fast = call("f1", "a1", at(2025, 3, 1, 9), 60);
    let slow = call("s1", "a1", at(2025, 3, 1, 10), 400);
    let deals = vec![
        deal(&fast, CallOutcome::Lost, false),
        deal(&slow, CallOutcome::Won, true),
    ];
    let samples = DurationSample::join(&[fast, slow], &deals);
    assert_eq!(summarize(&samples).predicted_gain, 0);
}

#[test]
fn bucket_rates_use_deal_outcomes() {
    let snapshot = snapshot();
    let samples = DurationSample::join(&snapshot.calls, &snapshot.deals);
    let buckets = distribution(&samples);

    let bucket = |seconds: u32| {
        buckets
            .iter()
            .find(|bucket| bucket.seconds == seconds)
            .expect("bucket exists")
    };
    assert_eq!(bucket(90).count, 1);
    assert_eq!(bucket(90).onsite_rate, 100.0);
    assert_eq!(bucket(90).win_rate, 0.0);
    assert_eq!(bucket(300).onsite_rate, 0.0);
    assert_eq!(bucket(360).win_rate, 100.0);
    assert_eq!(bucket(0).onsite_rate, 0.0);
}

#[test]
fn rankings_skip_agents_without_calls() {
    let snapshot = snapshot();
    let mut agents = snapshot.agents.clone();
    agents.push(agent("a3", "Idle"));

    let samples = DurationSample::join(&snapshot.calls, &snapshot.deals);
    let rankings = agent_rankings(&agents, &samples, &snapshot.deals);

    let ids: Vec<_> = rankings.iter().map(|row| row.id.0.as_str()).collect();
    assert_eq!(ids, vec!["a1", "a2"]);
    assert_eq!(rankings[0].avg_duration, 172.0);
    assert_eq!(rankings[0].count, 3);
    assert_eq!(rankings[0].onsite_rate, 67.0);
    assert_eq!(rankings[0].win_rate, 33.0);
}

#[test]
fn full_report_combines_sections() {
    let snapshot = snapshot();
    let report = analyze(&snapshot.agents, &snapshot.calls, &snapshot.deals, &snapshot.deals);
    assert_eq!(report.distribution.len(), 13);
    assert_eq!(report.agent_rankings.len(), 2);
    assert_eq!(report.summary.total_calls, 4);
}

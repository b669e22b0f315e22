//! Duration-versus-outcome analysis over calls and their deals.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::domain::{Agent, AgentId, Call, CallId, Deal};
use super::serde_ext::{ratio, score};

pub const BUCKET_SIZE_SECS: u32 = 30;
/// Lower bound of the overflow bucket, which also takes every longer call.
pub const MAX_BUCKET_SECS: u32 = 360;
/// Calls at or under this length satisfy the 150-second rule.
pub const COMPLIANCE_LIMIT_SECS: u32 = 150;
/// Calls over this length count as friction.
pub const FRICTION_LIMIT_SECS: u32 = 240;

/// A call joined with the outcome of the deal sharing its id.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationSample {
    pub call_id: CallId,
    pub agent_id: AgentId,
    pub duration: u32,
    pub onsite: bool,
    pub won: bool,
}

impl DurationSample {
    /// Calls without a matching deal count as neither onsite nor won.
    pub fn join(calls: &[Call], deals: &[Deal]) -> Vec<Self> {
        let by_id: HashMap<&CallId, &Deal> = deals.iter().map(|deal| (&deal.id, deal)).collect();
        calls
            .iter()
            .map(|call| {
                let deal = by_id.get(&call.id);
                Self {
                    call_id: call.id.clone(),
                    agent_id: call.agent_id.clone(),
                    duration: call.duration_secs(),
                    onsite: deal.is_some_and(|deal| deal.is_onsite_completed),
                    won: deal.is_some_and(|deal| deal.outcome.is_won()),
                }
            })
            .collect()
    }
}

/// Lower bound of the 30-second bucket holding `duration`.
pub fn bucket_for(duration: u32) -> u32 {
    (duration / BUCKET_SIZE_SECS * BUCKET_SIZE_SECS).min(MAX_BUCKET_SECS)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationBucket {
    pub seconds: u32,
    pub label: String,
    pub count: usize,
    /// Percentage, unrounded.
    pub onsite_rate: f64,
    pub win_rate: f64,
}

/// Thirteen buckets from 0s to the 360s+ overflow, empty ones included.
pub fn distribution(samples: &[DurationSample]) -> Vec<DurationBucket> {
    let mut buckets: BTreeMap<u32, (usize, usize, usize)> = (0..=MAX_BUCKET_SECS)
        .step_by(BUCKET_SIZE_SECS as usize)
        .map(|seconds| (seconds, (0, 0, 0)))
        .collect();

    for sample in samples {
        let entry = buckets.entry(bucket_for(sample.duration)).or_default();
        entry.0 += 1;
        if sample.onsite {
            entry.1 += 1;
        }
        if sample.won {
            entry.2 += 1;
        }
    }

    buckets
        .into_iter()
        .map(|(seconds, (count, onsite, won))| DurationBucket {
            seconds,
            label: if seconds >= MAX_BUCKET_SECS {
                format!("{seconds}s+")
            } else {
                format!("{seconds}s")
            },
            count,
            onsite_rate: ratio(onsite as f64, count as f64) * 100.0,
            win_rate: ratio(won as f64, count as f64) * 100.0,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationSummary {
    #[serde(serialize_with = "score")]
    pub avg_duration: f64,
    #[serde(serialize_with = "score")]
    pub compliance_rate: f64,
    #[serde(serialize_with = "score")]
    pub friction_rate: f64,
    /// Extra onsite visits if every over-limit call converted like the compliant ones.
    pub predicted_gain: u64,
    pub total_calls: usize,
}

pub fn summarize(samples: &[DurationSample]) -> DurationSummary {
    let total = samples.len();
    let total_f = total as f64;
    let total_duration: f64 = samples.iter().map(|sample| f64::from(sample.duration)).sum();

    let efficient: Vec<&DurationSample> = samples
        .iter()
        .filter(|sample| sample.duration <= COMPLIANCE_LIMIT_SECS)
        .collect();
    let friction = samples
        .iter()
        .filter(|sample| sample.duration > FRICTION_LIMIT_SECS)
        .count();

    let efficient_onsite = efficient.iter().filter(|sample| sample.onsite).count();
    let efficient_onsite_rate = ratio(efficient_onsite as f64, efficient.len() as f64);
    let inefficient_count = (total - efficient.len()) as f64;
    let inefficient_onsite = samples
        .iter()
        .filter(|sample| sample.duration > COMPLIANCE_LIMIT_SECS && sample.onsite)
        .count() as f64;
    let predicted_gain =
        (inefficient_count * efficient_onsite_rate - inefficient_onsite).round().max(0.0);

    DurationSummary {
        avg_duration: ratio(total_duration, total_f).round(),
        compliance_rate: (ratio(efficient.len() as f64, total_f) * 100.0).round(),
        friction_rate: (ratio(friction as f64, total_f) * 100.0).round(),
        predicted_gain: predicted_gain as u64,
        total_calls: total,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDurationRanking {
    pub id: AgentId,
    pub name: String,
    #[serde(serialize_with = "score")]
    pub avg_duration: f64,
    #[serde(serialize_with = "score")]
    pub onsite_rate: f64,
    #[serde(serialize_with = "score")]
    pub win_rate: f64,
    /// Deals created in the window, matching the scorecard's deal count.
    pub count: usize,
}

/// Ranks agents with at least one call by average duration, shortest first.
///
/// Duration comes from the window's calls; rates come from the window's deals.
pub fn agent_rankings(
    agents: &[Agent],
    samples: &[DurationSample],
    window_deals: &[Deal],
) -> Vec<AgentDurationRanking> {
    let mut durations: HashMap<&AgentId, (u64, usize)> = HashMap::new();
    for sample in samples {
        let entry = durations.entry(&sample.agent_id).or_default();
        entry.0 += u64::from(sample.duration);
        entry.1 += 1;
    }

    let mut deal_counts: HashMap<&AgentId, (usize, usize, usize)> = HashMap::new();
    for deal in window_deals {
        let entry = deal_counts.entry(&deal.agent_id).or_default();
        entry.0 += 1;
        if deal.outcome.is_won() {
            entry.1 += 1;
        }
        if deal.is_onsite_completed {
            entry.2 += 1;
        }
    }

    let mut rankings: Vec<AgentDurationRanking> = agents
        .iter()
        .filter_map(|agent| {
            let (total_duration, calls) = durations.get(&agent.id).copied()?;
            if calls == 0 {
                return None;
            }
            let (deals, won, onsite) = deal_counts.get(&agent.id).copied().unwrap_or_default();
            Some(AgentDurationRanking {
                id: agent.id.clone(),
                name: agent.name.clone(),
                avg_duration: ratio(total_duration as f64, calls as f64).round(),
                onsite_rate: (ratio(onsite as f64, deals as f64) * 100.0).round(),
                win_rate: (ratio(won as f64, deals as f64) * 100.0).round(),
                count: deals,
            })
        })
        .collect();

    rankings.sort_by(|a, b| a.avg_duration.total_cmp(&b.avg_duration));
    rankings
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationReport {
    pub summary: DurationSummary,
    pub distribution: Vec<DurationBucket>,
    pub agent_rankings: Vec<AgentDurationRanking>,
}

/// `call_deals` are the deals keyed by the window's call ids;
/// `window_deals` are the deals created inside the window.
pub fn analyze(
    agents: &[Agent],
    calls: &[Call],
    call_deals: &[Deal],
    window_deals: &[Deal],
) -> DurationReport {
    let samples = DurationSample::join(calls, call_deals);
    DurationReport {
        summary: summarize(&samples),
        distribution: distribution(&samples),
        agent_rankings: agent_rankings(agents, &samples, window_deals),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_are_thirty_second_floors() {
        assert_eq!(bucket_for(0), 0);
        assert_eq!(bucket_for(29), 0);
        assert_eq!(bucket_for(30), 30);
        assert_eq!(bucket_for(359), 330);
        assert_eq!(bucket_for(360), 360);
        assert_eq!(bucket_for(1000), 360);
    }

    #[test]
    fn empty_population_has_all_buckets_and_zero_rates() {
        let buckets = distribution(&[]);
        assert_eq!(buckets.len(), 13);
        assert_eq!(buckets[12].label, "360s+");
        assert!(buckets.iter().all(|bucket| bucket.onsite_rate == 0.0));

        let summary = summarize(&[]);
        assert_eq!(summary.total_calls, 0);
        assert_eq!(summary.predicted_gain, 0);
        assert_eq!(summary.compliance_rate, 0.0);
    }
}

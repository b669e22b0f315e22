use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::analytics::serde_ext::{ratio, score};

/// One scored call placed on the timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredCall {
    pub started_at: DateTime<Utc>,
    pub overall_score: f64,
    pub won: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub month: String,
    #[serde(serialize_with = "score")]
    pub avg_score: f64,
    #[serde(serialize_with = "score")]
    pub win_rate: f64,
    pub sample_size: usize,
}

/// Groups calls by UTC calendar month (`YYYY-MM`), oldest month first.
pub fn monthly_trend(calls: &[ScoredCall]) -> Vec<TrendPoint> {
    let mut months: BTreeMap<String, (f64, usize, usize)> = BTreeMap::new();
    for call in calls {
        let entry = months
            .entry(call.started_at.format("%Y-%m").to_string())
            .or_insert((0.0, 0, 0));
        entry.0 += call.overall_score;
        entry.1 += 1;
        if call.won {
            entry.2 += 1;
        }
    }

    months
        .into_iter()
        .map(|(month, (score_sum, count, won))| TrendPoint {
            month,
            avg_score: ratio(score_sum, count as f64).round(),
            win_rate: (ratio(won as f64, count as f64) * 100.0).round(),
            sample_size: count,
        })
        .collect()
}

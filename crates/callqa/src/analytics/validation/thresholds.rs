use serde::Serialize;

use super::AgentSample;
use crate::analytics::serde_ext::{ratio, score};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BusinessThreshold {
    pub min_score: f64,
    pub expected_win_rate: f64,
    pub description: &'static str,
}

/// Cumulative score floors: an agent at 85 counts towards all three.
pub const BUSINESS_THRESHOLDS: [BusinessThreshold; 3] = [
    BusinessThreshold {
        min_score: 80.0,
        expected_win_rate: 70.0,
        description: "Excellent performance threshold",
    },
    BusinessThreshold {
        min_score: 60.0,
        expected_win_rate: 50.0,
        description: "Qualified performance threshold",
    },
    BusinessThreshold {
        min_score: 0.0,
        expected_win_rate: 30.0,
        description: "Needs improvement threshold",
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdResult {
    #[serde(serialize_with = "score")]
    pub min_score: f64,
    #[serde(serialize_with = "score")]
    pub expected_win_rate: f64,
    pub description: &'static str,
    /// Rounded for display. `meets_expectation` compares the unrounded mean.
    #[serde(serialize_with = "score")]
    pub actual_win_rate: f64,
    pub sample_size: usize,
    pub meets_expectation: bool,
}

pub fn validate_thresholds(samples: &[AgentSample]) -> Vec<ThresholdResult> {
    BUSINESS_THRESHOLDS
        .iter()
        .map(|threshold| {
            let qualifying: Vec<f64> = samples
                .iter()
                .filter(|sample| sample.overall_score >= threshold.min_score)
                .map(|sample| sample.win_rate)
                .collect();
            let actual = ratio(qualifying.iter().sum(), qualifying.len() as f64);

            ThresholdResult {
                min_score: threshold.min_score,
                expected_win_rate: threshold.expected_win_rate,
                description: threshold.description,
                actual_win_rate: actual.round(),
                sample_size: qualifying.len(),
                meets_expectation: actual >= threshold.expected_win_rate,
            }
        })
        .collect()
}

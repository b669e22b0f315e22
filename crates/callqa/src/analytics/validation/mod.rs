//! Checks whether quality scores actually predict business outcomes.
//!
//! Every statistic here is a whole-population operation, so callers must hand
//! in the complete sample for the reporting window.

mod correlation;
mod quartiles;
mod thresholds;
mod trend;

pub use correlation::{pearson, CorrelationStrength};
pub use quartiles::{analyze_quartiles, QuartileAnalysis, QuartileStats, QUARTILE_LABELS};
pub use thresholds::{validate_thresholds, BusinessThreshold, ThresholdResult, BUSINESS_THRESHOLDS};
pub use trend::{monthly_trend, ScoredCall, TrendPoint};

use serde::Serialize;

use super::domain::AgentId;
use super::scoring::Precision;
use super::serde_ext::{ratio, score};

/// Correlation above which the scoring system is considered validated.
pub const VALIDITY_THRESHOLD: f64 = 0.3;
pub const MIN_CORRELATION_SAMPLE: usize = 2;

const VALIDATED_MESSAGE: &str =
    "Quality scores correlate positively with win rate; the scoring system is validated";
const NOT_VALIDATED_MESSAGE: &str =
    "Quality scores do not correlate strongly enough with win rate; the scoring needs tuning";
const INSUFFICIENT_SAMPLE_MESSAGE: &str =
    "Insufficient sample: at least two agents are needed to validate the scoring system";

/// One agent reduced to the pair the correlation engine works on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSample {
    pub id: AgentId,
    pub name: String,
    #[serde(serialize_with = "score")]
    pub overall_score: f64,
    /// Percentage of the agent's calls that were won.
    #[serde(serialize_with = "score")]
    pub win_rate: f64,
    pub total_calls: usize,
    pub won_calls: usize,
}

impl AgentSample {
    pub fn new(
        id: AgentId,
        name: String,
        overall_score: f64,
        total_calls: usize,
        won_calls: usize,
    ) -> Self {
        Self {
            id,
            name,
            overall_score,
            win_rate: ratio(won_calls as f64, total_calls as f64) * 100.0,
            total_calls,
            won_calls,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    pub is_valid: bool,
    pub strength: CorrelationStrength,
    pub message: &'static str,
}

impl ValidationSummary {
    /// The verdict is `correlation > 0.3`, exactly. Small samples keep that
    /// verdict but never report the system as validated.
    pub fn from_correlation(correlation: f64, sample_size: usize) -> Self {
        let is_valid = correlation > VALIDITY_THRESHOLD;
        let message = if sample_size < MIN_CORRELATION_SAMPLE {
            INSUFFICIENT_SAMPLE_MESSAGE
        } else if is_valid {
            VALIDATED_MESSAGE
        } else {
            NOT_VALIDATED_MESSAGE
        };

        Self {
            is_valid,
            strength: CorrelationStrength::from_coefficient(correlation),
            message,
        }
    }

    pub fn insufficient_sample(&self) -> bool {
        self.message == INSUFFICIENT_SAMPLE_MESSAGE
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub correlation: f64,
    pub sample_size: usize,
    pub precision: Precision,
    pub agents: Vec<AgentSample>,
    pub quartile_analysis: QuartileAnalysis,
    pub business_thresholds: Vec<ThresholdResult>,
    pub trend_analysis: Vec<TrendPoint>,
    pub summary: ValidationSummary,
}

/// Builds the full report from an already-filtered agent population and the
/// per-call scores of the same window.
pub fn build_report(
    agents: Vec<AgentSample>,
    calls: &[ScoredCall],
    precision: Precision,
) -> ValidationReport {
    let pairs: Vec<(f64, f64)> = agents
        .iter()
        .map(|agent| (agent.overall_score, agent.win_rate))
        .collect();
    let correlation = pearson(&pairs);
    let sample_size = agents.len();

    ValidationReport {
        correlation,
        sample_size,
        precision,
        quartile_analysis: analyze_quartiles(&agents),
        business_thresholds: validate_thresholds(&agents),
        trend_analysis: monthly_trend(calls),
        summary: ValidationSummary::from_correlation(correlation, sample_size),
        agents,
    }
}

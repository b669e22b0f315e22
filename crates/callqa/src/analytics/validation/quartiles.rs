use serde::Serialize;

use super::AgentSample;
use crate::analytics::serde_ext::{ratio, score};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuartileStats {
    pub range: &'static str,
    #[serde(serialize_with = "score")]
    pub avg_score: f64,
    #[serde(serialize_with = "score")]
    pub avg_win_rate: f64,
    pub sample_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuartileAnalysis {
    pub q1: QuartileStats,
    pub q2: QuartileStats,
    pub q3: QuartileStats,
    pub q4: QuartileStats,
}

pub const QUARTILE_LABELS: [&str; 4] = ["Bottom 25%", "25-50%", "50-75%", "Top 25%"];

impl QuartileAnalysis {
    pub fn groups(&self) -> [&QuartileStats; 4] {
        [&self.q1, &self.q2, &self.q3, &self.q4]
    }
}

/// Splits the population, sorted ascending by score, into four contiguous
/// groups of `ceil(n / 4)`. The last group takes whatever remains, which may
/// be fewer agents or none at all.
pub fn analyze_quartiles(samples: &[AgentSample]) -> QuartileAnalysis {
    let mut sorted: Vec<&AgentSample> = samples.iter().collect();
    sorted.sort_by(|a, b| a.overall_score.total_cmp(&b.overall_score));

    let n = sorted.len();
    let size = n.div_ceil(4);
    let slice = |index: usize| {
        let start = (size * index).min(n);
        let end = if index == 3 { n } else { (size * (index + 1)).min(n) };
        group_stats(&sorted[start..end], QUARTILE_LABELS[index])
    };

    QuartileAnalysis {
        q1: slice(0),
        q2: slice(1),
        q3: slice(2),
        q4: slice(3),
    }
}

fn group_stats(group: &[&AgentSample], range: &'static str) -> QuartileStats {
    let count = group.len() as f64;
    let score_sum: f64 = group.iter().map(|sample| sample.overall_score).sum();
    let win_rate_sum: f64 = group.iter().map(|sample| sample.win_rate).sum();
    QuartileStats {
        range,
        avg_score: ratio(score_sum, count).round(),
        avg_win_rate: ratio(win_rate_sum, count).round(),
        sample_size: group.len(),
    }
}

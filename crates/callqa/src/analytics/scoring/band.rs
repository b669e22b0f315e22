use serde::Serialize;

/// Display band for a score on either the 100-point or the 5-point scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Excellent,
    Good,
    NeedsImprovement,
}

impl ScoreBand {
    pub fn for_score(score: f64) -> Self {
        Self::banded(score, 80.0, 60.0)
    }

    /// Bands for per-tag scores on the 1–5 scale.
    pub fn for_signal_score(score: f64) -> Self {
        Self::banded(score, 4.0, 3.0)
    }

    fn banded(score: f64, excellent: f64, good: f64) -> Self {
        if score >= excellent {
            Self::Excellent
        } else if score >= good {
            Self::Good
        } else {
            Self::NeedsImprovement
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::NeedsImprovement => "Needs Improvement",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_follow_thresholds() {
        assert_eq!(ScoreBand::for_score(80.0), ScoreBand::Excellent);
        assert_eq!(ScoreBand::for_score(79.9), ScoreBand::Good);
        assert_eq!(ScoreBand::for_score(12.0), ScoreBand::NeedsImprovement);
        assert_eq!(ScoreBand::for_signal_score(4.0), ScoreBand::Excellent);
        assert_eq!(ScoreBand::for_signal_score(3.0), ScoreBand::Good);
        assert_eq!(ScoreBand::for_signal_score(2.0), ScoreBand::NeedsImprovement);
        assert_eq!(ScoreBand::for_score(59.0).label(), "Needs Improvement");
    }
}

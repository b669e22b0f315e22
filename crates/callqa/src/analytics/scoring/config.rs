use serde::{Deserialize, Serialize};

use super::super::catalog::Pillar;
use super::PillarScores;

pub const DEFAULT_AGGREGATION_METHOD: &str = "weighted-average";

/// Pillar weighting, in percent.
///
/// Weights are not required to sum to 100 when scores are computed; a stored
/// configuration that does not will scale the overall score accordingly.
/// [`ScoreConfig::validate`] is applied when a configuration is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreConfig {
    pub process_weight: f64,
    pub skills_weight: f64,
    pub communication_weight: f64,
    #[serde(default = "default_aggregation_method")]
    pub aggregation_method: String,
}

fn default_aggregation_method() -> String {
    DEFAULT_AGGREGATION_METHOD.to_string()
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            process_weight: 30.0,
            skills_weight: 50.0,
            communication_weight: 20.0,
            aggregation_method: default_aggregation_method(),
        }
    }
}

impl ScoreConfig {
    pub fn weight(&self, pillar: Pillar) -> f64 {
        match pillar {
            Pillar::Process => self.process_weight,
            Pillar::Skills => self.skills_weight,
            Pillar::Communication => self.communication_weight,
        }
    }

    pub fn total_weight(&self) -> f64 {
        self.process_weight + self.skills_weight + self.communication_weight
    }

    /// `(process * pw + skills * sw + communication * cw) / 100`, unrounded.
    pub fn combine(&self, pillars: &PillarScores) -> f64 {
        (pillars.process * self.process_weight
            + pillars.skills * self.skills_weight
            + pillars.communication * self.communication_weight)
            / 100.0
    }

    pub fn validate(&self) -> Result<(), ScoreConfigError> {
        let weights = [
            ("processWeight", self.process_weight),
            ("skillsWeight", self.skills_weight),
            ("communicationWeight", self.communication_weight),
        ];
        for (field, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(ScoreConfigError::InvalidWeight { field, value });
            }
        }

        let total = self.total_weight();
        if (total - 100.0).abs() > 1e-6 {
            return Err(ScoreConfigError::WeightsMustSumTo100 { total });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoreConfigError {
    #[error("weights must sum to 100 (got {total})")]
    WeightsMustSumTo100 { total: f64 },
    #[error("{field} must be a non-negative number (got {value})")]
    InvalidWeight { field: &'static str, value: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_split() {
        let config = ScoreConfig::default();
        assert_eq!(config.weight(Pillar::Process), 30.0);
        assert_eq!(config.weight(Pillar::Skills), 50.0);
        assert_eq!(config.weight(Pillar::Communication), 20.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unbalanced_weights_scale_silently_but_fail_validation() {
        let config = ScoreConfig {
            process_weight: 50.0,
            skills_weight: 50.0,
            communication_weight: 50.0,
            ..ScoreConfig::default()
        };
        let pillars = PillarScores {
            process: 80.0,
            skills: 80.0,
            communication: 80.0,
        };
        assert_eq!(config.combine(&pillars), 120.0);
        assert_eq!(
            config.validate(),
            Err(ScoreConfigError::WeightsMustSumTo100 { total: 150.0 })
        );
    }

    #[test]
    fn negative_weights_are_rejected() {
        let config = ScoreConfig {
            process_weight: -10.0,
            skills_weight: 90.0,
            communication_weight: 20.0,
            ..ScoreConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ScoreConfigError::InvalidWeight {
                field: "processWeight",
                ..
            })
        ));
    }

    #[test]
    fn aggregation_method_defaults_when_missing() {
        let config: ScoreConfig = serde_json::from_str(
            r#"{"processWeight":40,"skillsWeight":40,"communicationWeight":20}"#,
        )
        .expect("parse config");
        assert_eq!(config.aggregation_method, DEFAULT_AGGREGATION_METHOD);
    }
}

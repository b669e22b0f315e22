//! Dimension-weighted quality scoring.
//!
//! One aggregation path serves both per-call and per-agent scoring: raw tag
//! scores are first averaged per tag, then folded into weighted pillar
//! averages, then combined into an overall score using the pillar weights.

mod band;
mod config;
pub mod intent;
mod rules;
pub mod views;

pub use band::ScoreBand;
pub use config::{ScoreConfig, ScoreConfigError, DEFAULT_AGGREGATION_METHOD};
pub use rules::{calc_dim_score, TagAverages};

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::catalog::{Pillar, TagCatalog, WeightMap};
use super::domain::CallTag;
use super::serde_ext::finite_or_zero;

/// Rounding policy for a score computation.
///
/// `Rounded` rounds every pillar to an integer before combining and rounds the
/// overall score, matching what the dashboard lists display. `Exact` keeps
/// floats end to end for statistical work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Rounded,
    #[default]
    Exact,
}

impl Precision {
    pub fn apply(self, value: f64) -> f64 {
        let value = finite_or_zero(value);
        match self {
            Self::Rounded => value.round(),
            Self::Exact => value,
        }
    }
}

impl FromStr for Precision {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rounded" | "display" => Ok(Self::Rounded),
            "exact" | "analysis" => Ok(Self::Exact),
            other => Err(format!(
                "unknown precision '{other}' (expected 'rounded' or 'exact')"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PillarScores {
    pub process: f64,
    pub skills: f64,
    pub communication: f64,
}

impl PillarScores {
    pub fn get(&self, pillar: Pillar) -> f64 {
        match pillar {
            Pillar::Process => self.process,
            Pillar::Skills => self.skills,
            Pillar::Communication => self.communication,
        }
    }

    fn set(&mut self, pillar: Pillar, value: f64) {
        match pillar {
            Pillar::Process => self.process = value,
            Pillar::Skills => self.skills = value,
            Pillar::Communication => self.communication = value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityScore {
    pub pillars: PillarScores,
    pub overall: f64,
    pub precision: Precision,
}

/// Scores assessments against one request's catalog, weight map and pillar
/// weighting. Holds no mutable state, so repeated runs over the same input
/// give the same output.
#[derive(Debug, Clone)]
pub struct ScoreAggregator {
    catalog: TagCatalog,
    weights: WeightMap,
    config: ScoreConfig,
}

impl ScoreAggregator {
    pub fn new(catalog: TagCatalog, weights: WeightMap, config: ScoreConfig) -> Self {
        Self {
            catalog,
            weights,
            config,
        }
    }

    pub fn catalog(&self) -> &TagCatalog {
        &self.catalog
    }

    pub fn weights(&self) -> &WeightMap {
        &self.weights
    }

    pub fn config(&self) -> &ScoreConfig {
        &self.config
    }

    /// Scores a call's assessments, or every assessment of one agent pooled
    /// across calls.
    pub fn score<'a>(
        &self,
        assessments: impl IntoIterator<Item = &'a CallTag>,
        precision: Precision,
    ) -> QualityScore {
        let averages = TagAverages::from_assessments(assessments);
        self.score_averages(&averages, precision)
    }

    pub fn score_averages(&self, averages: &TagAverages, precision: Precision) -> QualityScore {
        let mut pillars = PillarScores::default();
        for pillar in Pillar::ordered() {
            let value = self.pillar_score(pillar, averages);
            pillars.set(pillar, precision.apply(value));
        }

        let overall = precision.apply(self.config.combine(&pillars));

        QualityScore {
            pillars,
            overall,
            precision,
        }
    }

    /// Unrounded weighted average for one pillar.
    pub fn pillar_score(&self, pillar: Pillar, averages: &TagAverages) -> f64 {
        calc_dim_score(
            self.catalog.reference_tags(pillar),
            averages,
            &self.weights,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precision_parses_aliases() {
        assert_eq!("display".parse::<Precision>(), Ok(Precision::Rounded));
        assert_eq!("EXACT".parse::<Precision>(), Ok(Precision::Exact));
        assert!("half".parse::<Precision>().is_err());
    }

    #[test]
    fn rounded_precision_never_emits_nan() {
        assert_eq!(Precision::Rounded.apply(f64::NAN), 0.0);
        assert_eq!(Precision::Rounded.apply(65.5), 66.0);
        assert_eq!(Precision::Exact.apply(65.5), 65.5);
    }
}

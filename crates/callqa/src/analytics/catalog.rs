use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use super::domain::{TagCode, TagId};
use super::serde_ext::flexible_bool;

/// Weight applied to a tag that has no active scoring rule.
pub const DEFAULT_TAG_WEIGHT: f64 = 1.0;

/// Top-level scoring category every tag dimension rolls up into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pillar {
    Process,
    Skills,
    Communication,
}

impl Pillar {
    pub const fn ordered() -> [Self; 3] {
        [Self::Process, Self::Skills, Self::Communication]
    }

    /// Maps a tag dimension onto its pillar. `None` is the "Other" bucket,
    /// excluded from every pillar computation.
    ///
    /// `Intent` and `Constraint` dimensions count towards Skills.
    pub fn classify(dimension: &str) -> Option<Self> {
        match dimension {
            "Process" | "Sales.Process" => Some(Self::Process),
            "Communication" | "Sales.Communication" => Some(Self::Communication),
            "Skills" | "Sales.Skills" | "Intent" | "Constraint" => Some(Self::Skills),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl Polarity {
    pub fn from_label(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "positive" => Self::Positive,
            "negative" => Self::Negative,
            _ => Self::Neutral,
        }
    }
}

impl<'de> Deserialize<'de> for Polarity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Polarity::from_label).unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: TagId,
    pub code: TagCode,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub dimension: Option<String>,
    #[serde(default, alias = "type")]
    pub polarity: Polarity,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default, alias = "is_mandatory", deserialize_with = "flexible_bool")]
    pub is_mandatory: bool,
    #[serde(default = "active_by_default", deserialize_with = "flexible_bool")]
    pub active: bool,
}

fn active_by_default() -> bool {
    true
}

impl Tag {
    pub fn pillar(&self) -> Option<Pillar> {
        self.dimension.as_deref().and_then(Pillar::classify)
    }
}

/// Per-tag weight override, matched to tags by code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringRule {
    pub tag_code: TagCode,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default = "tag_based_rule")]
    pub rule_type: String,
    #[serde(default = "active_by_default", deserialize_with = "flexible_bool")]
    pub active: bool,
}

pub const TAG_BASED_RULE: &str = "TagBased";

fn tag_based_rule() -> String {
    TAG_BASED_RULE.to_string()
}

/// Tag-code to weight lookup, built once per request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightMap {
    weights: HashMap<TagCode, f64>,
}

impl WeightMap {
    /// Builds the map from active tag-based rules. Later rules win on duplicate codes.
    pub fn from_rules<'a>(rules: impl IntoIterator<Item = &'a ScoringRule>) -> Self {
        let weights = rules
            .into_iter()
            .filter(|rule| rule.active && rule.rule_type == TAG_BASED_RULE)
            .map(|rule| {
                (
                    rule.tag_code.clone(),
                    rule.weight.unwrap_or(DEFAULT_TAG_WEIGHT),
                )
            })
            .collect();
        Self { weights }
    }

    pub fn insert(&mut self, code: TagCode, weight: f64) {
        self.weights.insert(code, weight);
    }

    pub fn weight(&self, code: &TagCode) -> f64 {
        self.weights
            .get(code)
            .copied()
            .unwrap_or(DEFAULT_TAG_WEIGHT)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

/// Tag definitions for one request. All tags stay resolvable by id; only
/// active tags take part in pillar scoring.
#[derive(Debug, Clone, Default)]
pub struct TagCatalog {
    tags: Vec<Tag>,
    by_id: HashMap<TagId, usize>,
}

impl TagCatalog {
    pub fn new(tags: Vec<Tag>) -> Self {
        let by_id = tags
            .iter()
            .enumerate()
            .map(|(index, tag)| (tag.id.clone(), index))
            .collect();
        Self { tags, by_id }
    }

    pub fn get(&self, id: &TagId) -> Option<&Tag> {
        self.by_id.get(id).map(|index| &self.tags[*index])
    }

    pub fn active(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter().filter(|tag| tag.active)
    }

    /// Active tags whose dimension classifies into `pillar`, in catalog order.
    pub fn reference_tags(&self, pillar: Pillar) -> impl Iterator<Item = &Tag> {
        self.active().filter(move |tag| tag.pillar() == Some(pillar))
    }

    pub fn mandatory(&self) -> impl Iterator<Item = &Tag> {
        self.active().filter(|tag| tag.is_mandatory)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

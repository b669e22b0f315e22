use std::collections::HashMap;

use super::super::catalog::{Tag, WeightMap};
use super::super::domain::{CallTag, TagId};
use super::super::serde_ext::ratio;

/// Mean raw score per tag across every assessment handed in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagAverages {
    averages: HashMap<TagId, f64>,
}

impl TagAverages {
    pub fn from_assessments<'a>(assessments: impl IntoIterator<Item = &'a CallTag>) -> Self {
        let mut totals: HashMap<TagId, (f64, usize)> = HashMap::new();
        for assessment in assessments {
            let entry = totals.entry(assessment.tag_id.clone()).or_insert((0.0, 0));
            entry.0 += assessment.score;
            entry.1 += 1;
        }

        let averages = totals
            .into_iter()
            .map(|(tag_id, (sum, count))| (tag_id, ratio(sum, count as f64)))
            .collect();
        Self { averages }
    }

    pub fn get(&self, tag_id: &TagId) -> Option<f64> {
        self.averages.get(tag_id).copied()
    }

    pub fn contains(&self, tag_id: &TagId) -> bool {
        self.averages.contains_key(tag_id)
    }

    pub fn len(&self) -> usize {
        self.averages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.averages.is_empty()
    }
}

impl FromIterator<(TagId, f64)> for TagAverages {
    fn from_iter<I: IntoIterator<Item = (TagId, f64)>>(iter: I) -> Self {
        Self {
            averages: iter.into_iter().collect(),
        }
    }
}

/// Weighted pillar average over `reference` tags.
///
/// Observed tags contribute `score * weight` to the numerator and `weight` to
/// the denominator. Mandatory tags with no observation contribute only their
/// weight, i.e. a zero score. Optional unobserved tags are ignored. A zero
/// denominator yields 0.
pub fn calc_dim_score<'a>(
    reference: impl IntoIterator<Item = &'a Tag>,
    averages: &TagAverages,
    weights: &WeightMap,
) -> f64 {
    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;

    for tag in reference {
        let weight = weights.weight(&tag.code);
        match averages.get(&tag.id) {
            Some(score) => {
                weighted_sum += score * weight;
                weight_sum += weight;
            }
            None if tag.is_mandatory => {
                weight_sum += weight;
            }
            None => {}
        }
    }

    ratio(weighted_sum, weight_sum)
}

//! Customer intent estimate derived from a call's tag scores.

use serde::Serialize;
use std::collections::HashMap;

use super::super::catalog::TagCatalog;
use super::super::domain::CallTag;

const BASE_SCORE: f64 = 50.0;
const DECISION_MAKER_MIN_SCORE: f64 = 60.0;
const HIGH_GRADE: f64 = 70.0;
const MEDIUM_GRADE: f64 = 40.0;
/// Share of all known factors at which confidence saturates.
const FULL_CONFIDENCE_COVERAGE: f64 = 0.6;

const POSITIVE_WEIGHTS: [(&str, f64); 4] = [
    ("customer_high_intent", 0.35),
    ("customer_schedule_request", 0.20),
    ("customer_solution_request", 0.15),
    ("customer_pricing_request", 0.10),
];

const NEGATIVE_WEIGHTS: [(&str, f64); 4] = [
    ("customer_objection_price", -0.10),
    ("customer_objection_trust", -0.12),
    ("customer_objection_time", -0.06),
    ("customer_objection_scope", -0.06),
];

const DECISION_MAKER_BONUS: [(&str, f64); 1] = [("customer_role_owner", 8.0)];

pub const DECISION_MAKER_FACTOR: &str = "Decision maker";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IntentGrade {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntentFactors {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictedIntent {
    pub score: u8,
    pub grade: IntentGrade,
    pub confidence: f64,
    pub factors: IntentFactors,
}

/// Estimates intent from tag scores on a 0–100 scale.
///
/// Tags are matched by code through `catalog`; assessments for unknown tags
/// are ignored.
pub fn predict_intent(assessments: &[CallTag], catalog: &TagCatalog) -> PredictedIntent {
    let by_code: HashMap<&str, (f64, &str)> = assessments
        .iter()
        .filter_map(|assessment| {
            catalog.get(&assessment.tag_id).map(|tag| {
                (
                    tag.code.0.as_str(),
                    (assessment.score, tag.name.as_str()),
                )
            })
        })
        .collect();

    let mut score = BASE_SCORE;
    let mut positive = Vec::new();
    let mut negative = Vec::new();
    let mut factor_count = 0usize;

    for (code, weight) in POSITIVE_WEIGHTS {
        if let Some((tag_score, name)) = by_code.get(code) {
            score += tag_score / 100.0 * weight * 100.0;
            positive.push(display_name(name, code));
            factor_count += 1;
        }
    }

    for (code, weight) in NEGATIVE_WEIGHTS {
        if let Some((tag_score, name)) = by_code.get(code) {
            score += tag_score / 100.0 * weight * 100.0;
            negative.push(display_name(name, code));
            factor_count += 1;
        }
    }

    for (code, bonus) in DECISION_MAKER_BONUS {
        if let Some((tag_score, _)) = by_code.get(code) {
            if *tag_score >= DECISION_MAKER_MIN_SCORE {
                score += bonus;
                positive.push(DECISION_MAKER_FACTOR.to_string());
                factor_count += 1;
            }
        }
    }

    let score = if score.is_finite() {
        score.round().clamp(0.0, 100.0)
    } else {
        BASE_SCORE
    };

    let total_factors =
        (POSITIVE_WEIGHTS.len() + NEGATIVE_WEIGHTS.len() + DECISION_MAKER_BONUS.len()) as f64;
    let confidence = (factor_count as f64 / (total_factors * FULL_CONFIDENCE_COVERAGE)).min(1.0);

    let grade = if score >= HIGH_GRADE {
        IntentGrade::High
    } else if score >= MEDIUM_GRADE {
        IntentGrade::Medium
    } else {
        IntentGrade::Low
    };

    PredictedIntent {
        score: score as u8,
        grade,
        confidence: (confidence * 100.0).round() / 100.0,
        factors: IntentFactors { positive, negative },
    }
}

fn display_name(name: &str, code: &str) -> String {
    if name.trim().is_empty() {
        code.to_string()
    } else {
        name.to_string()
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

use super::super::catalog::{Pillar, Polarity, TagCatalog};
use super::super::domain::{
    compare_offsets, AgentId, Call, CallId, CallOutcome, CallSignal, CallTag, ContextEvent,
    TagCode,
};
use super::super::serde_ext::{flag, score};
use super::super::validation::AgentSample;
use super::intent::PredictedIntent;
use super::{QualityScore, ScoreBand, TagAverages};

pub const MISSING_MANDATORY_REASONING: &str = "Missing mandatory action";
pub const MISSING_MANDATORY_CONTEXT: &str = "Not detected in call";
const SERVICE_ISSUE_CATEGORY: &str = "Service Issue";

/// Score fields shared by every per-call payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallScoreView {
    #[serde(serialize_with = "score")]
    pub process_score: f64,
    #[serde(serialize_with = "score")]
    pub skills_score: f64,
    #[serde(serialize_with = "score")]
    pub communication_score: f64,
    #[serde(serialize_with = "score")]
    pub overall_quality_score: f64,
    pub quality_band: ScoreBand,
}

impl From<&QualityScore> for CallScoreView {
    fn from(value: &QualityScore) -> Self {
        Self {
            process_score: value.pillars.process,
            skills_score: value.pillars.skills,
            communication_score: value.pillars.communication,
            overall_quality_score: value.overall,
            quality_band: ScoreBand::for_score(value.overall),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalOccurrence {
    /// Epoch milliseconds.
    pub timestamp: Option<i64>,
    pub context: Option<String>,
    pub reasoning: Option<String>,
    pub confidence: Option<f64>,
}

/// An assessed tag on a call, with the raw detections behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessedSignalView {
    pub tag: TagCode,
    pub name: String,
    pub category: Option<String>,
    pub dimension: Option<String>,
    pub pillar: Option<Pillar>,
    #[serde(serialize_with = "score")]
    pub score: f64,
    pub band: ScoreBand,
    pub confidence: Option<f64>,
    pub reasoning: Option<String>,
    pub context: Option<String>,
    pub timestamp: Option<i64>,
    pub severity: String,
    pub polarity: Polarity,
    #[serde(rename = "is_mandatory")]
    pub is_mandatory: bool,
    pub occurrences: Vec<SignalOccurrence>,
    pub context_events: Vec<ContextEvent>,
}

/// A mandatory tag with no assessment on the call, scored as zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingSignalView {
    pub tag: TagCode,
    pub name: String,
    pub dimension: Option<String>,
    pub pillar: Option<Pillar>,
    #[serde(serialize_with = "score")]
    pub score: f64,
    pub confidence: f64,
    pub reasoning: &'static str,
    pub context: &'static str,
    pub timestamp: Option<i64>,
    pub severity: &'static str,
    pub polarity: Polarity,
    #[serde(rename = "is_mandatory")]
    pub is_mandatory: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSignalView {
    pub signal_code: TagCode,
    pub signal_name: String,
    pub timestamp_sec: Option<f64>,
    pub context_text: Option<String>,
    pub reasoning: Option<String>,
    pub confidence: Option<f64>,
}

impl From<&CallSignal> for RawSignalView {
    fn from(signal: &CallSignal) -> Self {
        Self {
            signal_code: signal.signal_code.clone(),
            signal_name: signal
                .signal_name
                .clone()
                .unwrap_or_else(|| signal.signal_code.0.clone()),
            timestamp_sec: signal.timestamp_sec,
            context_text: signal.context_text.clone(),
            reasoning: signal.reasoning.clone(),
            confidence: signal.confidence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceIssueView {
    pub tag: TagCode,
    pub severity: String,
}

/// Lightweight row for the call list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    pub id: CallId,
    pub agent_id: AgentId,
    pub agent_name: String,
    pub agent_avatar_id: Option<String>,
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub duration_minutes: u32,
    #[serde(flatten)]
    pub scores: CallScoreView,
    pub business_grade: &'static str,
    pub tags: Vec<String>,
    pub audio_url: Option<String>,
    #[serde(flatten)]
    pub details: Option<CallDetails>,
}

/// Evidence attached to a call: assessed and missing signals plus the raw stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallDetails {
    pub behaviors: Vec<TagCode>,
    pub service_issues: Vec<ServiceIssueView>,
    pub signals: Vec<AssessedSignalView>,
    pub missing_signals: Vec<MissingSignalView>,
    pub raw_signals: Vec<RawSignalView>,
}

/// Full single-call payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallDetailView {
    #[serde(flatten)]
    pub record: CallRecord,
    pub outcome: CallOutcome,
    #[serde(serialize_with = "flag")]
    pub is_onsite_completed: bool,
    pub predicted_intent: PredictedIntent,
}

impl CallRecord {
    pub fn new(
        call: &Call,
        agent_name: Option<&str>,
        agent_avatar_id: Option<&str>,
        assessments: &[CallTag],
        catalog: &TagCatalog,
        quality: &QualityScore,
    ) -> Self {
        let agent_name = agent_name.unwrap_or_default().to_string();
        let title = if agent_name.is_empty() {
            "Call with Agent".to_string()
        } else {
            format!("Call with {agent_name}")
        };

        let mut seen = HashSet::new();
        let tags = assessments
            .iter()
            .filter_map(|assessment| catalog.get(&assessment.tag_id))
            .filter(|tag| seen.insert(tag.name.clone()))
            .map(|tag| tag.name.clone())
            .collect();

        Self {
            id: call.id.clone(),
            agent_id: call.agent_id.clone(),
            agent_name,
            agent_avatar_id: agent_avatar_id.map(str::to_string),
            title,
            timestamp: call.started_at,
            duration_minutes: (f64::from(call.duration_secs()) / 60.0).round() as u32,
            scores: CallScoreView::from(quality),
            business_grade: call.outcome.business_grade(),
            tags,
            audio_url: call.audio_url.clone(),
            details: None,
        }
    }
}

impl CallDetails {
    pub fn build(
        call: &Call,
        assessments: &[CallTag],
        raw_signals: &[CallSignal],
        catalog: &TagCatalog,
    ) -> Self {
        let category_of = |assessment: &CallTag| {
            catalog
                .get(&assessment.tag_id)
                .and_then(|tag| tag.category.as_deref())
                .map(str::to_string)
        };

        let behaviors = assessments
            .iter()
            .filter(|assessment| {
                matches!(
                    category_of(assessment).as_deref(),
                    Some("Sales") | Some("Communication")
                )
            })
            .filter_map(|assessment| catalog.get(&assessment.tag_id))
            .map(|tag| tag.code.clone())
            .collect();

        let service_issues = assessments
            .iter()
            .filter_map(|assessment| catalog.get(&assessment.tag_id))
            .filter(|tag| tag.category.as_deref() == Some(SERVICE_ISSUE_CATEGORY))
            .map(|tag| ServiceIssueView {
                tag: tag.code.clone(),
                severity: tag
                    .severity
                    .as_deref()
                    .map(str::to_ascii_lowercase)
                    .unwrap_or_else(|| "low".to_string()),
            })
            .collect();

        let mut ordered_signals: Vec<&CallSignal> = raw_signals.iter().collect();
        ordered_signals.sort_by(|a, b| compare_offsets(a.timestamp_sec, b.timestamp_sec));

        Self {
            behaviors,
            service_issues,
            signals: assessed_signals(call, assessments, &ordered_signals, catalog),
            missing_signals: missing_signals(assessments, catalog),
            raw_signals: ordered_signals
                .iter()
                .map(|signal| RawSignalView::from(*signal))
                .collect(),
        }
    }
}

fn assessed_signals(
    call: &Call,
    assessments: &[CallTag],
    raw_signals: &[&CallSignal],
    catalog: &TagCatalog,
) -> Vec<AssessedSignalView> {
    assessments
        .iter()
        .filter_map(|assessment| catalog.get(&assessment.tag_id).map(|tag| (assessment, tag)))
        .map(|(assessment, tag)| {
            let mut occurrences: Vec<SignalOccurrence> = raw_signals
                .iter()
                .filter(|signal| signal.signal_code == tag.code)
                .map(|signal| SignalOccurrence {
                    timestamp: call.offset_millis(signal.timestamp_sec),
                    context: signal.context_text.clone(),
                    reasoning: signal.reasoning.clone(),
                    confidence: signal.confidence,
                })
                .collect();

            if occurrences.is_empty() {
                occurrences.push(SignalOccurrence {
                    timestamp: call.offset_millis(assessment.timestamp_sec),
                    context: assessment.context_text.clone(),
                    reasoning: assessment.reasoning.clone(),
                    confidence: assessment.confidence,
                });
            }

            AssessedSignalView {
                tag: tag.code.clone(),
                name: tag.name.clone(),
                category: tag.category.clone(),
                dimension: tag.dimension.clone(),
                pillar: tag.pillar(),
                score: assessment.score,
                band: ScoreBand::for_signal_score(assessment.score),
                confidence: assessment.confidence,
                reasoning: assessment.reasoning.clone(),
                context: assessment.context_text.clone(),
                timestamp: call.offset_millis(assessment.timestamp_sec),
                severity: tag.severity.clone().unwrap_or_else(|| "none".to_string()),
                polarity: tag.polarity,
                is_mandatory: false,
                occurrences,
                context_events: assessment.context_events.clone(),
            }
        })
        .collect()
}

/// Mandatory active tags with no assessment on the call.
pub fn missing_signals(assessments: &[CallTag], catalog: &TagCatalog) -> Vec<MissingSignalView> {
    let assessed = TagAverages::from_assessments(assessments);
    catalog
        .mandatory()
        .filter(|tag| !assessed.contains(&tag.id))
        .map(|tag| MissingSignalView {
            tag: tag.code.clone(),
            name: tag.name.clone(),
            dimension: tag.dimension.clone(),
            pillar: tag.pillar(),
            score: 0.0,
            confidence: 1.0,
            reasoning: MISSING_MANDATORY_REASONING,
            context: MISSING_MANDATORY_CONTEXT,
            timestamp: None,
            severity: "high",
            polarity: Polarity::Negative,
            is_mandatory: true,
        })
        .collect()
}

/// Per-agent outcome row that feeds the correlation engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    pub id: AgentId,
    pub name: String,
    pub total_calls: usize,
    pub won_calls: usize,
    #[serde(serialize_with = "score")]
    pub win_rate: f64,
    #[serde(serialize_with = "score")]
    pub overall_score: f64,
}

impl From<&AgentSample> for LeaderboardRow {
    fn from(sample: &AgentSample) -> Self {
        Self {
            id: sample.id.clone(),
            name: sample.name.clone(),
            total_calls: sample.total_calls,
            won_calls: sample.won_calls,
            win_rate: sample.win_rate,
            overall_score: sample.overall_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagDetail {
    pub name: String,
    #[serde(serialize_with = "score")]
    pub score: f64,
}

/// Agent scorecard row with per-pillar tag breakdowns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorecardRow {
    pub id: AgentId,
    pub team_id: Option<String>,
    pub avatar_id: Option<String>,
    pub name: String,
    #[serde(serialize_with = "score")]
    pub overall_score: f64,
    pub recordings: usize,
    #[serde(serialize_with = "score")]
    pub win_rate: f64,
    #[serde(serialize_with = "score")]
    pub process: f64,
    #[serde(serialize_with = "score")]
    pub skills: f64,
    #[serde(serialize_with = "score")]
    pub communication: f64,
    pub process_details: Vec<TagDetail>,
    pub skills_details: Vec<TagDetail>,
    pub communication_details: Vec<TagDetail>,
}

/// Rounded per-tag averages for each reference tag of `pillar`, zero when unassessed.
pub fn tag_details(catalog: &TagCatalog, pillar: Pillar, averages: &TagAverages) -> Vec<TagDetail> {
    catalog
        .reference_tags(pillar)
        .map(|tag| TagDetail {
            name: tag.name.clone(),
            score: averages.get(&tag.id).unwrap_or(0.0).round(),
        })
        .collect()
}

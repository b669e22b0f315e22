//! Reconciles raw detected signals against the aggregated evidence stored on
//! tag assessments.
//!
//! The consistency score produced here measures the aggregation pipeline, not
//! agent performance.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::catalog::TagCatalog;
use super::domain::{
    compare_offsets, AgentId, Call, CallId, CallSignal, CallTag, ContextEvent, TagCode,
};
use super::serde_ext::{ratio, score};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyStatus {
    Ok,
    /// Fewer aggregated events than raw signals: evidence was dropped.
    MissingAggregation,
    /// More aggregated events than raw signals: evidence was duplicated or invented.
    ExtraAggregation,
}

impl ConsistencyStatus {
    /// Classifies `diff = eventCount - signalCount`.
    pub fn from_diff(diff: i64) -> Self {
        match diff {
            0 => Self::Ok,
            d if d < 0 => Self::MissingAggregation,
            _ => Self::ExtraAggregation,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::MissingAggregation => "missing_aggregation",
            Self::ExtraAggregation => "extra_aggregation",
        }
    }

    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditedSignal {
    pub timestamp_sec: Option<f64>,
    pub context_text: Option<String>,
    pub confidence: Option<f64>,
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditDetails {
    pub signals: Vec<AuditedSignal>,
    pub events: Vec<ContextEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagConsistency {
    pub tag_code: TagCode,
    pub tag_name: String,
    #[serde(serialize_with = "score")]
    pub score: f64,
    pub signal_count: usize,
    pub event_count: usize,
    pub diff: i64,
    pub status: ConsistencyStatus,
    pub details: AuditDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallAudit {
    pub call_id: CallId,
    pub started_at: DateTime<Utc>,
    pub agent_id: AgentId,
    pub agent_name: Option<String>,
    pub signal_count: usize,
    pub tag_count: usize,
    pub total_consistency_score: u8,
    pub issues_count: usize,
    pub analysis: Vec<TagConsistency>,
}

/// Audits one call's assessments against its raw signals.
///
/// Assessments whose tag is missing from the catalog are counted in
/// `tag_count` but not analysed, since their code cannot be matched to
/// signals. The consistency score is the rounded share of analysed tags with
/// status `ok`, or 0 when nothing could be analysed.
pub fn audit_call(
    call: &Call,
    agent_name: Option<&str>,
    assessments: &[CallTag],
    signals: &[CallSignal],
    catalog: &TagCatalog,
) -> CallAudit {
    let analysis: Vec<TagConsistency> = assessments
        .iter()
        .filter_map(|assessment| {
            catalog
                .get(&assessment.tag_id)
                .map(|tag| reconcile_tag(&tag.code, &tag.name, assessment, signals))
        })
        .collect();

    let ok_count = analysis.iter().filter(|entry| entry.status.is_ok()).count();
    let issues_count = analysis.len() - ok_count;
    let consistency = (100.0 * ratio(ok_count as f64, analysis.len() as f64)).round();

    CallAudit {
        call_id: call.id.clone(),
        started_at: call.started_at,
        agent_id: call.agent_id.clone(),
        agent_name: agent_name.map(str::to_string),
        signal_count: signals.len(),
        tag_count: assessments.len(),
        total_consistency_score: consistency.clamp(0.0, 100.0) as u8,
        issues_count,
        analysis,
    }
}

fn reconcile_tag(
    code: &TagCode,
    name: &str,
    assessment: &CallTag,
    signals: &[CallSignal],
) -> TagConsistency {
    let mut matched: Vec<AuditedSignal> = signals
        .iter()
        .filter(|signal| &signal.signal_code == code)
        .map(|signal| AuditedSignal {
            timestamp_sec: signal.timestamp_sec,
            context_text: signal.context_text.clone(),
            confidence: signal.confidence,
            reasoning: signal.reasoning.clone(),
        })
        .collect();
    matched.sort_by(|a, b| compare_offsets(a.timestamp_sec, b.timestamp_sec));

    let mut events = assessment.context_events.clone();
    events.sort_by(|a, b| compare_offsets(a.timestamp_sec, b.timestamp_sec));

    let diff = events.len() as i64 - matched.len() as i64;

    TagConsistency {
        tag_code: code.clone(),
        tag_name: name.to_string(),
        score: assessment.score,
        signal_count: matched.len(),
        event_count: events.len(),
        diff,
        status: ConsistencyStatus::from_diff(diff),
        details: AuditDetails {
            signals: matched,
            events,
        },
    }
}

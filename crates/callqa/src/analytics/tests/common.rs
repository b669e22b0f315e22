use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::analytics::catalog::{Polarity, ScoringRule, Tag, TagCatalog, WeightMap};
use crate::analytics::domain::{
    Agent, AgentId, Call, CallId, CallOutcome, CallSignal, CallTag, ContextEvent, Deal, TagCode,
    TagId,
};
use crate::analytics::repository::{AnalyticsRepository, RepositoryError, RuleFilter, TagFilter};
use crate::analytics::scoring::{ScoreAggregator, ScoreConfig};
use crate::analytics::store::{DatasetSnapshot, InMemoryStore};
use crate::analytics::timeframe::DateRange;
use crate::analytics::{analytics_router, AnalyticsService};
use crate::config::AnalysisConfig;

pub(super) fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn tag(id: &str, code: &str, dimension: &str, mandatory: bool) -> Tag {
    Tag {
        id: TagId::from(id),
        code: TagCode::from(code),
        name: code.replace('_', " "),
        category: Some("Sales".to_string()),
        dimension: Some(dimension.to_string()),
        polarity: Polarity::Positive,
        severity: None,
        is_mandatory: mandatory,
        active: true,
    }
}

/// Process: opening (mandatory), discovery. Skills: pitch, high intent.
/// Communication: tone. Other: billing issue. Plus one retired process tag.
pub(super) fn tags() -> Vec<Tag> {
    let mut billing = tag("t-billing", "billing_issue", "Service", false);
    billing.category = Some("Service Issue".to_string());
    billing.severity = Some("High".to_string());
    billing.polarity = Polarity::Negative;

    let mut retired = tag("t-retired", "legacy_script", "Sales.Process", true);
    retired.active = false;

    vec![
        tag("t-open", "opening_complete", "Sales.Process", true),
        tag("t-discovery", "needs_discovery", "Sales.Process", false),
        tag("t-pitch", "value_pitch", "Sales.Skills", false),
        tag("t-intent", "customer_high_intent", "Intent", false),
        tag("t-tone", "tone_positive", "Sales.Communication", false),
        billing,
        retired,
    ]
}

pub(super) fn rules() -> Vec<ScoringRule> {
    vec![ScoringRule {
        tag_code: TagCode::from("opening_complete"),
        weight: Some(2.0),
        rule_type: "TagBased".to_string(),
        active: true,
    }]
}

pub(super) fn aggregator() -> ScoreAggregator {
    ScoreAggregator::new(
        TagCatalog::new(tags()),
        WeightMap::from_rules(&rules()),
        ScoreConfig::default(),
    )
}

pub(super) fn assessment(call: &str, tag_id: &str, score: f64, events: usize) -> CallTag {
    CallTag {
        call_id: CallId::from(call),
        tag_id: TagId::from(tag_id),
        score,
        confidence: Some(0.9),
        context_text: Some(format!("{tag_id} evidence")),
        reasoning: None,
        context_events: (0..events)
            .map(|index| ContextEvent {
                timestamp_sec: Some(30.0 - index as f64 * 10.0),
                context_text: Some(format!("event {index}")),
                confidence: Some(0.8),
            })
            .collect(),
        timestamp_sec: Some(5.0),
    }
}

pub(super) fn signal(call: &str, code: &str, timestamp_sec: f64) -> CallSignal {
    CallSignal {
        call_id: CallId::from(call),
        signal_code: TagCode::from(code),
        signal_name: None,
        timestamp_sec: Some(timestamp_sec),
        confidence: Some(0.7),
        context_text: Some(format!("{code} at {timestamp_sec}")),
        reasoning: Some("detected".to_string()),
    }
}

pub(super) fn call(id: &str, agent: &str, started_at: DateTime<Utc>, duration: u32) -> Call {
    Call {
        id: CallId::from(id),
        agent_id: AgentId::from(agent),
        started_at,
        duration: Some(duration),
        outcome: CallOutcome::Unknown,
        audio_url: None,
    }
}

pub(super) fn deal(call: &Call, outcome: CallOutcome, onsite: bool) -> Deal {
    Deal {
        id: call.id.clone(),
        agent_id: call.agent_id.clone(),
        created_at: call.started_at,
        outcome,
        is_onsite_completed: onsite,
    }
}

pub(super) fn agent(id: &str, name: &str) -> Agent {
    Agent {
        id: AgentId::from(id),
        name: name.to_string(),
        avatar_id: None,
        team_id: Some("team-1".to_string()),
    }
}

/// Three calls for Ana in March, one for Ben in April.
///
/// `c1` is fully assessed with mixed aggregation quality; `c2` skips the
/// mandatory opening; `c3` has no assessments; `c4` belongs to Ben.
pub(super) fn snapshot() -> DatasetSnapshot {
    let c1 = call("c1", "a1", at(2025, 3, 10, 10), 120);
    let c2 = call("c2", "a1", at(2025, 3, 12, 9), 300);
    let c3 = call("c3", "a1", at(2025, 3, 14, 16), 95);
    let c4 = call("c4", "a2", at(2025, 4, 2, 11), 1000);

    let deals = vec![
        deal(&c1, CallOutcome::Won, true),
        deal(&c2, CallOutcome::Lost, false),
        deal(&c3, CallOutcome::Lost, true),
        deal(&c4, CallOutcome::Won, true),
    ];

    DatasetSnapshot {
        tags: tags(),
        scoring_rules: rules(),
        score_config: None,
        agents: vec![agent("a1", "Ana"), agent("a2", "Ben")],
        calls: vec![c1, c2, c3, c4],
        call_tags: vec![
            assessment("c1", "t-open", 80.0, 1),
            assessment("c1", "t-pitch", 60.0, 1),
            assessment("c1", "t-tone", 90.0, 3),
            assessment("c2", "t-discovery", 50.0, 0),
            assessment("c2", "t-billing", 20.0, 0),
            assessment("c4", "t-open", 100.0, 1),
            assessment("c4", "t-pitch", 100.0, 1),
            assessment("c4", "t-tone", 100.0, 1),
        ],
        call_signals: vec![
            signal("c1", "opening_complete", 3.0),
            signal("c1", "value_pitch", 40.0),
            signal("c1", "value_pitch", 12.0),
            signal("c1", "value_pitch", 25.0),
            signal("c1", "tone_positive", 60.0),
            signal("c4", "opening_complete", 2.0),
            signal("c4", "value_pitch", 20.0),
            signal("c4", "tone_positive", 50.0),
        ],
        deals,
    }
}

pub(super) fn store() -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::new(snapshot()))
}

pub(super) fn analysis_config(min_agent_calls: usize) -> AnalysisConfig {
    AnalysisConfig {
        min_agent_calls,
        ..AnalysisConfig::default()
    }
}

pub(super) fn build_service() -> (AnalyticsService<InMemoryStore>, Arc<InMemoryStore>) {
    let store = store();
    let service = AnalyticsService::new(store.clone(), analysis_config(1));
    (service, store)
}

pub(super) fn analytics_router_with_service(
    service: AnalyticsService<InMemoryStore>,
) -> axum::Router {
    analytics_router(Arc::new(service))
}

pub(super) struct UnavailableRepository;

impl AnalyticsRepository for UnavailableRepository {
    fn fetch_tags(&self, _filter: &TagFilter) -> Result<Vec<Tag>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_scoring_rules(
        &self,
        _filter: &RuleFilter,
    ) -> Result<Vec<ScoringRule>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_score_config(&self) -> Result<Option<ScoreConfig>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn save_score_config(&self, _config: ScoreConfig) -> Result<ScoreConfig, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_agents(&self) -> Result<Vec<Agent>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_call(&self, _id: &CallId) -> Result<Option<Call>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_calls(
        &self,
        _range: &DateRange,
        _agent: Option<&AgentId>,
    ) -> Result<Vec<Call>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_call_tags(&self, _call_ids: &[CallId]) -> Result<Vec<CallTag>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_call_signals(
        &self,
        _call_ids: &[CallId],
    ) -> Result<Vec<CallSignal>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_deals(&self, _call_ids: &[CallId]) -> Result<Vec<Deal>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_deals_in_range(&self, _range: &DateRange) -> Result<Vec<Deal>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn assert_status(response: &Response, status: StatusCode) {
    assert_eq!(response.status(), status);
}

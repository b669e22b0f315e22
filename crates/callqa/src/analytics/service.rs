use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use super::audit::{audit_call, CallAudit};
use super::catalog::{Pillar, TagCatalog, WeightMap};
use super::domain::{Agent, AgentId, Call, CallId, CallSignal, CallTag, Deal};
use super::duration::{self, DurationReport};
use super::repository::{AnalyticsRepository, RepositoryError, RuleFilter, TagFilter};
use super::scoring::intent::predict_intent;
use super::scoring::views::{
    tag_details, CallDetailView, CallDetails, CallRecord, LeaderboardRow, ScorecardRow,
};
use super::scoring::{Precision, ScoreAggregator, ScoreConfig, ScoreConfigError, TagAverages};
use super::serde_ext::ratio;
use super::timeframe::DateRange;
use super::validation::{build_report, AgentSample, ScoredCall, ValidationReport};
use crate::config::AnalysisConfig;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;
pub const DEFAULT_AUDIT_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct CallListQuery {
    pub range: DateRange,
    pub agent_id: Option<AgentId>,
    pub page: usize,
    pub page_size: usize,
    pub include_details: bool,
}

impl Default for CallListQuery {
    fn default() -> Self {
        Self {
            range: DateRange::all(),
            agent_id: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            include_details: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
    pub has_more: bool,
}

impl Pagination {
    fn new(page: usize, page_size: usize, total: usize) -> Self {
        let total_pages = total.div_ceil(page_size);
        Self {
            page,
            page_size,
            total,
            total_pages,
            has_more: page < total_pages,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallPage {
    pub data: Vec<CallRecord>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditPage {
    pub data: Vec<CallAudit>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// Service composing the repository with the scoring, audit, validation and
/// duration engines. Every operation loads its complete working set first
/// and fails the whole request on any repository error.
pub struct AnalyticsService<R> {
    repository: Arc<R>,
    config: AnalysisConfig,
}

impl<R> AnalyticsService<R>
where
    R: AnalyticsRepository + 'static,
{
    pub fn new(repository: Arc<R>, config: AnalysisConfig) -> Self {
        Self { repository, config }
    }

    pub fn analysis_config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Catalog, weight map and pillar weights for one request.
    pub fn scoring_context(&self) -> Result<ScoreAggregator, AnalyticsServiceError> {
        let tags = self.repository.fetch_tags(&TagFilter::ALL)?;
        let rules = self.repository.fetch_scoring_rules(&RuleFilter::ACTIVE)?;
        let config = self.repository.fetch_score_config()?.unwrap_or_default();

        Ok(ScoreAggregator::new(
            TagCatalog::new(tags),
            WeightMap::from_rules(&rules),
            config,
        ))
    }

    /// Display-mode page of calls, newest first. `page` is raised to 1 and
    /// `page_size` clamped to `1..=MAX_PAGE_SIZE`.
    pub fn list_calls(&self, query: &CallListQuery) -> Result<CallPage, AnalyticsServiceError> {
        let page_number = query.page.max(1);
        let page_size = query.page_size.clamp(1, MAX_PAGE_SIZE);

        let started = Instant::now();
        let calls = self
            .repository
            .fetch_calls(&query.range, query.agent_id.as_ref())?;
        let total = calls.len();
        let offset = (page_number - 1).saturating_mul(page_size);
        let mut page: Vec<Call> = calls
            .into_iter()
            .skip(offset)
            .take(page_size)
            .collect();

        let ids = call_ids(&page);
        self.apply_deal_outcomes(&mut page, &ids)?;
        let aggregator = self.scoring_context()?;
        let agents = self.agents_by_id()?;
        let assessments = group_by_call(self.repository.fetch_call_tags(&ids)?);
        let signals = if query.include_details {
            group_by_call(self.repository.fetch_call_signals(&ids)?)
        } else {
            HashMap::new()
        };

        let data = page
            .iter()
            .map(|call| {
                let call_tags = assessments.get(&call.id).map(Vec::as_slice).unwrap_or(&[]);
                let mut record = self.call_record(call, &agents, call_tags, &aggregator);
                if query.include_details {
                    let call_signals = signals.get(&call.id).map(Vec::as_slice).unwrap_or(&[]);
                    record.details = Some(CallDetails::build(
                        call,
                        call_tags,
                        call_signals,
                        aggregator.catalog(),
                    ));
                }
                record
            })
            .collect();

        tracing::info!(
            total,
            page = page_number,
            page_size,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "listed calls"
        );

        Ok(CallPage {
            data,
            pagination: Pagination::new(page_number, page_size, total),
        })
    }

    pub fn call_detail(&self, call_id: &CallId) -> Result<CallDetailView, AnalyticsServiceError> {
        let mut call = self.require_call(call_id)?;
        let ids = vec![call.id.clone()];
        let deals = self.repository.fetch_deals(&ids)?;
        let deal = deals.into_iter().find(|deal| deal.id == call.id);
        if let Some(deal) = &deal {
            call.outcome = deal.outcome;
        }

        let aggregator = self.scoring_context()?;
        let agents = self.agents_by_id()?;
        let assessments = self.repository.fetch_call_tags(&ids)?;
        let signals = self.repository.fetch_call_signals(&ids)?;

        tracing::debug!(
            call_id = %call.id,
            tags = assessments.len(),
            signals = signals.len(),
            "loaded call detail"
        );

        let mut record = self.call_record(&call, &agents, &assessments, &aggregator);
        record.details = Some(CallDetails::build(
            &call,
            &assessments,
            &signals,
            aggregator.catalog(),
        ));

        Ok(CallDetailView {
            record,
            outcome: call.outcome,
            is_onsite_completed: deal.is_some_and(|deal| deal.is_onsite_completed),
            predicted_intent: predict_intent(&assessments, aggregator.catalog()),
        })
    }

    /// Display-mode scorecard for every agent, best overall score first.
    pub fn agent_scorecard(
        &self,
        range: &DateRange,
    ) -> Result<Vec<ScorecardRow>, AnalyticsServiceError> {
        let started = Instant::now();
        let aggregator = self.scoring_context()?;
        let agents = self.repository.fetch_agents()?;
        let window = self.load_window(range)?;

        let mut rows: Vec<ScorecardRow> = agents
            .iter()
            .map(|agent| {
                let stats = window.agent_stats(&agent.id);
                let averages = TagAverages::from_assessments(stats.assessments.iter().copied());
                let score = aggregator.score_averages(&averages, Precision::Rounded);
                let catalog = aggregator.catalog();

                ScorecardRow {
                    id: agent.id.clone(),
                    team_id: agent.team_id.clone(),
                    avatar_id: agent.avatar_id.clone(),
                    name: agent.name.clone(),
                    overall_score: score.overall,
                    recordings: stats.total_calls,
                    win_rate: (ratio(stats.won_calls as f64, stats.total_calls as f64) * 100.0)
                        .round(),
                    process: score.pillars.process,
                    skills: score.pillars.skills,
                    communication: score.pillars.communication,
                    process_details: tag_details(catalog, Pillar::Process, &averages),
                    skills_details: tag_details(catalog, Pillar::Skills, &averages),
                    communication_details: tag_details(catalog, Pillar::Communication, &averages),
                }
            })
            .collect();

        rows.sort_by(|a, b| b.overall_score.total_cmp(&a.overall_score));

        tracing::info!(
            agents = rows.len(),
            calls = window.calls.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "built agent scorecard"
        );
        Ok(rows)
    }

    /// Agents with at least `min_calls` calls in the window, scored over
    /// their pooled assessments, best overall score first.
    pub fn leaderboard(
        &self,
        range: &DateRange,
        precision: Precision,
        min_calls: usize,
    ) -> Result<Vec<LeaderboardRow>, AnalyticsServiceError> {
        let aggregator = self.scoring_context()?;
        let window = self.load_window(range)?;
        let agents = self.repository.fetch_agents()?;
        let mut rows: Vec<LeaderboardRow> = self
            .agent_samples(&aggregator, &window, &agents, precision, min_calls)
            .iter()
            .map(LeaderboardRow::from)
            .collect();
        rows.sort_by(|a, b| b.overall_score.total_cmp(&a.overall_score));

        tracing::info!(agents = rows.len(), min_calls, "built leaderboard");
        Ok(rows)
    }

    pub fn validation_report(
        &self,
        range: &DateRange,
        precision: Option<Precision>,
    ) -> Result<ValidationReport, AnalyticsServiceError> {
        let started = Instant::now();
        let precision = precision.unwrap_or(self.config.precision);
        let aggregator = self.scoring_context()?;
        let window = self.load_window(range)?;
        let agents = self.repository.fetch_agents()?;

        let samples = self.agent_samples(
            &aggregator,
            &window,
            &agents,
            precision,
            self.config.min_agent_calls,
        );

        let scored_calls: Vec<ScoredCall> = window
            .calls
            .iter()
            .filter_map(|call| {
                let call_tags = window.assessments.get(&call.id)?;
                if call_tags.is_empty() {
                    return None;
                }
                let quality = aggregator.score(call_tags.iter(), Precision::Exact);
                Some(ScoredCall {
                    started_at: call.started_at,
                    overall_score: quality.overall,
                    won: call.outcome.is_won(),
                })
            })
            .collect();

        let report = build_report(samples, &scored_calls, precision);

        tracing::info!(
            sample_size = report.sample_size,
            calls = window.calls.len(),
            correlation = report.correlation,
            is_valid = report.summary.is_valid,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "computed score validation"
        );
        Ok(report)
    }

    /// Consistency audits for assessed calls, newest first.
    pub fn audit_calls(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<AuditPage, AnalyticsServiceError> {
        let started = Instant::now();
        let calls = self.repository.fetch_calls(&DateRange::all(), None)?;
        let ids = call_ids(&calls);
        let assessments = group_by_call(self.repository.fetch_call_tags(&ids)?);

        let assessed: Vec<&Call> = calls
            .iter()
            .filter(|call| assessments.get(&call.id).is_some_and(|tags| !tags.is_empty()))
            .collect();
        let total = assessed.len();
        let page: Vec<&Call> = assessed.into_iter().skip(offset).take(limit).collect();

        let page_ids: Vec<CallId> = page.iter().map(|call| call.id.clone()).collect();
        let signals = group_by_call(self.repository.fetch_call_signals(&page_ids)?);
        let catalog = TagCatalog::new(self.repository.fetch_tags(&TagFilter::ALL)?);
        let agents = self.agents_by_id()?;

        let data: Vec<CallAudit> = page
            .into_iter()
            .map(|call| {
                audit_call(
                    call,
                    agents.get(&call.agent_id).map(|agent| agent.name.as_str()),
                    assessments.get(&call.id).map(Vec::as_slice).unwrap_or(&[]),
                    signals.get(&call.id).map(Vec::as_slice).unwrap_or(&[]),
                    &catalog,
                )
            })
            .collect();

        let issues: usize = data.iter().map(|audit| audit.issues_count).sum();
        tracing::info!(
            total,
            audited = data.len(),
            issues,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "audited signal aggregation"
        );

        Ok(AuditPage {
            data,
            total,
            limit,
            offset,
        })
    }

    pub fn audit_call(&self, call_id: &CallId) -> Result<CallAudit, AnalyticsServiceError> {
        let call = self.require_call(call_id)?;
        let ids = vec![call.id.clone()];
        let assessments = self.repository.fetch_call_tags(&ids)?;
        let signals = self.repository.fetch_call_signals(&ids)?;
        let catalog = TagCatalog::new(self.repository.fetch_tags(&TagFilter::ALL)?);
        let agents = self.agents_by_id()?;

        let audit = audit_call(
            &call,
            agents.get(&call.agent_id).map(|agent| agent.name.as_str()),
            &assessments,
            &signals,
            &catalog,
        );
        if audit.issues_count > 0 {
            tracing::warn!(
                call_id = %call.id,
                issues = audit.issues_count,
                consistency = audit.total_consistency_score,
                "signal aggregation inconsistencies"
            );
        }
        Ok(audit)
    }

    pub fn duration_report(
        &self,
        range: &DateRange,
    ) -> Result<DurationReport, AnalyticsServiceError> {
        let started = Instant::now();
        let agents = self.repository.fetch_agents()?;
        let calls = self.repository.fetch_calls(range, None)?;
        let call_deals = self.repository.fetch_deals(&call_ids(&calls))?;
        let window_deals = self.repository.fetch_deals_in_range(range)?;

        let report = duration::analyze(&agents, &calls, &call_deals, &window_deals);

        tracing::info!(
            calls = calls.len(),
            deals = window_deals.len(),
            predicted_gain = report.summary.predicted_gain,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "analyzed call durations"
        );
        Ok(report)
    }

    pub fn score_config(&self) -> Result<ScoreConfig, AnalyticsServiceError> {
        Ok(self.repository.fetch_score_config()?.unwrap_or_default())
    }

    /// Validates and stores new pillar weights. Stored configurations are
    /// used as-is by later computations.
    pub fn update_score_config(
        &self,
        config: ScoreConfig,
    ) -> Result<ScoreConfig, AnalyticsServiceError> {
        config.validate()?;
        let stored = self.repository.save_score_config(config)?;
        tracing::info!(
            process = stored.process_weight,
            skills = stored.skills_weight,
            communication = stored.communication_weight,
            "updated score config"
        );
        Ok(stored)
    }

    fn require_call(&self, call_id: &CallId) -> Result<Call, AnalyticsServiceError> {
        self.repository
            .fetch_call(call_id)?
            .ok_or_else(|| AnalyticsServiceError::CallNotFound(call_id.clone()))
    }

    fn agents_by_id(&self) -> Result<HashMap<AgentId, Agent>, AnalyticsServiceError> {
        Ok(self
            .repository
            .fetch_agents()?
            .into_iter()
            .map(|agent| (agent.id.clone(), agent))
            .collect())
    }

    /// Deals share their call's id and carry the authoritative outcome.
    fn apply_deal_outcomes(
        &self,
        calls: &mut [Call],
        ids: &[CallId],
    ) -> Result<(), AnalyticsServiceError> {
        let deals: HashMap<CallId, Deal> = self
            .repository
            .fetch_deals(ids)?
            .into_iter()
            .map(|deal| (deal.id.clone(), deal))
            .collect();
        for call in calls.iter_mut() {
            if let Some(deal) = deals.get(&call.id) {
                call.outcome = deal.outcome;
            }
        }
        Ok(())
    }

    fn load_window(&self, range: &DateRange) -> Result<Window, AnalyticsServiceError> {
        let mut calls = self.repository.fetch_calls(range, None)?;
        let ids = call_ids(&calls);
        self.apply_deal_outcomes(&mut calls, &ids)?;
        let assessments = group_by_call(self.repository.fetch_call_tags(&ids)?);
        tracing::debug!(
            calls = calls.len(),
            assessed_calls = assessments.len(),
            "loaded reporting window"
        );
        Ok(Window { calls, assessments })
    }

    fn agent_samples(
        &self,
        aggregator: &ScoreAggregator,
        window: &Window,
        agents: &[Agent],
        precision: Precision,
        min_calls: usize,
    ) -> Vec<AgentSample> {
        agents
            .iter()
            .filter_map(|agent| {
                let stats = window.agent_stats(&agent.id);
                if stats.total_calls == 0 || stats.total_calls < min_calls {
                    return None;
                }
                let quality = aggregator.score(stats.assessments.iter().copied(), precision);
                let mut sample = AgentSample::new(
                    agent.id.clone(),
                    agent.name.clone(),
                    quality.overall,
                    stats.total_calls,
                    stats.won_calls,
                );
                if precision == Precision::Rounded {
                    sample.win_rate = (sample.win_rate * 100.0).round() / 100.0;
                }
                Some(sample)
            })
            .collect()
    }

    fn call_record(
        &self,
        call: &Call,
        agents: &HashMap<AgentId, Agent>,
        assessments: &[CallTag],
        aggregator: &ScoreAggregator,
    ) -> CallRecord {
        let agent = agents.get(&call.agent_id);
        let quality = aggregator.score(assessments, Precision::Rounded);
        CallRecord::new(
            call,
            agent.map(|agent| agent.name.as_str()),
            agent.and_then(|agent| agent.avatar_id.as_deref()),
            assessments,
            aggregator.catalog(),
            &quality,
        )
    }
}

/// Calls of one reporting window with their assessments grouped by call.
struct Window {
    calls: Vec<Call>,
    assessments: HashMap<CallId, Vec<CallTag>>,
}

struct AgentWindowStats<'a> {
    total_calls: usize,
    won_calls: usize,
    assessments: Vec<&'a CallTag>,
}

impl Window {
    fn agent_stats(&self, agent_id: &AgentId) -> AgentWindowStats<'_> {
        let mut stats = AgentWindowStats {
            total_calls: 0,
            won_calls: 0,
            assessments: Vec::new(),
        };
        for call in self.calls.iter().filter(|call| &call.agent_id == agent_id) {
            stats.total_calls += 1;
            if call.outcome.is_won() {
                stats.won_calls += 1;
            }
            if let Some(tags) = self.assessments.get(&call.id) {
                stats.assessments.extend(tags.iter());
            }
        }
        stats
    }
}

fn call_ids(calls: &[Call]) -> Vec<CallId> {
    calls.iter().map(|call| call.id.clone()).collect()
}

trait ByCall {
    fn call_id(&self) -> &CallId;
}

impl ByCall for CallTag {
    fn call_id(&self) -> &CallId {
        &self.call_id
    }
}

impl ByCall for CallSignal {
    fn call_id(&self) -> &CallId {
        &self.call_id
    }
}

fn group_by_call<T: ByCall>(rows: Vec<T>) -> HashMap<CallId, Vec<T>> {
    let mut grouped: HashMap<CallId, Vec<T>> = HashMap::new();
    for row in rows {
        grouped.entry(row.call_id().clone()).or_default().push(row);
    }
    grouped
}

/// Error raised by the analytics service.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("call {0} not found")]
    CallNotFound(CallId),
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error(transparent)]
    InvalidConfig(#[from] ScoreConfigError),
}

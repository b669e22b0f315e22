use super::catalog::{ScoringRule, Tag};
use super::domain::{Agent, AgentId, Call, CallId, CallSignal, CallTag, Deal};
use super::scoring::ScoreConfig;
use super::timeframe::DateRange;

/// Which tags to load. The catalog keeps inactive tags so historical
/// assessments still resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagFilter {
    pub active_only: bool,
}

impl TagFilter {
    pub const ALL: Self = Self { active_only: false };
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleFilter {
    pub active_only: bool,
}

impl RuleFilter {
    pub const ACTIVE: Self = Self { active_only: true };
}

/// Read access to synced call data, plus the single writable score config.
///
/// Implementations return complete result sets; the scoring paths never page.
pub trait AnalyticsRepository: Send + Sync {
    fn fetch_tags(&self, filter: &TagFilter) -> Result<Vec<Tag>, RepositoryError>;
    fn fetch_scoring_rules(&self, filter: &RuleFilter) -> Result<Vec<ScoringRule>, RepositoryError>;
    fn fetch_score_config(&self) -> Result<Option<ScoreConfig>, RepositoryError>;
    fn save_score_config(&self, config: ScoreConfig) -> Result<ScoreConfig, RepositoryError>;
    fn fetch_agents(&self) -> Result<Vec<Agent>, RepositoryError>;
    fn fetch_call(&self, id: &CallId) -> Result<Option<Call>, RepositoryError>;
    /// Calls started inside `range`, newest first.
    fn fetch_calls(
        &self,
        range: &DateRange,
        agent: Option<&AgentId>,
    ) -> Result<Vec<Call>, RepositoryError>;
    fn fetch_call_tags(&self, call_ids: &[CallId]) -> Result<Vec<CallTag>, RepositoryError>;
    fn fetch_call_signals(&self, call_ids: &[CallId]) -> Result<Vec<CallSignal>, RepositoryError>;
    fn fetch_deals(&self, call_ids: &[CallId]) -> Result<Vec<Deal>, RepositoryError>;
    /// Deals created inside `range`, regardless of which call produced them.
    fn fetch_deals_in_range(&self, range: &DateRange) -> Result<Vec<Deal>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

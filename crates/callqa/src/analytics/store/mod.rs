//! In-memory repository over a dataset snapshot, plus the loaders that fill it.

mod export;
mod snapshot;

pub use export::CallExportImporter;
pub use snapshot::{DatasetSnapshot, SnapshotImportError, SnapshotLoader};

use std::collections::HashSet;
use std::sync::{RwLock, RwLockReadGuard};

use super::catalog::{ScoringRule, Tag};
use super::domain::{Agent, AgentId, Call, CallId, CallSignal, CallTag, Deal};
use super::repository::{AnalyticsRepository, RepositoryError, RuleFilter, TagFilter};
use super::scoring::ScoreConfig;
use super::timeframe::DateRange;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    snapshot: RwLock<DatasetSnapshot>,
}

impl InMemoryStore {
    pub fn new(snapshot: DatasetSnapshot) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, DatasetSnapshot>, RepositoryError> {
        self.snapshot
            .read()
            .map_err(|_| RepositoryError::Unavailable("snapshot lock poisoned".to_string()))
    }
}

fn id_set(call_ids: &[CallId]) -> HashSet<&CallId> {
    call_ids.iter().collect()
}

impl AnalyticsRepository for InMemoryStore {
    fn fetch_tags(&self, filter: &TagFilter) -> Result<Vec<Tag>, RepositoryError> {
        let snapshot = self.read()?;
        Ok(snapshot
            .tags
            .iter()
            .filter(|tag| !filter.active_only || tag.active)
            .cloned()
            .collect())
    }

    fn fetch_scoring_rules(&self, filter: &RuleFilter) -> Result<Vec<ScoringRule>, RepositoryError> {
        let snapshot = self.read()?;
        Ok(snapshot
            .scoring_rules
            .iter()
            .filter(|rule| !filter.active_only || rule.active)
            .cloned()
            .collect())
    }

    fn fetch_score_config(&self) -> Result<Option<ScoreConfig>, RepositoryError> {
        Ok(self.read()?.score_config.clone())
    }

    fn save_score_config(&self, config: ScoreConfig) -> Result<ScoreConfig, RepositoryError> {
        let mut snapshot = self
            .snapshot
            .write()
            .map_err(|_| RepositoryError::Unavailable("snapshot lock poisoned".to_string()))?;
        snapshot.score_config = Some(config.clone());
        Ok(config)
    }

    fn fetch_agents(&self) -> Result<Vec<Agent>, RepositoryError> {
        Ok(self.read()?.agents.clone())
    }

    fn fetch_call(&self, id: &CallId) -> Result<Option<Call>, RepositoryError> {
        let snapshot = self.read()?;
        Ok(snapshot.calls.iter().find(|call| &call.id == id).cloned())
    }

    fn fetch_calls(
        &self,
        range: &DateRange,
        agent: Option<&AgentId>,
    ) -> Result<Vec<Call>, RepositoryError> {
        let snapshot = self.read()?;
        let mut calls: Vec<Call> = snapshot
            .calls
            .iter()
            .filter(|call| range.contains(call.started_at))
            .filter(|call| agent.map_or(true, |agent| &call.agent_id == agent))
            .cloned()
            .collect();
        calls.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(calls)
    }

    fn fetch_call_tags(&self, call_ids: &[CallId]) -> Result<Vec<CallTag>, RepositoryError> {
        let wanted = id_set(call_ids);
        let snapshot = self.read()?;
        Ok(snapshot
            .call_tags
            .iter()
            .filter(|tag| wanted.contains(&tag.call_id))
            .cloned()
            .collect())
    }

    fn fetch_call_signals(&self, call_ids: &[CallId]) -> Result<Vec<CallSignal>, RepositoryError> {
        let wanted = id_set(call_ids);
        let snapshot = self.read()?;
        Ok(snapshot
            .call_signals
            .iter()
            .filter(|signal| wanted.contains(&signal.call_id))
            .cloned()
            .collect())
    }

    fn fetch_deals(&self, call_ids: &[CallId]) -> Result<Vec<Deal>, RepositoryError> {
        let wanted = id_set(call_ids);
        let snapshot = self.read()?;
        Ok(snapshot
            .deals
            .iter()
            .filter(|deal| wanted.contains(&deal.id))
            .cloned()
            .collect())
    }

    fn fetch_deals_in_range(&self, range: &DateRange) -> Result<Vec<Deal>, RepositoryError> {
        let snapshot = self.read()?;
        Ok(snapshot
            .deals
            .iter()
            .filter(|deal| range.contains(deal.created_at))
            .cloned()
            .collect())
    }
}

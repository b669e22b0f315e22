//! Call quality analytics: tag catalog, weighted scoring, signal aggregation
//! audit, outcome validation and duration analysis.
//!
//! Data flows from the repository into the catalog and score aggregator,
//! whose per-call and per-agent scores feed the validation engine. The audit
//! and duration paths read the same repository independently.

pub mod audit;
pub mod catalog;
pub mod domain;
pub mod duration;
pub mod repository;
pub mod router;
pub mod scoring;
pub(crate) mod serde_ext;
pub mod service;
pub mod store;
pub mod timeframe;
pub mod validation;

#[cfg(test)]
mod tests;

pub use audit::{audit_call, CallAudit, ConsistencyStatus, TagConsistency};
pub use catalog::{Pillar, Polarity, ScoringRule, Tag, TagCatalog, WeightMap, DEFAULT_TAG_WEIGHT};
pub use domain::{
    decode_context_events, Agent, AgentId, Call, CallId, CallOutcome, CallSignal, CallTag,
    ContextEvent, Deal, TagCode, TagId,
};
pub use duration::{DurationBucket, DurationReport, DurationSummary};
pub use repository::{AnalyticsRepository, RepositoryError, RuleFilter, TagFilter};
pub use router::analytics_router;
pub use scoring::{
    calc_dim_score, Precision, QualityScore, ScoreAggregator, ScoreBand, ScoreConfig,
    ScoreConfigError, TagAverages,
};
pub use serde_ext::{finite_or_zero, ratio};
pub use service::{AnalyticsService, AnalyticsServiceError, AuditPage, CallListQuery, CallPage};
pub use store::{CallExportImporter, DatasetSnapshot, InMemoryStore, SnapshotImportError, SnapshotLoader};
pub use timeframe::{DateRange, Timeframe};
pub use validation::{ValidationReport, ValidationSummary, VALIDITY_THRESHOLD};

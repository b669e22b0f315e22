use callqa::analytics::timeframe::resolve_range;
use callqa::analytics::{
    CallExportImporter, DatasetSnapshot, DateRange, InMemoryStore, Precision, SnapshotLoader,
    Timeframe,
};
use callqa::error::AppError;
use chrono::{NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Loads the JSON snapshot at `path`, or starts from an empty dataset.
pub(crate) fn load_store(path: Option<&Path>) -> Result<Arc<InMemoryStore>, AppError> {
    let snapshot = match path {
        Some(path) => {
            let snapshot = SnapshotLoader::from_path(path)?;
            tracing::info!(
                path = %path.display(),
                agents = snapshot.agents.len(),
                calls = snapshot.calls.len(),
                call_tags = snapshot.call_tags.len(),
                call_signals = snapshot.call_signals.len(),
                "loaded dataset snapshot"
            );
            snapshot
        }
        None => {
            tracing::warn!("no dataset configured; serving an empty store");
            DatasetSnapshot::default()
        }
    };
    Ok(Arc::new(InMemoryStore::new(snapshot)))
}

/// Builds a store from a call export CSV. Only calls, deals and agents are populated.
pub(crate) fn load_call_export(path: &Path) -> Result<Arc<InMemoryStore>, AppError> {
    let snapshot = CallExportImporter::from_path(path)?;
    Ok(Arc::new(InMemoryStore::new(snapshot)))
}

pub(crate) fn parse_timeframe(raw: &str) -> Result<Timeframe, String> {
    raw.parse()
}

pub(crate) fn parse_precision(raw: &str) -> Result<Precision, String> {
    raw.parse()
}

pub(crate) fn window(
    timeframe: Timeframe,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> DateRange {
    resolve_range(timeframe, start_date, end_date, Utc::now())
}

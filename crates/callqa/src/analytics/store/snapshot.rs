use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

use crate::analytics::catalog::{ScoringRule, Tag};
use crate::analytics::domain::{Agent, Call, CallSignal, CallTag, Deal};
use crate::analytics::scoring::ScoreConfig;

/// Everything the analytics paths read, as exported by the sync jobs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatasetSnapshot {
    pub tags: Vec<Tag>,
    pub scoring_rules: Vec<ScoringRule>,
    pub score_config: Option<ScoreConfig>,
    pub agents: Vec<Agent>,
    pub calls: Vec<Call>,
    #[serde(alias = "callAssessments")]
    pub call_tags: Vec<CallTag>,
    pub call_signals: Vec<CallSignal>,
    pub deals: Vec<Deal>,
}

#[derive(Debug)]
pub enum SnapshotImportError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for SnapshotImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotImportError::Io(err) => write!(f, "failed to read dataset: {}", err),
            SnapshotImportError::Json(err) => write!(f, "invalid dataset snapshot: {}", err),
            SnapshotImportError::Csv(err) => write!(f, "invalid call export CSV: {}", err),
        }
    }
}

impl std::error::Error for SnapshotImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SnapshotImportError::Io(err) => Some(err),
            SnapshotImportError::Json(err) => Some(err),
            SnapshotImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for SnapshotImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for SnapshotImportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<csv::Error> for SnapshotImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

pub struct SnapshotLoader;

impl SnapshotLoader {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<DatasetSnapshot, SnapshotImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<DatasetSnapshot, SnapshotImportError> {
        let snapshot = serde_json::from_reader(reader)?;
        Ok(snapshot)
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use super::snapshot::{DatasetSnapshot, SnapshotImportError};
use crate::analytics::domain::{Agent, AgentId, Call, CallId, CallOutcome, Deal};
use crate::analytics::serde_ext::{empty_string_as_none, flexible_bool, flexible_seconds};

/// Flat call export: one row per call with its deal outcome inlined.
///
/// Required columns are `id`, `agentId`, `startedAt`, `duration`, `outcome`
/// and `isOnsiteCompleted`; `agentName` is optional. Each row yields a call
/// and a deal sharing its id, dated at the call start.
pub struct CallExportImporter;

impl CallExportImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<DatasetSnapshot, SnapshotImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<DatasetSnapshot, SnapshotImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut snapshot = DatasetSnapshot::default();
        let mut agents: BTreeMap<AgentId, String> = BTreeMap::new();

        for record in csv_reader.deserialize::<CallExportRow>() {
            let row = record?;
            let agent_id = AgentId(row.agent_id);
            let name = row.agent_name.unwrap_or_else(|| agent_id.0.clone());
            agents.entry(agent_id.clone()).or_insert(name);

            let id = CallId(row.id);
            snapshot.calls.push(Call {
                id: id.clone(),
                agent_id: agent_id.clone(),
                started_at: row.started_at,
                duration: row.duration,
                outcome: row.outcome,
                audio_url: None,
            });
            snapshot.deals.push(Deal {
                id,
                agent_id,
                created_at: row.started_at,
                outcome: row.outcome,
                is_onsite_completed: row.is_onsite_completed,
            });
        }

        snapshot.agents = agents
            .into_iter()
            .map(|(id, name)| Agent {
                id,
                name,
                avatar_id: None,
                team_id: None,
            })
            .collect();

        Ok(snapshot)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CallExportRow {
    id: String,
    agent_id: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    agent_name: Option<String>,
    #[serde(deserialize_with = "export_timestamp")]
    started_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "flexible_seconds")]
    duration: Option<u32>,
    #[serde(default)]
    outcome: CallOutcome,
    #[serde(default, deserialize_with = "flexible_bool")]
    is_onsite_completed: bool,
}

fn export_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid startedAt '{raw}'")))
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

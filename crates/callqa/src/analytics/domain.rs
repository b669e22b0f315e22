use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::serde_ext::{empty_string_as_none, flexible_bool, flexible_seconds, null_as_default};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(pub String);

/// Stable tag key. Scoring rules and raw signals reference tags by code, never by id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagCode(pub String);

macro_rules! display_newtype {
    ($($name:ident),*) => {
        $(
            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl From<&str> for $name {
                fn from(value: &str) -> Self {
                    Self(value.to_string())
                }
            }
        )*
    };
}

display_newtype!(AgentId, CallId, TagId, TagCode);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    #[serde(default)]
    pub avatar_id: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallOutcome {
    Won,
    Lost,
    #[default]
    #[serde(other)]
    Unknown,
}

impl CallOutcome {
    pub fn is_won(self) -> bool {
        self == Self::Won
    }

    /// Coarse business grade shown next to the quality score.
    pub const fn business_grade(self) -> &'static str {
        match self {
            Self::Won => "High",
            Self::Lost => "Low",
            Self::Unknown => "Medium",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    pub id: CallId,
    pub agent_id: AgentId,
    pub started_at: DateTime<Utc>,
    /// Seconds. Missing durations count as zero.
    #[serde(default, deserialize_with = "flexible_seconds")]
    pub duration: Option<u32>,
    #[serde(default)]
    pub outcome: CallOutcome,
    #[serde(default)]
    pub audio_url: Option<String>,
}

impl Call {
    pub fn duration_secs(&self) -> u32 {
        self.duration.unwrap_or(0)
    }

    /// Absolute epoch milliseconds of an offset inside the recording.
    pub fn offset_millis(&self, timestamp_sec: Option<f64>) -> Option<i64> {
        timestamp_sec
            .filter(|secs| secs.is_finite())
            .map(|secs| self.started_at.timestamp_millis() + (secs * 1000.0).round() as i64)
    }
}

/// One piece of aggregated, user-visible evidence attached to a tag assessment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContextEvent {
    #[serde(default)]
    pub timestamp_sec: Option<f64>,
    #[serde(default)]
    pub context_text: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Aggregated score for one tag on one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "CallTagRow")]
pub struct CallTag {
    pub call_id: CallId,
    pub tag_id: TagId,
    pub score: f64,
    pub confidence: Option<f64>,
    pub context_text: Option<String>,
    pub reasoning: Option<String>,
    pub context_events: Vec<ContextEvent>,
    pub timestamp_sec: Option<f64>,
}

/// Stored shape of `contextEvents`: an array, a JSON-encoded string, or null.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredContextEvents {
    Events(Vec<ContextEvent>),
    Encoded(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CallTagRow {
    call_id: CallId,
    tag_id: TagId,
    #[serde(default, deserialize_with = "null_as_default")]
    score: f64,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default, alias = "context_text", deserialize_with = "empty_string_as_none")]
    context_text: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default, alias = "context_events")]
    context_events: Option<StoredContextEvents>,
    #[serde(default, alias = "timestamp_sec")]
    timestamp_sec: Option<f64>,
}

impl From<CallTagRow> for CallTag {
    fn from(row: CallTagRow) -> Self {
        let context_events = match row.context_events {
            None => Vec::new(),
            Some(StoredContextEvents::Events(events)) => events,
            Some(StoredContextEvents::Encoded(raw)) => {
                decode_context_events(Some(&raw), row.context_text.as_deref())
            }
        };

        Self {
            call_id: row.call_id,
            tag_id: row.tag_id,
            score: row.score,
            confidence: row.confidence,
            context_text: row.context_text,
            reasoning: row.reasoning,
            context_events,
            timestamp_sec: row.timestamp_sec,
        }
    }
}

/// Decodes the `context_events` column.
///
/// Empty or null columns yield no events. A column that is not valid JSON falls
/// back to splitting `context_text` on `" | "`, one event per non-blank fragment.
pub fn decode_context_events(raw: Option<&str>, context_text: Option<&str>) -> Vec<ContextEvent> {
    let raw = match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Vec::new(),
    };

    match serde_json::from_str::<Option<Vec<ContextEvent>>>(raw) {
        Ok(events) => events.unwrap_or_default(),
        Err(_) => context_text
            .map(|text| {
                text.split(" | ")
                    .map(str::trim)
                    .filter(|fragment| !fragment.is_empty())
                    .map(|fragment| ContextEvent {
                        context_text: Some(fragment.to_string()),
                        ..ContextEvent::default()
                    })
                    .collect()
            })
            .unwrap_or_default(),
    }
}

/// Raw, pre-aggregation detection emitted by the upstream analysis pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSignal {
    pub call_id: CallId,
    #[serde(alias = "signalId")]
    pub signal_code: TagCode,
    #[serde(default)]
    pub signal_name: Option<String>,
    #[serde(default)]
    pub timestamp_sec: Option<f64>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub context_text: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// CRM deal keyed by the same id as the call that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: CallId,
    pub agent_id: AgentId,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub outcome: CallOutcome,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_onsite_completed: bool,
}

/// Orders optional recording offsets ascending, untimed entries last.
pub fn compare_offsets(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

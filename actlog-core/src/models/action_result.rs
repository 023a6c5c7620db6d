use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::activity::parse_timestamp;

/// An agent's reported outcome for a single action id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionResultRecord {
    #[serde(skip)]
    pub id: String,
    pub action_id: Option<String>,
    pub agent_id: Option<String>,
    #[serde(rename = "@timestamp")]
    pub timestamp: Option<serde_json::Value>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub error: Option<String>,
    pub action_data: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ActionResultRecord {
    pub fn from_document(id: &str, source: &serde_json::Value) -> Option<Self> {
        let mut record: Self = serde_json::from_value(source.clone()).ok()?;
        record.id = id.to_string();
        Some(record)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_ref().and_then(parse_timestamp)
    }

    pub fn is_error(&self) -> bool {
        self.error.as_deref().is_some_and(|e| !e.is_empty())
    }

    pub fn command(&self) -> Option<&str> {
        self.action_data.as_ref()?.get("command")?.as_str()
    }
}

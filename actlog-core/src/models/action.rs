use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::activity::parse_timestamp;

/// A command dispatched to one or more endpoint agents, as stored in the
/// fleet actions index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Document id; not part of the stored body.
    #[serde(skip)]
    pub id: String,
    pub action_id: Option<String>,
    #[serde(default)]
    pub agents: Vec<String>,
    pub input_type: Option<String>,
    #[serde(rename = "type")]
    pub action_type: Option<String>,
    #[serde(rename = "@timestamp")]
    pub timestamp: Option<serde_json::Value>,
    pub expiration: Option<String>,
    pub user_id: Option<String>,
    pub data: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ActionRecord {
    pub fn from_document(id: &str, source: &serde_json::Value) -> Option<Self> {
        let mut record: Self = serde_json::from_value(source.clone()).ok()?;
        record.id = id.to_string();
        Some(record)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_ref().and_then(parse_timestamp)
    }

    /// Endpoint command (`isolate`, `unisolate`, ...) carried in the payload.
    pub fn command(&self) -> Option<&str> {
        self.data.as_ref()?.get("command")?.as_str()
    }

    pub fn comment(&self) -> Option<&str> {
        self.data.as_ref()?.get("comment")?.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_document_reads_fleet_action() {
        let source = serde_json::json!({
            "action_id": "a-1",
            "agents": ["agent-1"],
            "input_type": "endpoint",
            "type": "INPUT_ACTION",
            "@timestamp": "2021-09-01T10:00:00.000Z",
            "user_id": "elastic",
            "data": { "command": "isolate", "comment": "suspicious process" },
            "minimum_execution_duration": 60
        });

        let record = ActionRecord::from_document("doc-1", &source).unwrap();
        assert_eq!(record.id, "doc-1");
        assert_eq!(record.action_id.as_deref(), Some("a-1"));
        assert_eq!(record.agents, vec!["agent-1".to_string()]);
        assert_eq!(record.action_type.as_deref(), Some("INPUT_ACTION"));
        assert_eq!(record.command(), Some("isolate"));
        assert_eq!(record.comment(), Some("suspicious process"));
        assert!(record.created_at().is_some());
        assert_eq!(record.extra["minimum_execution_duration"], 60);
    }

    #[test]
    fn test_from_document_tolerates_sparse_body() {
        let record = ActionRecord::from_document("doc-2", &serde_json::json!({})).unwrap();
        assert!(record.action_id.is_none());
        assert!(record.agents.is_empty());
        assert!(record.command().is_none());
        assert!(record.created_at().is_none());
    }
}

//! Activity log entries as returned to operators.
//!
//! An entry is either an action issued to an agent or a response the agent
//! reported back. Both share the same `{id, data}` item shape, where `data` is
//! the stored document body passed through untouched.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ActionRecord, ActionResultRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Action,
    Response,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::Response => "response",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLogItem {
    pub id: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ActivityLogEntry {
    Action { item: ActivityLogItem },
    Response { item: ActivityLogItem },
}

impl ActivityLogEntry {
    pub fn action(id: impl Into<String>, data: serde_json::Value) -> Self {
        Self::Action {
            item: ActivityLogItem { id: id.into(), data },
        }
    }

    pub fn response(id: impl Into<String>, data: serde_json::Value) -> Self {
        Self::Response {
            item: ActivityLogItem { id: id.into(), data },
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            Self::Action { .. } => EntryKind::Action,
            Self::Response { .. } => EntryKind::Response,
        }
    }

    pub fn item(&self) -> &ActivityLogItem {
        match self {
            Self::Action { item } | Self::Response { item } => item,
        }
    }

    /// `@timestamp` of the underlying document, if present and parseable.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.item().data.get("@timestamp").and_then(parse_timestamp)
    }

    pub fn as_action(&self) -> Option<ActionRecord> {
        match self {
            Self::Action { item } => ActionRecord::from_document(&item.id, &item.data),
            Self::Response { .. } => None,
        }
    }

    pub fn as_response(&self) -> Option<ActionResultRecord> {
        match self {
            Self::Response { item } => ActionResultRecord::from_document(&item.id, &item.data),
            Self::Action { .. } => None,
        }
    }
}

/// One page of the activity log. `page` and `page_size` echo the request and
/// say nothing about how many entries `data` holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogPage {
    pub page: u32,
    pub page_size: u32,
    pub data: Vec<ActivityLogEntry>,
}

/// Accepts RFC 3339 strings, zone-less date-times and bare dates (read as
/// UTC), and epoch-millisecond numbers.
pub fn parse_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(s) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
                return Some(naive.and_utc());
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        }
        serde_json::Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

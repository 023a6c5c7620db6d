use serde::{Deserialize, Serialize};

use crate::error::ActlogError;

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ActlogRequest {
    Ping,
    Health,
    ActivityLog {
        agent_id: String,
        page: Option<u32>,
        page_size: Option<u32>,
    },
}

impl ActlogRequest {
    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, ActlogError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }

    pub fn to_msgpack(&self) -> Result<Vec<u8>, ActlogError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ActlogResponse {
    pub status: String,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub version: String,
}

impl ActlogResponse {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            status: "ok".to_string(),
            data: Some(data),
            error: None,
            version: "0.1.0".to_string(),
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            data: None,
            error: Some(msg.into()),
            version: "0.1.0".to_string(),
        }
    }

    pub fn pong() -> Self {
        Self::ok(serde_json::json!({"pong": true}))
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, ActlogError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }

    pub fn to_msgpack(&self) -> Result<Vec<u8>, ActlogError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }
}

//! Actlog HTTP REST API
//!
//! Axum-based HTTP server that exposes the endpoint activity log over HTTP.
//! Runs alongside the Unix socket IPC server on port 8767 (configurable).
//!
//! Each endpoint has a thin axum handler that delegates to a pure inner
//! function, so the inner functions can be tested without axum dispatch.
//!
//! Endpoints:
//! - GET /health                               — search cluster health
//! - GET /version                              — server version info
//! - GET /api/endpoint/action_log/:agent_id    — one page of the activity log

use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use actlog_core::ipc::{ActlogRequest, ActlogResponse};
use actlog_core::search::SearchBackend;
use actlog_core::ActlogConfig;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::subsystems::activity_log;

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub backend: Arc<dyn SearchBackend>,
    pub config: ActlogConfig,
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/api/endpoint/action_log/:agent_id", get(activity_log_handler))
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    backend: Arc<dyn SearchBackend>,
    config: ActlogConfig,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", config.http.host, config.http.port);
    let state = Arc::new(HttpState { backend, config });

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Actlog HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Request / Response DTOs
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct ActivityLogQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Standard HTTP error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            error: msg.into(),
            status: "error".to_string(),
        }
    }

    fn into_value(self) -> serde_json::Value {
        serde_json::to_value(&self)
            .unwrap_or_else(|_| serde_json::json!({ "error": self.error, "status": "error" }))
    }
}

// ============================================================================
// Inner (directly testable) functions
// ============================================================================

/// Inner health check — pings the search cluster and returns (status_code, json_body).
pub async fn health_inner(
    backend: &dyn SearchBackend,
    socket_path: &str,
) -> (StatusCode, serde_json::Value) {
    match backend.info().await {
        Ok(info) => (
            StatusCode::OK,
            serde_json::json!({
                "status": "healthy",
                "version": env!("CARGO_PKG_VERSION"),
                "backend": backend.name(),
                "cluster_name": info.cluster_name,
                "cluster_version": info.version,
                "socket": socket_path,
            }),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            serde_json::json!({
                "status": "unhealthy",
                "error": e.to_string(),
            }),
        ),
    }
}

/// Inner version — returns version info (pure, no IO).
pub fn version_inner() -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": "actlog/1",
    })
}

/// Inner activity log — validates paging and calls the IPC router.
pub async fn activity_log_inner(
    backend: &dyn SearchBackend,
    config: &ActlogConfig,
    agent_id: String,
    query: ActivityLogQuery,
) -> (StatusCode, serde_json::Value) {
    if agent_id.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("agent_id is required").into_value(),
        );
    }

    let (page, page_size) = match activity_log::resolve_paging(query.page, query.page_size) {
        Ok(paging) => paging,
        Err(e) => return (StatusCode::BAD_REQUEST, ErrorResponse::new(e).into_value()),
    };

    let ipc_request = ActlogRequest::ActivityLog {
        agent_id,
        page: Some(page),
        page_size: Some(page_size),
    };

    let response = crate::router::handle_request(ipc_request, backend, config).await;

    match response_to_http(response) {
        Ok(data) => (StatusCode::OK, data),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new(e).into_value(),
        ),
    }
}

// ============================================================================
// Axum handler wrappers (thin — delegate to inner functions)
// ============================================================================

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) =
        health_inner(state.backend.as_ref(), &state.config.service.socket_path).await;
    (status, Json(body))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn activity_log_handler(
    State(state): State<Arc<HttpState>>,
    Path(agent_id): Path<String>,
    Query(query): Query<ActivityLogQuery>,
) -> impl IntoResponse {
    let (status, body) =
        activity_log_inner(state.backend.as_ref(), &state.config, agent_id, query).await;
    (status, Json(body))
}

// ============================================================================
// Helpers
// ============================================================================

/// Convert an IPC `ActlogResponse` into an HTTP body value, or an error string.
pub fn response_to_http(response: ActlogResponse) -> std::result::Result<serde_json::Value, String> {
    if response.is_ok() {
        Ok(response.data.unwrap_or(serde_json::json!({})))
    } else {
        Err(response.error.unwrap_or_else(|| "unknown error".to_string()))
    }
}

// ============================================================================
// Unit Tests — call inner functions directly
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use actlog_core::ElasticsearchClient;

    const TEST_CONFIG: &str = r#"
        [service]
        socket_path = "/tmp/actlog-http-test.sock"

        [search]
        url = "http://127.0.0.1:9"
        timeout_seconds = 2
    "#;

    /// Client aimed at a port nothing listens on
    fn unreachable_state() -> (ElasticsearchClient, ActlogConfig) {
        let config = ActlogConfig::from_toml_str(TEST_CONFIG).unwrap();
        let client = ElasticsearchClient::new(config.search.clone()).unwrap();
        (client, config)
    }

    #[test]
    fn test_version_inner_pure() {
        let v = version_inner();
        assert!(v["version"].is_string(), "version must be string");
        assert_eq!(v["protocol"], "actlog/1");
    }

    #[test]
    fn test_response_to_http_ok() {
        let resp = ActlogResponse::ok(serde_json::json!({"page": 1, "data": []}));
        let data = response_to_http(resp).unwrap();
        assert_eq!(data["page"], 1);
    }

    #[test]
    fn test_response_to_http_error() {
        let resp = ActlogResponse::err("something went wrong");
        assert_eq!(response_to_http(resp).unwrap_err(), "something went wrong");
    }

    #[test]
    fn test_response_to_http_ok_no_data() {
        let mut resp = ActlogResponse::ok(serde_json::json!({}));
        resp.data = None;
        assert!(response_to_http(resp).unwrap().is_object());
    }

    #[test]
    fn test_response_to_http_error_no_message() {
        let mut resp = ActlogResponse::err("x");
        resp.error = None;
        assert_eq!(response_to_http(resp).unwrap_err(), "unknown error");
    }

    #[test]
    fn test_error_response_value_matches_serialized_shape() {
        let value = ErrorResponse::new("bad input").into_value();
        assert_eq!(value, serde_json::json!({ "error": "bad input", "status": "error" }));
    }

    #[tokio::test]
    async fn test_activity_log_inner_rejects_zero_page() {
        let (client, config) = unreachable_state();
        let query = ActivityLogQuery {
            page: Some(0),
            page_size: None,
        };

        let (status, body) = activity_log_inner(&client, &config, "A1".to_string(), query).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert!(body["error"].as_str().unwrap().contains("page"));
    }

    #[tokio::test]
    async fn test_activity_log_inner_rejects_oversized_page() {
        let (client, config) = unreachable_state();
        let query = ActivityLogQuery {
            page: None,
            page_size: Some(101),
        };

        let (status, _body) = activity_log_inner(&client, &config, "A1".to_string(), query).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_activity_log_inner_rejects_blank_agent() {
        let (client, config) = unreachable_state();
        let (status, _body) =
            activity_log_inner(&client, &config, "  ".to_string(), ActivityLogQuery::default())
                .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_activity_log_inner_unreachable_cluster_is_500() {
        let (client, config) = unreachable_state();
        let (status, body) =
            activity_log_inner(&client, &config, "A1".to_string(), ActivityLogQuery::default())
                .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_health_inner_unreachable_cluster_is_503() {
        let (client, _config) = unreachable_state();
        let (status, body) = health_inner(&client, "/tmp/actlog.sock").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "unhealthy");
    }
}

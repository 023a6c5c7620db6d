use crate::subsystems::activity_log::{self, ActivityLogIndices};
use actlog_core::ipc::{ActlogRequest, ActlogResponse};
use actlog_core::search::SearchBackend;
use actlog_core::ActlogConfig;

pub async fn handle_request(
    request: ActlogRequest,
    backend: &dyn SearchBackend,
    config: &ActlogConfig,
) -> ActlogResponse {
    match request {
        ActlogRequest::Ping => ActlogResponse::pong(),
        ActlogRequest::Health => match backend.info().await {
            Ok(info) => ActlogResponse::ok(serde_json::json!({
                "backend": backend.name(),
                "cluster_name": info.cluster_name,
                "cluster_version": info.version,
                "status": "healthy"
            })),
            Err(e) => ActlogResponse::err(format!("Search cluster health check failed: {}", e)),
        },
        ActlogRequest::ActivityLog {
            agent_id,
            page,
            page_size,
        } => match handle_activity_log_request(&agent_id, page, page_size, backend, config).await {
            Ok(data) => ActlogResponse::ok(data),
            Err(e) => ActlogResponse::err(e.to_string()),
        },
    }
}

/// Handle ActivityLog request: resolve paging, fetch, serialize the page
async fn handle_activity_log_request(
    agent_id: &str,
    page: Option<u32>,
    page_size: Option<u32>,
    backend: &dyn SearchBackend,
    config: &ActlogConfig,
) -> anyhow::Result<serde_json::Value> {
    if agent_id.trim().is_empty() {
        return Err(anyhow::anyhow!("agent_id is required"));
    }

    let (page, page_size) = activity_log::resolve_paging(page, page_size).map_err(anyhow::Error::msg)?;
    let indices = ActivityLogIndices::from(&config.search);

    let result =
        activity_log::fetch_activity_log(backend, &indices, agent_id, page, page_size).await?;
    Ok(serde_json::to_value(result)?)
}

//! Activity log subsystem — merged action/response feed for one agent
//!
//! This subsystem implements `ActlogRequest::ActivityLog`:
//! - Pages through the actions index (half the page budget, newest first)
//! - Pulls every response correlated with the returned action ids
//! - Interleaves both into one list ordered by `@timestamp`, newest first
//!
//! Paging only applies to actions. Responses are fetched unpaged and capped at
//! `MAX_RESPONSES`, so a very chatty agent can lose responses past the cap.

use actlog_core::config::SearchConfig;
use actlog_core::models::{ActivityLogEntry, ActivityLogPage};
use actlog_core::search::{SearchBackend, SearchError, SearchHit, SearchRequest, SearchResponse};
use serde_json::json;
use thiserror::Error;

/// Upper bound on responses pulled for one page of actions.
const MAX_RESPONSES: u64 = 1000;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

const ENDPOINT_INPUT_TYPE: &str = "endpoint";
const INPUT_ACTION_TYPE: &str = "INPUT_ACTION";

#[derive(Error, Debug)]
pub enum ActivityLogError {
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("Error fetching actions log for agent_id {agent_id}")]
    ActionsFetch { agent_id: String },
}

/// Names of the two collections the log is stitched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityLogIndices {
    pub actions: String,
    pub results: String,
}

impl From<&SearchConfig> for ActivityLogIndices {
    fn from(config: &SearchConfig) -> Self {
        Self {
            actions: config.actions_index.clone(),
            results: config.results_index.clone(),
        }
    }
}

/// Offset and size for the actions query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub from: u64,
    pub size: u64,
}

impl PageWindow {
    /// `size` is half the page budget. Pages past the first start at
    /// `page * size - size + 1`, which is one past a contiguous offset; clients
    /// depend on this exact sequence.
    pub fn new(page: u32, page_size: u32) -> Self {
        let size = u64::from(page_size / 2);
        let page = u64::from(page);
        let from = if page <= 1 { 0 } else { page * size - size + 1 };
        Self { from, size }
    }
}

/// Apply defaults and bounds to caller-supplied paging parameters.
pub fn resolve_paging(page: Option<u32>, page_size: Option<u32>) -> Result<(u32, u32), String> {
    let page = page.unwrap_or(DEFAULT_PAGE);
    let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);

    if page < 1 {
        return Err(format!("page must be at least 1, got {}", page));
    }
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(format!(
            "page_size must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, page_size
        ));
    }

    Ok((page, page_size))
}

/// Fetch one page of the activity log for `agent_id`.
///
/// # Returns
/// * `Ok(ActivityLogPage)` - `page`/`page_size` echo the inputs; `data` may hold
///   fewer or more than `page_size` entries
/// * `Err(ActivityLogError::Search)` - either query failed in transport
/// * `Err(ActivityLogError::ActionsFetch)` - actions query answered with a
///   status other than 200 (including a tolerated 404)
pub async fn fetch_activity_log(
    backend: &dyn SearchBackend,
    indices: &ActivityLogIndices,
    agent_id: &str,
    page: u32,
    page_size: u32,
) -> Result<ActivityLogPage, ActivityLogError> {
    let window = PageWindow::new(page, page_size);
    let data = get_activity_log(backend, indices, agent_id, window).await?;

    Ok(ActivityLogPage {
        page,
        page_size,
        data,
    })
}

async fn get_activity_log(
    backend: &dyn SearchBackend,
    indices: &ActivityLogIndices,
    agent_id: &str,
    window: PageWindow,
) -> Result<Vec<ActivityLogEntry>, ActivityLogError> {
    let (actions, responses) = match run_queries(backend, indices, agent_id, window).await {
        Ok(results) => results,
        Err(e) => {
            tracing::error!(agent_id = %agent_id, backend = backend.name(), error = %e, "Activity log search failed");
            return Err(e.into());
        }
    };

    if actions.status_code != 200 {
        tracing::error!(
            agent_id = %agent_id,
            status = actions.status_code,
            "Error fetching actions log for agent_id {}",
            agent_id
        );
        return Err(ActivityLogError::ActionsFetch {
            agent_id: agent_id.to_string(),
        });
    }

    Ok(merge_entries(responses.hits, actions.hits))
}

/// Actions first, then the responses keyed on the action ids it returned.
async fn run_queries(
    backend: &dyn SearchBackend,
    indices: &ActivityLogIndices,
    agent_id: &str,
    window: PageWindow,
) -> Result<(SearchResponse, SearchResponse), SearchError> {
    let actions = backend
        .search(actions_query(&indices.actions, agent_id, window))
        .await?;

    let action_ids = collect_action_ids(&actions.hits);

    let responses = backend
        .search(responses_query(&indices.results, agent_id, &action_ids))
        .await?;

    tracing::debug!(
        agent_id = %agent_id,
        actions = actions.hits.len(),
        responses = responses.hits.len(),
        "Fetched activity log sources"
    );

    Ok((actions, responses))
}

pub fn actions_query(index: &str, agent_id: &str, window: PageWindow) -> SearchRequest {
    SearchRequest::new(
        index,
        json!({
            "bool": {
                "filter": [
                    { "term": { "agents": agent_id } },
                    { "term": { "input_type": ENDPOINT_INPUT_TYPE } },
                    { "term": { "type": INPUT_ACTION_TYPE } }
                ]
            }
        }),
    )
    .offset(window.from)
    .limit(window.size)
    .sort(json!([{ "@timestamp": { "order": "desc" } }]))
}

pub fn responses_query(index: &str, agent_id: &str, action_ids: &[String]) -> SearchRequest {
    SearchRequest::new(
        index,
        json!({
            "bool": {
                "filter": [
                    { "term": { "agent_id": agent_id } },
                    { "terms": { "action_id": action_ids } }
                ]
            }
        }),
    )
    .limit(MAX_RESPONSES)
}

/// `action_id` of every action hit that carries one as a string.
pub fn collect_action_ids(hits: &[SearchHit]) -> Vec<String> {
    hits.iter()
        .filter_map(|hit| hit.source.get("action_id")?.as_str().map(str::to_string))
        .collect()
}

/// Responses then actions, ordered newest first at millisecond resolution.
/// Equal or missing timestamps keep that order; undated entries go last.
pub fn merge_entries(responses: Vec<SearchHit>, actions: Vec<SearchHit>) -> Vec<ActivityLogEntry> {
    let entries = responses
        .into_iter()
        .map(|hit| ActivityLogEntry::response(hit.id, hit.source))
        .chain(
            actions
                .into_iter()
                .map(|hit| ActivityLogEntry::action(hit.id, hit.source)),
        );

    let mut keyed: Vec<_> = entries
        .map(|entry| (entry.timestamp().map(|t| t.timestamp_millis()), entry))
        .collect();
    keyed.sort_by(|a, b| b.0.cmp(&a.0));
    keyed.into_iter().map(|(_, entry)| entry).collect()
}

//! Search backend for the fleet action indices
//!
//! Provides a `SearchBackend` trait and an `ElasticsearchClient` that talks to
//! the cluster's REST API over `reqwest`:
//! - `_search` requests against a named index, with a JSON query body
//! - a 404 from the cluster comes back as an empty hit list, never an error
//! - every request carries the `X-elastic-product-origin` header

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SearchConfig;

/// Header identifying the product issuing queries against system indices.
pub const PRODUCT_ORIGIN_HEADER: &str = "X-elastic-product-origin";

// ============================================================================
// SearchBackend trait
// ============================================================================

/// Read-only access to a document search cluster.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run a single search. A missing index yields `status_code == 404` with
    /// no hits rather than an error.
    async fn search(&self, request: SearchRequest) -> Result<SearchResponse, SearchError>;

    /// Basic cluster identity, used by health checks.
    async fn info(&self) -> Result<ClusterInfo, SearchError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

// ============================================================================
// Error types
// ============================================================================

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Search API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid search response: {0}")]
    InvalidResponse(String),
}

// ============================================================================
// Request / response types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    #[serde(skip)]
    pub index: String,
    pub from: u64,
    pub size: u64,
    pub query: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<serde_json::Value>,
}

impl SearchRequest {
    pub fn new(index: impl Into<String>, query: serde_json::Value) -> Self {
        Self {
            index: index.into(),
            from: 0,
            size: 10,
            query,
            sort: None,
        }
    }

    pub fn offset(mut self, from: u64) -> Self {
        self.from = from;
        self
    }

    pub fn limit(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn sort(mut self, sort: serde_json::Value) -> Self {
        self.sort = Some(sort);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_source", default)]
    pub source: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResponse {
    pub status_code: u16,
    pub hits: Vec<SearchHit>,
}

impl SearchResponse {
    pub fn not_found() -> Self {
        Self {
            status_code: StatusCode::NOT_FOUND.as_u16(),
            hits: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterInfo {
    pub cluster_name: String,
    pub version: String,
}

// Raw cluster API shapes (private)

#[derive(Debug, Deserialize)]
struct RawSearchResponse {
    hits: Option<RawHits>,
}

#[derive(Debug, Deserialize)]
struct RawHits {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct RawClusterInfo {
    cluster_name: String,
    version: RawVersion,
}

#[derive(Debug, Deserialize)]
struct RawVersion {
    number: String,
}

#[derive(Debug, Deserialize)]
struct RawErrorResponse {
    error: Option<RawErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawErrorDetail {
    Structured { reason: Option<String> },
    Plain(String),
}

// ============================================================================
// ElasticsearchClient
// ============================================================================

#[derive(Debug, Clone)]
pub struct ElasticsearchClient {
    client: Client,
    config: SearchConfig,
}

impl ElasticsearchClient {
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(PRODUCT_ORIGIN_HEADER, &self.config.product_origin);

        match (&self.config.api_key, &self.config.username) {
            (Some(key), _) if !key.is_empty() => {
                builder.header(reqwest::header::AUTHORIZATION, format!("ApiKey {}", key))
            }
            (_, Some(user)) => builder.basic_auth(user, self.config.password.as_ref()),
            _ => builder,
        }
    }

    async fn api_error(response: reqwest::Response) -> SearchError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<RawErrorResponse>(&body)
            .ok()
            .and_then(|e| e.error)
            .and_then(|detail| match detail {
                RawErrorDetail::Structured { reason } => reason,
                RawErrorDetail::Plain(s) => Some(s),
            })
            .unwrap_or(body);

        tracing::error!(status = status, message = %message, "Search API error");

        SearchError::Api { status, message }
    }
}

#[async_trait]
impl SearchBackend for ElasticsearchClient {
    async fn search(&self, request: SearchRequest) -> Result<SearchResponse, SearchError> {
        let url = format!("{}/{}/_search", self.base_url(), request.index);

        tracing::debug!(
            index = %request.index,
            from = request.from,
            size = request.size,
            "Running search"
        );

        let response = self
            .request(reqwest::Method::POST, &url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            tracing::debug!(index = %request.index, "Search returned 404, treating as empty");
            return Ok(SearchResponse::not_found());
        }

        if !status.is_success() {
            return Err(Self::api_error(response).await);
        }

        let body = response.text().await?;
        let raw: RawSearchResponse = serde_json::from_str(&body)
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))?;

        Ok(SearchResponse {
            status_code: status.as_u16(),
            hits: raw.hits.map(|h| h.hits).unwrap_or_default(),
        })
    }

    async fn info(&self) -> Result<ClusterInfo, SearchError> {
        let url = format!("{}/", self.base_url());
        let response = self.request(reqwest::Method::GET, &url).send().await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let raw: RawClusterInfo = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))?;

        Ok(ClusterInfo {
            cluster_name: raw.cluster_name,
            version: raw.version.number,
        })
    }

    fn name(&self) -> &str {
        "elasticsearch"
    }
}

// ============================================================================
// TESTS
// ============================================================================

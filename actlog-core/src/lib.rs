pub mod config;
pub mod error;
pub mod ipc;
pub mod models;
pub mod search;

pub use config::ActlogConfig;
pub use error::ActlogError;
pub use models::{ActivityLogEntry, ActivityLogItem, ActivityLogPage, EntryKind};
pub use search::{
    ClusterInfo, ElasticsearchClient, SearchBackend, SearchError, SearchHit, SearchRequest,
    SearchResponse,
};

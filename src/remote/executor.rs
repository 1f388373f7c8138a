//! The remote query contract the aggregator drives

use crate::paging::QueryVariables;
use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// One fetch cycle's result: field name to records or passthrough metadata.
pub type Page = Map<String, Value>;

/// Why a page could not be fetched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    #[error("server returned status {0}")]
    Status(u16),
    #[error("query failed: {}", .0.join("; "))]
    GraphQl(Vec<String>),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            FetchError::Timeout
        } else if value.is_decode() {
            FetchError::InvalidResponse(value.to_string())
        } else {
            FetchError::Transport(value.to_string())
        }
    }
}

/// Executes a paged query against the remote service.
///
/// Implementations must honour `variables.pagination.page` on every call
/// and must neither reorder nor drop pages.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, query: &str, variables: &QueryVariables) -> Result<Page, FetchError>;
}

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// One result row keyed by column name.
pub type Row = Map<String, Value>;

/// Named string parameters bound to a query's `declare query_parameters`.
pub type QueryParameters = BTreeMap<String, String>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by query executors and token providers.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("missing access token")]
    MissingToken,
    #[error("token command failed: {0}")]
    TokenCommand(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("query endpoint returned non-success status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("invalid value for column '{column}': {value}")]
    InvalidColumnValue { column: String, value: String },
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[async_trait]
/// Authenticated, read-only query execution against the analytical store.
pub trait QueryExecutor: Send + Sync {
    async fn execute(
        &self,
        database: &str,
        query: &str,
        parameters: &QueryParameters,
    ) -> StoreResult<Vec<Row>>;
}

//! Analytical store access for the span status report.
//!
//! Exposes the query-execution and token capabilities the report consumes,
//! a Kusto REST implementation of the former, and an in-memory executor for
//! tests and offline fixtures.

mod auth;
mod executor;
mod kusto;
mod memory;
mod source;

pub use auth::{AzureCliTokenProvider, StaticTokenProvider, TokenProvider};
pub use executor::{QueryExecutor, QueryParameters, Row, StoreError, StoreResult};
pub use kusto::{KustoClient, KustoConfig, DEFAULT_KUSTO_TOKEN_SCOPE};
pub use memory::{ExecutedQuery, InMemoryQueryExecutor};
pub use source::{
    SourceRelations, SpanSource, FACILITY_PARAMETER, LINK_SOURCE_QUERY, LINK_TABLE,
    SPAN_SOURCE_QUERY, SPAN_TABLE,
};

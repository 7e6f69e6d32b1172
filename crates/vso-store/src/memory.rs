use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Deserialize;

use crate::source::{LINK_SOURCE_QUERY, SPAN_SOURCE_QUERY};
use crate::{QueryExecutor, QueryParameters, Row, StoreError, StoreResult};

/// A query observed by [`InMemoryQueryExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedQuery {
    pub database: String,
    pub query: String,
    pub parameters: QueryParameters,
}

#[derive(Debug, Deserialize)]
struct RelationFixture {
    #[serde(rename = "DarkFiberTracker", default)]
    spans: Vec<Row>,
    #[serde(rename = "LinkMetadata", default)]
    links: Vec<Row>,
}

/// Executor answering registered query texts from memory.
///
/// Unregistered queries return no rows. Used by tests and by offline
/// fixture mode.
#[derive(Debug, Default)]
pub struct InMemoryQueryExecutor {
    results: HashMap<String, Vec<Row>>,
    failure: Option<String>,
    executed: Mutex<Vec<ExecutedQuery>>,
}

impl InMemoryQueryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, query: impl Into<String>, rows: Vec<Row>) -> Self {
        self.results.insert(query.into(), rows);
        self
    }

    /// Makes every call fail with [`StoreError::Unavailable`].
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Loads a `{"DarkFiberTracker": [...], "LinkMetadata": [...]}` snapshot.
    pub fn from_fixture_json(raw: &str) -> StoreResult<Self> {
        let fixture: RelationFixture = serde_json::from_str(raw)?;
        Ok(Self::new()
            .with_rows(SPAN_SOURCE_QUERY, fixture.spans)
            .with_rows(LINK_SOURCE_QUERY, fixture.links))
    }

    pub fn from_fixture_file(path: &Path) -> StoreResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_fixture_json(&raw)
    }

    /// Queries executed so far, in call order.
    pub fn executed(&self) -> Vec<ExecutedQuery> {
        self.executed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl QueryExecutor for InMemoryQueryExecutor {
    async fn execute(
        &self,
        database: &str,
        query: &str,
        parameters: &QueryParameters,
    ) -> StoreResult<Vec<Row>> {
        self.executed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(ExecutedQuery {
                database: database.to_string(),
                query: query.to_string(),
                parameters: parameters.clone(),
            });
        if let Some(message) = &self.failure {
            return Err(StoreError::Unavailable(message.clone()));
        }
        Ok(self.results.get(query).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unit_fixture_json_registers_both_relations() {
        let executor = InMemoryQueryExecutor::from_fixture_json(
            r#"{
                "DarkFiberTracker": [{"SpanID": "span-1"}, {"SpanID": "span-2"}],
                "LinkMetadata": [{"SolutionId": "span-1"}]
            }"#,
        )
        .expect("parse fixture");

        let params = QueryParameters::new();
        let spans = executor
            .execute("db", SPAN_SOURCE_QUERY, &params)
            .await
            .expect("spans");
        let links = executor
            .execute("db", LINK_SOURCE_QUERY, &params)
            .await
            .expect("links");
        let other = executor
            .execute("db", "print 1", &params)
            .await
            .expect("unregistered");
        assert_eq!(spans.len(), 2);
        assert_eq!(links.len(), 1);
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn unit_failing_executor_records_call_and_errors() {
        let executor = InMemoryQueryExecutor::failing("cluster unreachable");
        let error = executor
            .execute("db", SPAN_SOURCE_QUERY, &QueryParameters::new())
            .await
            .expect_err("failure");
        assert_eq!(error.to_string(), "store unavailable: cluster unreachable");
        assert_eq!(executor.executed().len(), 1);
    }

    #[test]
    fn unit_fixture_file_loads_from_disk() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("fixture.json");
        std::fs::write(&path, r#"{"DarkFiberTracker": []}"#).expect("write fixture");
        InMemoryQueryExecutor::from_fixture_file(&path).expect("load fixture");
    }

    #[test]
    fn regression_fixture_rejects_malformed_json() {
        assert!(InMemoryQueryExecutor::from_fixture_json("{not json").is_err());
    }
}

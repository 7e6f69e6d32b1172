use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{QueryExecutor, QueryParameters, Row, StoreError, StoreResult, TokenProvider};

/// Token scope for Azure Data Explorer.
pub const DEFAULT_KUSTO_TOKEN_SCOPE: &str = "https://kusto.kusto.windows.net/.default";

#[derive(Debug, Clone)]
/// Connection settings for a Kusto cluster.
pub struct KustoConfig {
    pub cluster_url: String,
    pub token_scope: String,
    pub request_timeout_ms: u64,
}

impl Default for KustoConfig {
    fn default() -> Self {
        Self {
            cluster_url: String::new(),
            token_scope: DEFAULT_KUSTO_TOKEN_SCOPE.to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(rename = "Tables", default)]
    tables: Vec<ResultTable>,
}

#[derive(Debug, Deserialize)]
struct ResultTable {
    #[serde(rename = "Columns", default)]
    columns: Vec<ResultColumn>,
    #[serde(rename = "Rows", default)]
    rows: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ResultColumn {
    #[serde(rename = "ColumnName")]
    column_name: String,
}

/// Kusto v1 REST query client.
#[derive(Clone)]
pub struct KustoClient {
    client: reqwest::Client,
    config: KustoConfig,
    tokens: Arc<dyn TokenProvider>,
}

impl KustoClient {
    pub fn new(config: KustoConfig, tokens: Arc<dyn TokenProvider>) -> StoreResult<Self> {
        if config.cluster_url.trim().is_empty() {
            return Err(StoreError::InvalidResponse(
                "kusto cluster url must not be empty".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()?;

        Ok(Self {
            client,
            config,
            tokens,
        })
    }

    fn query_url(&self) -> String {
        format!(
            "{}/v1/rest/query",
            self.config.cluster_url.trim().trim_end_matches('/')
        )
    }
}

#[async_trait]
impl QueryExecutor for KustoClient {
    #[tracing::instrument(
        name = "vso_store.kusto.execute",
        skip(self, query, parameters),
        fields(cluster = %self.config.cluster_url)
    )]
    async fn execute(
        &self,
        database: &str,
        query: &str,
        parameters: &QueryParameters,
    ) -> StoreResult<Vec<Row>> {
        let token = self.tokens.fetch_token(&self.config.token_scope).await?;
        let body = json!({
            "db": database,
            "csl": query,
            "properties": {
                "Parameters": parameters,
            },
        });

        let response = self
            .client
            .post(self.query_url())
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(StoreError::HttpStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: QueryResponse = serde_json::from_str(&text)?;
        let rows = primary_rows(parsed)?;
        tracing::debug!(rows = rows.len(), "kusto query completed");
        Ok(rows)
    }
}

fn primary_rows(response: QueryResponse) -> StoreResult<Vec<Row>> {
    let Some(table) = response.tables.into_iter().next() else {
        return Ok(Vec::new());
    };
    let columns: Vec<String> = table
        .columns
        .into_iter()
        .map(|column| column.column_name)
        .collect();

    table
        .rows
        .into_iter()
        .map(|values| {
            if values.len() != columns.len() {
                return Err(StoreError::InvalidResponse(format!(
                    "row has {} values but table declares {} columns",
                    values.len(),
                    columns.len()
                )));
            }
            Ok(columns.iter().cloned().zip(values).collect())
        })
        .collect()
}

//! Source queries for the span and link relations, and row decoding.

use std::sync::Arc;

use serde_json::Value;
use vso_types::{LinkStateRecord, SpanRecord};

use crate::{QueryExecutor, QueryParameters, Row, StoreError, StoreResult};

pub const SPAN_TABLE: &str = "DarkFiberTracker";
pub const LINK_TABLE: &str = "LinkMetadata";
pub const FACILITY_PARAMETER: &str = "FacilityCode";

/// Facility spans with the raw columns the pipeline normalises.
pub const SPAN_SOURCE_QUERY: &str = r#"declare query_parameters(FacilityCode:string);
DarkFiberTracker
| where trim(@"\s", FacilityCodeA) == FacilityCode
| project
    FacilityCodeA,
    SpanID          = tostring(SpanID),
    Diversity,
    IDF_A           = tostring(IDF_A),
    SpliceRackA,
    SpliceRackUnitA = tostring(SpliceRackUnitA),
    WiringScope,
    State
"#;

/// Link rows whose solution identifier names one of the facility's spans.
pub const LINK_SOURCE_QUERY: &str = r#"declare query_parameters(FacilityCode:string);
let FacilitySpans = DarkFiberTracker
    | where trim(@"\s", FacilityCodeA) == FacilityCode
    | project SpanID = tostring(SpanID);
LinkMetadata
| extend SolutionId = tostring(SolutionId)
| where SolutionId in (FacilitySpans)
| project SolutionId, LinkLifecycleState, StartDevice
"#;

/// Raw relations fetched for one facility.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRelations {
    pub spans: Vec<SpanRecord>,
    pub links: Vec<LinkStateRecord>,
}

/// Reads the span and link relations through a [`QueryExecutor`].
#[derive(Clone)]
pub struct SpanSource {
    executor: Arc<dyn QueryExecutor>,
    database: String,
}

impl SpanSource {
    pub fn new(executor: Arc<dyn QueryExecutor>, database: impl Into<String>) -> Self {
        Self {
            executor,
            database: database.into(),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub async fn fetch_spans(&self, facility_code: &str) -> StoreResult<Vec<SpanRecord>> {
        let rows = self
            .executor
            .execute(
                &self.database,
                SPAN_SOURCE_QUERY,
                &facility_parameters(facility_code),
            )
            .await?;
        rows.iter().map(decode_span_row).collect()
    }

    pub async fn fetch_link_states(
        &self,
        facility_code: &str,
    ) -> StoreResult<Vec<LinkStateRecord>> {
        let rows = self
            .executor
            .execute(
                &self.database,
                LINK_SOURCE_QUERY,
                &facility_parameters(facility_code),
            )
            .await?;
        rows.iter().map(decode_link_row).collect()
    }

    /// Fetches both relations for a facility, spans first.
    #[tracing::instrument(name = "vso_store.fetch_relations", skip(self), fields(database = %self.database))]
    pub async fn fetch_relations(&self, facility_code: &str) -> StoreResult<SourceRelations> {
        let spans = self.fetch_spans(facility_code).await?;
        let links = self.fetch_link_states(facility_code).await?;
        tracing::debug!(
            spans = spans.len(),
            links = links.len(),
            "fetched source relations"
        );
        Ok(SourceRelations { spans, links })
    }
}

fn facility_parameters(facility_code: &str) -> QueryParameters {
    let mut parameters = QueryParameters::new();
    parameters.insert(FACILITY_PARAMETER.to_string(), facility_code.to_string());
    parameters
}

fn decode_span_row(row: &Row) -> StoreResult<SpanRecord> {
    Ok(SpanRecord {
        facility_code: text_column(row, "FacilityCodeA")?,
        span_id: text_column(row, "SpanID")?,
        diversity: text_column(row, "Diversity")?,
        idf: text_column(row, "IDF_A")?,
        splice_rack: text_column(row, "SpliceRackA")?,
        rack_unit: text_column(row, "SpliceRackUnitA")?,
        wiring_scope: text_column(row, "WiringScope")?,
        state: text_column(row, "State")?,
    })
}

fn decode_link_row(row: &Row) -> StoreResult<LinkStateRecord> {
    Ok(LinkStateRecord {
        solution_id: text_column(row, "SolutionId")?,
        lifecycle_state: text_column(row, "LinkLifecycleState")?,
        start_device: text_column(row, "StartDevice")?,
    })
}

/// Reads a column as text; missing and null columns read as empty.
fn text_column(row: &Row, column: &str) -> StoreResult<String> {
    match row.get(column) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(value)) => Ok(value.clone()),
        Some(Value::Number(value)) => Ok(value.to_string()),
        Some(Value::Bool(value)) => Ok(value.to_string()),
        Some(other) => Err(StoreError::InvalidColumnValue {
            column: column.to_string(),
            value: other.to_string(),
        }),
    }
}

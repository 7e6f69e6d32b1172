//! Request parsing and response envelopes for the report endpoint.

use serde::Serialize;
use serde_json::{json, Map, Value};
use vso_pipeline::{SpanQuery, NO_FILTER_SENTINEL};
use vso_types::{AggregateHealth, SpanReport, SpanSummary};

use crate::errors::VsoApiError;

pub const STAGE_VSO_DETAILS: &str = "VSO_Details";
pub const STAGE_EMAIL_TEMPLATE: &str = "Email_Template";

const FIELD_STAGE: &str = "Stage";
const FIELD_FACILITY: &str = "FacilityCodeA";
const FIELD_DIVERSITY: &str = "Diversity";
const FIELD_SPLICE_RACK: &str = "SpliceRackA";
const FIELD_INCLUDE_HEALTH: &str = "IncludeHealth";

/// A parsed report request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VsoRequest {
    Details(DetailsRequest),
    EmailTemplate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailsRequest {
    pub query: SpanQuery,
    pub include_health: bool,
}

/// One span row, optionally carrying the result-set health counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailsRow {
    #[serde(flatten)]
    pub summary: SpanSummary,
    #[serde(flatten)]
    pub health: Option<AggregateHealth>,
}

/// Envelope for a successful `VSO_Details` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailsResponse {
    #[serde(rename = "Spans")]
    pub spans: Vec<DetailsRow>,
    #[serde(rename = "DataCenter")]
    pub data_center: String,
}

impl DetailsResponse {
    /// Shapes a report; with `include_health` every row repeats
    /// `prodSpans`, `maintSpans` and `prodPct`.
    pub fn from_report(report: SpanReport, data_center: String, include_health: bool) -> Self {
        let health = include_health.then_some(report.health);
        Self {
            spans: report
                .spans
                .into_iter()
                .map(|summary| DetailsRow {
                    summary,
                    health,
                })
                .collect(),
            data_center,
        }
    }
}

/// Parses a raw request body.
pub fn parse_vso_request(body: &[u8]) -> Result<VsoRequest, VsoApiError> {
    let parsed: Value = serde_json::from_slice(body).map_err(|error| {
        VsoApiError::invalid_input("Invalid JSON").with_details(error.to_string())
    })?;
    let empty = Map::new();
    let fields = match &parsed {
        Value::Object(fields) => fields,
        Value::Null => &empty,
        _ => return Err(VsoApiError::invalid_input("request body must be a JSON object")),
    };

    let stage = optional_string(fields, FIELD_STAGE)?
        .filter(|stage| !stage.is_empty())
        .ok_or_else(|| VsoApiError::missing_field(FIELD_STAGE))?;
    match stage {
        STAGE_VSO_DETAILS => parse_details(fields).map(VsoRequest::Details),
        STAGE_EMAIL_TEMPLATE => Ok(VsoRequest::EmailTemplate),
        other => Err(VsoApiError::unknown_stage(other)),
    }
}

fn parse_details(fields: &Map<String, Value>) -> Result<DetailsRequest, VsoApiError> {
    let facility_code = optional_string(fields, FIELD_FACILITY)?
        .map(str::trim)
        .filter(|facility| !facility.is_empty())
        .ok_or_else(|| VsoApiError::missing_field(FIELD_FACILITY))?;
    let include_health = match fields.get(FIELD_INCLUDE_HEALTH) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(value)) => *value,
        Some(_) => {
            return Err(VsoApiError::invalid_input(format!(
                "field '{FIELD_INCLUDE_HEALTH}' must be a boolean"
            )))
        }
    };

    Ok(DetailsRequest {
        query: SpanQuery::new(
            facility_code,
            optional_filter(fields, FIELD_DIVERSITY)?,
            optional_filter(fields, FIELD_SPLICE_RACK)?,
        ),
        include_health,
    })
}

fn optional_string<'a>(
    fields: &'a Map<String, Value>,
    name: &str,
) -> Result<Option<&'a str>, VsoApiError> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.as_str())),
        Some(_) => Err(VsoApiError::invalid_input(format!(
            "field '{name}' must be a string"
        ))),
    }
}

/// Missing and null filters are absent. Empty strings and the `N` sentinel
/// are passed through to the selector.
fn optional_filter(fields: &Map<String, Value>, name: &str) -> Result<Option<String>, VsoApiError> {
    Ok(optional_string(fields, name)?.map(str::to_string))
}

/// Usage description served on `GET`.
pub fn usage_payload() -> Value {
    json!({
        "message": "VSO2 API is running.",
        "usage": {
            "POST /api/vso2": {
                "required": [FIELD_STAGE],
                "optional": [FIELD_FACILITY, FIELD_DIVERSITY, FIELD_SPLICE_RACK, FIELD_INCLUDE_HEALTH],
                "stages": [STAGE_VSO_DETAILS, STAGE_EMAIL_TEMPLATE],
                "notes": format!(
                    "Use Stage='{STAGE_VSO_DETAILS}' and provide {FIELD_FACILITY}. Use '{NO_FILTER_SENTINEL}' for {FIELD_DIVERSITY}/{FIELD_SPLICE_RACK} to mean no filter."
                ),
            }
        }
    })
}

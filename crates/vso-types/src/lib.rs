//! Shared data types for the optical span status report.

use serde::{Deserialize, Serialize};

/// Lifecycle label for spans that are provisioned but not yet linked.
pub const STATUS_NEW: &str = "New";
/// Lifecycle label for links carrying production traffic.
pub const STATUS_IN_PRODUCTION: &str = "InProduction";
/// Lifecycle label for links under maintenance.
pub const STATUS_IN_MAINTENANCE: &str = "InMaintenance";
/// Lifecycle label for decommissioned links.
pub const STATUS_FINAL: &str = "Final";

/// One row of the primary span relation (`DarkFiberTracker`).
///
/// Every text field is kept raw; empty strings stand in for missing values.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpanRecord {
    pub facility_code: String,
    pub span_id: String,
    pub diversity: String,
    pub idf: String,
    pub splice_rack: String,
    pub rack_unit: String,
    pub wiring_scope: String,
    pub state: String,
}

/// One row of the secondary link relation (`LinkMetadata`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinkStateRecord {
    /// Solution identifier; joins to [`SpanRecord::span_id`].
    pub solution_id: String,
    pub lifecycle_state: String,
    /// Originating device label, used to exclude OMT devices.
    pub start_device: String,
}

/// Display colour derived from a span status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpanColor {
    Good,
    Warning,
    Attention,
    Accent,
}

impl SpanColor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Warning => "Warning",
            Self::Attention => "Attention",
            Self::Accent => "Accent",
        }
    }
}

/// UI-ready summary of a single span, one per output row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanSummary {
    #[serde(rename = "SpanID")]
    pub span_id: String,
    #[serde(rename = "Diversity")]
    pub diversity: String,
    #[serde(rename = "IDF_A")]
    pub idf: String,
    #[serde(rename = "SpliceRackA")]
    pub splice_rack: String,
    #[serde(rename = "WiringScope")]
    pub wiring_scope: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Color")]
    pub color: SpanColor,
    #[serde(rename = "OpticalLink")]
    pub optical_link: String,
    #[serde(rename = "FormattedSpans")]
    pub formatted_spans: String,
}

/// Production/maintenance split across a full result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AggregateHealth {
    #[serde(rename = "prodSpans")]
    pub prod_spans: u64,
    #[serde(rename = "maintSpans")]
    pub maint_spans: u64,
    /// Always within `0..=100`.
    #[serde(rename = "prodPct")]
    pub prod_pct: u8,
}

impl AggregateHealth {
    /// Builds the aggregate from raw counts, flooring the percentage.
    pub fn from_counts(prod_spans: u64, maint_spans: u64) -> Self {
        let total = prod_spans.saturating_add(maint_spans);
        let prod_pct = if total == 0 {
            0
        } else {
            u8::try_from(prod_spans.saturating_mul(100) / total).unwrap_or(100)
        };
        Self {
            prod_spans,
            maint_spans,
            prod_pct,
        }
    }
}

/// Shaped output of one report run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpanReport {
    pub spans: Vec<SpanSummary>,
    pub health: AggregateHealth,
}

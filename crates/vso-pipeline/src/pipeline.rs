//! Span derivation pipeline shared by all query variants.

use std::collections::{BTreeSet, HashMap, HashSet};

use vso_types::{
    AggregateHealth, LinkStateRecord, SpanRecord, SpanReport, SpanSummary, STATUS_IN_MAINTENANCE,
    STATUS_IN_PRODUCTION, STATUS_NEW,
};

use crate::normalize::{contains_ignore_case, normalize_idf, normalize_splice_rack};
use crate::variant::{select_variant, QueryVariant, StatusMatch, VariantDescriptor};

const OMT_DEVICE_MARKER: &str = "omt";

/// Inbound report parameters: a facility plus the two optional filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanQuery {
    pub facility_code: String,
    pub diversity: Option<String>,
    pub splice_rack: Option<String>,
}

impl SpanQuery {
    pub fn new(
        facility_code: impl Into<String>,
        diversity: Option<String>,
        splice_rack: Option<String>,
    ) -> Self {
        Self {
            facility_code: facility_code.into(),
            diversity,
            splice_rack,
        }
    }

    pub fn variant(&self) -> QueryVariant {
        select_variant(self.diversity.as_deref(), self.splice_rack.as_deref())
    }
}

/// Link lifecycle state collapsed to one value per span identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkStateIndex {
    states: HashMap<String, String>,
    conflicts: BTreeSet<String>,
}

impl LinkStateIndex {
    /// Collapses link rows by solution identifier.
    ///
    /// The representative is the first non-empty lifecycle state in relation
    /// order. Keys whose non-empty states disagree are recorded in
    /// [`LinkStateIndex::conflicts`]; which of them is intended is unresolved.
    pub fn collapse(links: &[LinkStateRecord], exclude_omt_devices: bool) -> Self {
        let mut index = Self::default();
        for link in links {
            if exclude_omt_devices && contains_ignore_case(&link.start_device, OMT_DEVICE_MARKER) {
                continue;
            }
            let entry = index.states.entry(link.solution_id.clone()).or_default();
            if entry.is_empty() {
                *entry = link.lifecycle_state.clone();
            } else if !link.lifecycle_state.is_empty() && *entry != link.lifecycle_state {
                index.conflicts.insert(link.solution_id.clone());
            }
        }
        index
    }

    /// Joined lifecycle state, empty when the span has no link row.
    pub fn state(&self, span_id: &str) -> &str {
        self.states.get(span_id).map(String::as_str).unwrap_or("")
    }

    /// Span identifiers whose duplicate link rows disagree.
    pub fn conflicts(&self) -> &BTreeSet<String> {
        &self.conflicts
    }
}

struct LiveSpan<'a> {
    record: &'a SpanRecord,
    status: String,
    splice_rack: String,
}

/// Runs the selected variant over the raw relations and shapes the result.
#[tracing::instrument(
    name = "vso_pipeline.build_span_report",
    level = "debug",
    skip(query, spans, links),
    fields(facility = %query.facility_code, variant = query.variant().as_str())
)]
pub fn build_span_report(
    query: &SpanQuery,
    spans: &[SpanRecord],
    links: &[LinkStateRecord],
) -> SpanReport {
    let descriptor = query.variant().descriptor();
    let index = LinkStateIndex::collapse(links, descriptor.exclude_omt_devices);
    if !index.conflicts().is_empty() {
        tracing::warn!(
            conflicting_spans = index.conflicts().len(),
            span_ids = ?index.conflicts(),
            "duplicate link rows disagree on lifecycle state; first non-empty value kept"
        );
    }

    let live = select_live_spans(query, &descriptor, spans, &index);
    // Every row shares the request's filter scope, so one peer list serves all rows.
    let formatted_spans = format_peer_spans(&descriptor, &live);

    let mut summaries: Vec<SpanSummary> = live
        .into_iter()
        .map(|span| SpanSummary {
            span_id: span.record.span_id.clone(),
            diversity: span.record.diversity.clone(),
            idf: normalize_idf(&span.record.idf, &span.record.wiring_scope),
            splice_rack: span.splice_rack,
            wiring_scope: span.record.wiring_scope.to_uppercase(),
            color: descriptor.color_rule.classify(&span.status),
            optical_link: descriptor.optical_link(&span.record.span_id),
            formatted_spans: formatted_spans.clone(),
            status: span.status,
        })
        .collect();
    summaries.sort_by(|left, right| left.diversity.cmp(&right.diversity));

    let health = aggregate_health(&summaries, descriptor.health_match);
    tracing::debug!(
        source_spans = spans.len(),
        source_links = links.len(),
        shaped_spans = summaries.len(),
        prod_spans = health.prod_spans,
        maint_spans = health.maint_spans,
        prod_pct = health.prod_pct,
        "shaped span report"
    );
    SpanReport {
        spans: summaries,
        health,
    }
}

/// Counts production and maintenance rows and derives the production share.
pub fn aggregate_health(spans: &[SpanSummary], status_match: StatusMatch) -> AggregateHealth {
    let count = |label: &str| {
        spans
            .iter()
            .filter(|span| status_match.matches(&span.status, label))
            .count() as u64
    };
    AggregateHealth::from_counts(count(STATUS_IN_PRODUCTION), count(STATUS_IN_MAINTENANCE))
}

fn select_live_spans<'a>(
    query: &SpanQuery,
    descriptor: &VariantDescriptor,
    spans: &'a [SpanRecord],
    index: &LinkStateIndex,
) -> Vec<LiveSpan<'a>> {
    let diversity_filter = query.diversity.as_deref().unwrap_or("");
    let splice_filter = query.splice_rack.as_deref().unwrap_or("");

    spans
        .iter()
        .filter(|record| record.facility_code.trim() == query.facility_code)
        .filter_map(|record| {
            let joined = index.state(&record.span_id);
            let is_new = descriptor.new_state_bypass && record.state == STATUS_NEW;
            if joined.is_empty() && !is_new {
                return None;
            }
            let status = if is_new { STATUS_NEW } else { joined };
            Some(LiveSpan {
                record,
                status: status.to_string(),
                splice_rack: normalize_splice_rack(&record.splice_rack, &record.rack_unit),
            })
        })
        .filter(|span| {
            !descriptor.filter_diversity
                || contains_ignore_case(&span.record.diversity, diversity_filter)
        })
        .filter(|span| {
            !descriptor.filter_splice_rack || contains_ignore_case(&span.splice_rack, splice_filter)
        })
        .collect()
}

fn format_peer_spans(descriptor: &VariantDescriptor, live: &[LiveSpan<'_>]) -> String {
    let mut seen = HashSet::new();
    let distinct = live
        .iter()
        .map(|span| span.record.span_id.as_str())
        .filter(|span_id| seen.insert(*span_id));
    descriptor.peer_format.join(distinct)
}

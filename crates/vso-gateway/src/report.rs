use vso_pipeline::{build_span_report, SpanQuery};
use vso_store::{SpanSource, StoreResult};
use vso_types::SpanReport;

/// Fetches the facility's relations and runs the selected variant over them.
#[tracing::instrument(
    name = "vso_gateway.run_span_report",
    skip(source, query),
    fields(
        facility = %query.facility_code,
        variant = query.variant().as_str(),
        database = source.database()
    )
)]
pub async fn run_span_report(source: &SpanSource, query: &SpanQuery) -> StoreResult<SpanReport> {
    let relations = source.fetch_relations(&query.facility_code).await?;
    Ok(build_span_report(query, &relations.spans, &relations.links))
}

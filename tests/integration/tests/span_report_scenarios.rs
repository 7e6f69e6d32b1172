use std::path::Path;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use vso_gateway::{build_vso_router, VSO_ENDPOINT};
use vso_pipeline::QueryVariant;
use vso_store::InMemoryQueryExecutor;

const FIXTURE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/fixtures/relations.sample.json"
);

fn fixture_executor() -> Arc<InMemoryQueryExecutor> {
    Arc::new(
        InMemoryQueryExecutor::from_fixture_file(Path::new(FIXTURE))
            .expect("load relation fixture"),
    )
}

fn fixture_router() -> Router {
    build_vso_router(fixture_executor(), "waneng")
}

async fn post_raw(app: Router, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(VSO_ENDPOINT)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request");
    let response = app.oneshot(request).await.expect("router response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    let parsed = serde_json::from_slice(&bytes).expect("response body is json");
    (status, parsed)
}

async fn post_details(app: Router, facility: &str, diversity: &str, splice: &str) -> Value {
    let body = json!({
        "Stage": "VSO_Details",
        "FacilityCodeA": facility,
        "Diversity": diversity,
        "SpliceRackA": splice,
    });
    let (status, parsed) = post_raw(app, &body.to_string()).await;
    assert_eq!(status, StatusCode::OK, "unexpected body: {parsed}");
    parsed
}

fn span_ids(body: &Value) -> Vec<String> {
    body["Spans"]
        .as_array()
        .expect("spans array")
        .iter()
        .map(|span| span["SpanID"].as_str().expect("span id").to_string())
        .collect()
}

#[tokio::test]
async fn facility_only_returns_every_linked_span_for_the_facility() {
    assert_eq!(
        vso_pipeline::select_variant(Some("N"), Some("N")),
        QueryVariant::FacilityOnly
    );
    let body = post_details(fixture_router(), "ABC", "N", "N").await;

    assert_eq!(body["DataCenter"], "ABC");
    assert_eq!(span_ids(&body), vec!["abc-100", "abc-103", "abc-102"]);

    let spans = body["Spans"].as_array().expect("spans array");
    assert_eq!(
        spans[0],
        json!({
            "SpanID": "abc-100",
            "Diversity": "East",
            "IDF_A": "IDF1",
            "SpliceRackA": "AM111 U4",
            "WiringScope": "RNG-RNG",
            "Status": "InProduction",
            "Color": "Good",
            "OpticalLink": "https://phynet.trafficmanager.net/Optical/OpticalLinkMonitor?spanId=abc-100&timespan=7d&multiSpanMode=false",
            "FormattedSpans": "ABC-100,ABC-102,ABC-103",
        })
    );
    // OMT-originated links are only excluded by the filtered variants.
    assert_eq!(spans[1]["Status"], "Final");
    assert_eq!(spans[1]["Color"], "Attention");
    assert_eq!(spans[2]["IDF_A"], "EDGE");
    assert_eq!(spans[2]["SpliceRackA"], "UNKNOWN");
    assert_eq!(spans[2]["Color"], "Warning");
}

#[tokio::test]
async fn facility_and_diversity_filters_case_insensitively_and_keeps_new_spans() {
    let body = post_details(fixture_router(), "ABC", "east", "N").await;

    assert_eq!(span_ids(&body), vec!["abc-100", "abc-101"]);
    let spans = body["Spans"].as_array().expect("spans array");
    assert_eq!(spans[0]["Status"], "InProduction");
    assert_eq!(spans[1]["Status"], "New");
    assert_eq!(spans[1]["Color"], "Accent");
    assert_eq!(spans[1]["IDF_A"], "IDF3");
    assert_eq!(spans[0]["FormattedSpans"], "\"ABC-100\", \"ABC-101\"");
    assert!(spans[0]["OpticalLink"]
        .as_str()
        .expect("link")
        .contains("/OpticalLinkMonitor/LoadSpanDetails?spanId=abc-100"));
}

#[tokio::test]
async fn facility_and_splice_matches_normalised_rack_labels() {
    let body = post_details(fixture_router(), "ABC", "N", "am111").await;
    assert_eq!(span_ids(&body), vec!["abc-100", "abc-101"]);

    let body = post_details(fixture_router(), "ABC", "N", "unknown").await;
    assert_eq!(span_ids(&body), vec!["abc-102"]);
}

#[tokio::test]
async fn diversity_and_splice_requires_both_filters() {
    let body = post_details(fixture_router(), "ABC", "EAST", "U6").await;
    assert_eq!(span_ids(&body), vec!["abc-101"]);
    assert_eq!(body["Spans"][0]["FormattedSpans"], "\"ABC-101\"");
}

#[tokio::test]
async fn facility_codes_are_trimmed_on_both_sides() {
    let body = post_details(fixture_router(), "  XYZ ", "N", "N").await;
    assert_eq!(body["DataCenter"], "XYZ");
    assert_eq!(span_ids(&body), vec!["xyz-200"]);

    let body = post_details(fixture_router(), "abc", "N", "N").await;
    assert!(span_ids(&body).is_empty());
}

#[tokio::test]
async fn health_is_reported_only_on_request() {
    let body = json!({
        "Stage": "VSO_Details",
        "FacilityCodeA": "ABC",
        "IncludeHealth": true,
    });
    let (status, parsed) = post_raw(fixture_router(), &body.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    let spans = parsed["Spans"].as_array().expect("spans array");
    assert_eq!(spans.len(), 3);
    for span in spans {
        assert_eq!(span["prodSpans"], 1);
        assert_eq!(span["maintSpans"], 1);
        assert_eq!(span["prodPct"], 50);
    }

    let body = post_details(fixture_router(), "ABC", "N", "N").await;
    assert!(body["Spans"][0].get("prodPct").is_none());
}

#[tokio::test]
async fn empty_diversity_filter_runs_filtered_variant_matching_every_span() {
    let body = post_details(fixture_router(), "ABC", "", "N").await;

    // omt-sourced abc-103 drops out and the New span abc-101 is kept.
    assert_eq!(span_ids(&body), vec!["abc-100", "abc-101", "abc-102"]);
    let spans = body["Spans"].as_array().expect("spans array");
    assert_eq!(
        spans[0]["FormattedSpans"],
        "\"ABC-100\", \"ABC-101\", \"ABC-102\""
    );
    assert!(spans[0]["OpticalLink"]
        .as_str()
        .expect("link")
        .contains("/LoadSpanDetails?"));
}

#[tokio::test]
async fn malformed_json_is_invalid_input_without_internals() {
    let (status, body) = post_raw(fixture_router(), "{\"Stage\": ").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "InvalidInput");
    let rendered = body.to_string();
    assert!(!rendered.contains("panicked"));
    assert!(!rendered.contains("backtrace"));
    assert!(!rendered.contains(".rs:"));
}

#[tokio::test]
async fn missing_stage_is_missing_field_citing_stage() {
    let executor = fixture_executor();
    let app = build_vso_router(executor.clone(), "waneng");
    let (status, body) = post_raw(app, r#"{"FacilityCodeA":"ABC"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "MissingField");
    assert!(body["error"]["message"]
        .as_str()
        .expect("message")
        .contains("Stage"));
    assert!(executor.executed().is_empty());
}

#[tokio::test]
async fn details_request_binds_facility_parameter_for_each_source_query() {
    let executor = fixture_executor();
    let app = build_vso_router(executor.clone(), "waneng");
    post_details(app, "ABC", "East", "N").await;

    let executed = executor.executed();
    assert_eq!(executed.len(), 2);
    for call in executed {
        assert_eq!(call.database, "waneng");
        assert_eq!(
            call.parameters.get(vso_store::FACILITY_PARAMETER).map(String::as_str),
            Some("ABC")
        );
    }
}

//! HTTP surface for the optical span status report.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use vso_store::{QueryExecutor, SpanSource};

mod contract;
mod errors;
mod report;

pub use contract::{
    parse_vso_request, usage_payload, DetailsRequest, DetailsResponse, DetailsRow, VsoRequest,
    STAGE_EMAIL_TEMPLATE, STAGE_VSO_DETAILS,
};
pub use errors::{FailureKind, VsoApiError};
pub use report::run_span_report;

pub const VSO_ENDPOINT: &str = "/api/vso2";

const EMAIL_NOT_IMPLEMENTED_MESSAGE: &str = "Email sending requires Microsoft Graph application permissions (Mail.Send) granted to the service identity; this stage must be configured externally.";

#[derive(Debug, Clone)]
/// Listener and database settings for the report gateway.
pub struct VsoGatewayConfig {
    pub bind: String,
    pub database: String,
}

impl Default for VsoGatewayConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:7071".to_string(),
            database: "waneng".to_string(),
        }
    }
}

#[derive(Clone)]
struct VsoGatewayState {
    source: SpanSource,
}

/// Run the report gateway until ctrl-c.
pub async fn run_vso_gateway(
    config: VsoGatewayConfig,
    executor: Arc<dyn QueryExecutor>,
) -> Result<()> {
    let bind_addr: SocketAddr = config
        .bind
        .parse()
        .with_context(|| format!("invalid --bind '{}': expected host:port", config.bind))?;

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind vso gateway on {bind_addr}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve vso gateway listen address")?;
    tracing::info!(
        addr = %local_addr,
        database = %config.database,
        endpoint = VSO_ENDPOINT,
        "vso gateway listening"
    );

    let app = build_vso_router(executor, config.database);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("vso gateway exited unexpectedly")?;
    Ok(())
}

/// Builds the router serving the report endpoint.
pub fn build_vso_router(executor: Arc<dyn QueryExecutor>, database: impl Into<String>) -> Router {
    let state = Arc::new(VsoGatewayState {
        source: SpanSource::new(executor, database),
    });
    Router::new()
        .route(VSO_ENDPOINT, get(handle_usage).post(handle_vso_request))
        .with_state(state)
}

async fn handle_usage() -> Response {
    (StatusCode::OK, Json(usage_payload())).into_response()
}

async fn handle_vso_request(State(state): State<Arc<VsoGatewayState>>, body: Bytes) -> Response {
    match serve_vso_request(&state, &body).await {
        Ok(response) => response,
        Err(error) => {
            tracing::debug!(
                kind = error.kind.as_str(),
                message = %error.message,
                "vso request rejected"
            );
            error.into_response()
        }
    }
}

async fn serve_vso_request(state: &VsoGatewayState, body: &[u8]) -> Result<Response, VsoApiError> {
    let details = match parse_vso_request(body)? {
        VsoRequest::Details(details) => details,
        VsoRequest::EmailTemplate => {
            return Err(VsoApiError::not_implemented(EMAIL_NOT_IMPLEMENTED_MESSAGE));
        }
    };

    let started = Instant::now();
    let report = run_span_report(&state.source, &details.query)
        .await
        .map_err(|error| {
            tracing::warn!(
                facility = %details.query.facility_code,
                error = %error,
                "span query failed"
            );
            VsoApiError::backend_unavailable(error.to_string())
        })?;
    tracing::info!(
        facility = %details.query.facility_code,
        variant = details.query.variant().as_str(),
        spans = report.spans.len(),
        prod_pct = report.health.prod_pct,
        duration_ms = started.elapsed().as_millis() as u64,
        "span report served"
    );

    let response = DetailsResponse::from_report(
        report,
        details.query.facility_code,
        details.include_health,
    );
    Ok((StatusCode::OK, Json(response)).into_response())
}

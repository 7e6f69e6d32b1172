use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use vso_store::{
    AzureCliTokenProvider, InMemoryQueryExecutor, KustoClient, KustoConfig, QueryExecutor,
    StaticTokenProvider, TokenProvider,
};

use crate::cli::{Cli, CliKustoAuthMode};

pub(crate) fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

pub(crate) fn resolve_token_provider(cli: &Cli) -> Result<Arc<dyn TokenProvider>> {
    let provider: Arc<dyn TokenProvider> = match cli.kusto_auth_mode {
        CliKustoAuthMode::AzureCli => Arc::new(
            AzureCliTokenProvider::default().with_timeout_ms(cli.request_timeout_ms),
        ),
        CliKustoAuthMode::Static => {
            let token = cli
                .kusto_token
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| {
                    anyhow!("--kusto-token is required when --kusto-auth-mode=static")
                })?;
            Arc::new(StaticTokenProvider::new(token).context("invalid --kusto-token")?)
        }
    };
    tracing::debug!(
        auth_mode = cli.kusto_auth_mode.as_str(),
        "kusto token provider resolved"
    );
    Ok(provider)
}

/// Resolves the query executor once for the lifetime of the process.
pub(crate) fn resolve_query_executor(cli: &Cli) -> Result<Arc<dyn QueryExecutor>> {
    if let Some(path) = &cli.fixture_file {
        let executor = InMemoryQueryExecutor::from_fixture_file(path).with_context(|| {
            format!("failed to load relation fixture '{}'", path.display())
        })?;
        tracing::info!(fixture = %path.display(), "serving span reports from fixture");
        return Ok(Arc::new(executor));
    }

    let tokens = resolve_token_provider(cli)?;
    let client = KustoClient::new(
        KustoConfig {
            cluster_url: cli.kusto_cluster.clone(),
            token_scope: cli.kusto_token_scope.clone(),
            request_timeout_ms: cli.request_timeout_ms,
        },
        tokens,
    )
    .context("failed to construct kusto client")?;
    tracing::info!(cluster = %cli.kusto_cluster, "serving span reports from kusto");
    Ok(Arc::new(client))
}

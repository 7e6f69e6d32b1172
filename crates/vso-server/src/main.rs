mod bootstrap;
mod cli;

use anyhow::Result;
use clap::Parser;
use vso_gateway::{run_vso_gateway, VsoGatewayConfig};

use crate::bootstrap::{init_tracing, resolve_query_executor};
use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let executor = resolve_query_executor(&cli)?;
    run_vso_gateway(
        VsoGatewayConfig {
            bind: cli.bind.clone(),
            database: cli.kusto_database.clone(),
        },
        executor,
    )
    .await
}

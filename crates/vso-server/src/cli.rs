use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use vso_store::DEFAULT_KUSTO_TOKEN_SCOPE;

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliKustoAuthMode {
    AzureCli,
    Static,
}

impl CliKustoAuthMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CliKustoAuthMode::AzureCli => "azure-cli",
            CliKustoAuthMode::Static => "static",
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "vso-server",
    about = "Optical span provisioning status report for network-operations consoles",
    version
)]
pub struct Cli {
    #[arg(
        long,
        env = "VSO_BIND",
        default_value = "127.0.0.1:7071",
        help = "Socket address the report endpoint listens on"
    )]
    pub bind: String,

    #[arg(
        long = "kusto-cluster",
        env = "VSO_KUSTO_CLUSTER",
        default_value = "https://waneng.westus2.kusto.windows.net",
        help = "Kusto cluster URL hosting the span and link relations"
    )]
    pub kusto_cluster: String,

    #[arg(
        long = "kusto-database",
        env = "VSO_KUSTO_DATABASE",
        default_value = "waneng",
        help = "Kusto database queried for span reports"
    )]
    pub kusto_database: String,

    #[arg(
        long = "kusto-token-scope",
        env = "VSO_KUSTO_TOKEN_SCOPE",
        default_value = DEFAULT_KUSTO_TOKEN_SCOPE,
        help = "OAuth scope requested for Kusto access tokens"
    )]
    pub kusto_token_scope: String,

    #[arg(
        long = "kusto-auth-mode",
        env = "VSO_KUSTO_AUTH_MODE",
        value_enum,
        default_value_t = CliKustoAuthMode::AzureCli,
        help = "Token source for Kusto: azure-cli (signed-in az identity) or static (--kusto-token)"
    )]
    pub kusto_auth_mode: CliKustoAuthMode,

    #[arg(
        long = "kusto-token",
        env = "VSO_KUSTO_TOKEN",
        hide_env_values = true,
        help = "Pre-issued Kusto bearer token, required with --kusto-auth-mode=static"
    )]
    pub kusto_token: Option<String>,

    #[arg(
        long = "request-timeout-ms",
        env = "VSO_REQUEST_TIMEOUT_MS",
        default_value_t = 30_000,
        value_parser = parse_positive_u64,
        help = "Timeout for each Kusto query in milliseconds"
    )]
    pub request_timeout_ms: u64,

    #[arg(
        long = "fixture-file",
        env = "VSO_FIXTURE_FILE",
        help = "Serve reports from a local JSON snapshot of the relations instead of Kusto"
    )]
    pub fixture_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_cli_defaults() {
        let cli = Cli::try_parse_from(["vso-server"]).expect("parse defaults");
        assert_eq!(cli.bind, "127.0.0.1:7071");
        assert_eq!(cli.kusto_database, "waneng");
        assert_eq!(cli.kusto_token_scope, DEFAULT_KUSTO_TOKEN_SCOPE);
        assert_eq!(cli.kusto_auth_mode, CliKustoAuthMode::AzureCli);
        assert_eq!(cli.request_timeout_ms, 30_000);
        assert!(cli.fixture_file.is_none());
    }

    #[test]
    fn unit_cli_parses_static_auth() {
        let cli = Cli::try_parse_from([
            "vso-server",
            "--kusto-auth-mode",
            "static",
            "--kusto-token",
            "token-1",
        ])
        .expect("parse static auth");
        assert_eq!(cli.kusto_auth_mode, CliKustoAuthMode::Static);
        assert_eq!(cli.kusto_token.as_deref(), Some("token-1"));
    }

    #[test]
    fn regression_cli_rejects_zero_timeout() {
        let error = Cli::try_parse_from(["vso-server", "--request-timeout-ms", "0"])
            .expect_err("zero timeout");
        assert!(error.to_string().contains("greater than 0"));
    }
}

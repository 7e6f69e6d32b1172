use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tokio::sync::Mutex;

use crate::{StoreError, StoreResult};

const DEFAULT_AZ_EXECUTABLE: &str = "az";
const DEFAULT_AZ_TIMEOUT_MS: u64 = 30_000;
const TOKEN_REFRESH_MARGIN_SECONDS: u64 = 300;

#[async_trait]
/// Bearer token source for the analytical store, resolved once at startup.
pub trait TokenProvider: Send + Sync {
    async fn fetch_token(&self, scope: &str) -> StoreResult<String>;
}

/// Serves a pre-issued token for every scope.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> StoreResult<Self> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(StoreError::MissingToken);
        }
        Ok(Self { token })
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn fetch_token(&self, _scope: &str) -> StoreResult<String> {
        Ok(self.token.clone())
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    scope: String,
    token: String,
    expires_unix: u64,
}

#[derive(Debug, Deserialize)]
struct AzAccessToken {
    #[serde(rename = "accessToken")]
    access_token: String,
    #[serde(default)]
    expires_on: Option<u64>,
}

/// Obtains tokens from the signed-in Azure CLI identity.
///
/// Tokens carrying an `expires_on` are cached per scope until shortly before
/// they expire. A CLI call that outlives the timeout is killed and reported
/// as a token command failure.
#[derive(Debug)]
pub struct AzureCliTokenProvider {
    executable: String,
    timeout_ms: u64,
    cache: Mutex<Option<CachedToken>>,
}

impl Default for AzureCliTokenProvider {
    fn default() -> Self {
        Self::new(DEFAULT_AZ_EXECUTABLE)
    }
}

impl AzureCliTokenProvider {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            timeout_ms: DEFAULT_AZ_TIMEOUT_MS,
            cache: Mutex::new(None),
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms.max(1);
        self
    }

    async fn request_token(&self, scope: &str) -> StoreResult<AzAccessToken> {
        let mut command = Command::new(&self.executable);
        command.kill_on_drop(true);
        command.args(["account", "get-access-token", "--scope", scope, "--output", "json"]);
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        let child = command.spawn()?;

        let output = tokio::time::timeout(
            Duration::from_millis(self.timeout_ms),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| {
            StoreError::TokenCommand(format!(
                "'{}' timed out after {}ms",
                self.executable, self.timeout_ms
            ))
        })??;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(StoreError::TokenCommand(if stderr.is_empty() {
                format!("'{}' exited with {}", self.executable, output.status)
            } else {
                stderr
            }));
        }
        let parsed: AzAccessToken = serde_json::from_slice(&output.stdout)?;
        if parsed.access_token.trim().is_empty() {
            return Err(StoreError::MissingToken);
        }
        Ok(parsed)
    }
}

#[async_trait]
impl TokenProvider for AzureCliTokenProvider {
    #[tracing::instrument(name = "vso_store.auth.azure_cli", level = "debug", skip(self))]
    async fn fetch_token(&self, scope: &str) -> StoreResult<String> {
        let mut cache = self.cache.lock().await;
        let now = current_unix_timestamp();
        if let Some(cached) = cache.as_ref() {
            if cached.scope == scope && cached.expires_unix > now {
                return Ok(cached.token.clone());
            }
        }

        let fetched = self.request_token(scope).await?;
        tracing::debug!(
            cached = fetched.expires_on.is_some(),
            "azure cli token acquired"
        );
        *cache = fetched.expires_on.map(|expires_on| CachedToken {
            scope: scope.to_string(),
            token: fetched.access_token.clone(),
            expires_unix: expires_on.saturating_sub(TOKEN_REFRESH_MARGIN_SECONDS),
        });
        Ok(fetched.access_token)
    }
}

fn current_unix_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

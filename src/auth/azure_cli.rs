use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use super::{AccessToken, CredentialError, TokenCredential};

const NAME: &str = "AzureCliCredential";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliToken {
    access_token: String,
    // local time, e.g. "2025-01-01 12:00:00.000000"
    #[serde(default)]
    expires_on: Option<String>,
    // epoch seconds; only present in newer CLI releases
    #[serde(default, rename = "expires_on")]
    expires_on_epoch: Option<i64>,
}

/// Reuses the signed-in Azure CLI session (`az login`).
#[derive(Debug, Clone)]
pub struct AzureCliCredential {
    program: String,
}

impl Default for AzureCliCredential {
    fn default() -> Self {
        Self::new()
    }
}

impl AzureCliCredential {
    pub fn new() -> Self {
        Self {
            program: if cfg!(windows) { "az.cmd" } else { "az" }.to_string(),
        }
    }
}

#[async_trait]
impl TokenCredential for AzureCliCredential {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn get_token(&self, scope: &str) -> Result<AccessToken, CredentialError> {
        debug!(program=%self.program, scope, "requesting token from azure cli");
        let output = Command::new(&self.program)
            .args(["account", "get-access-token", "--scope", scope, "-o", "json"])
            .output()
            .await
            .map_err(|e| CredentialError::unavailable(NAME, format!("cannot run az: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CredentialError::unavailable(
                NAME,
                format!("az exited with {}: {}", output.status, stderr.trim()),
            ));
        }
        parse_cli_token(&output.stdout)
    }
}

fn parse_cli_token(stdout: &[u8]) -> Result<AccessToken, CredentialError> {
    let tok: CliToken = serde_json::from_slice(stdout)
        .map_err(|e| CredentialError::unavailable(NAME, format!("parse az output: {e}")))?;
    let expires_on = tok
        .expires_on_epoch
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .or_else(|| tok.expires_on.as_deref().and_then(parse_local_time))
        .unwrap_or_else(|| Utc::now() + Duration::minutes(5));
    Ok(AccessToken {
        token: tok.access_token,
        expires_on,
    })
}

fn parse_local_time(s: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").ok()?;
    Local
        .from_local_datetime(&naive)
        .single()
        .map(|t| t.with_timezone(&Utc))
}

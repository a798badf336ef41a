use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::debug;

use super::{AccessToken, CredentialError, TokenCredential};

const NAME: &str = "EnvironmentCredential";
const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Service principal client-credentials flow configured through
/// `AZURE_TENANT_ID` / `AZURE_CLIENT_ID` / `AZURE_CLIENT_SECRET`.
pub struct EnvironmentCredential {
    tenant_id: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    authority: String,
    http: reqwest::Client,
}

impl EnvironmentCredential {
    pub fn from_env() -> Self {
        let var = |k: &str| std::env::var(k).ok().filter(|v| !v.is_empty());
        Self {
            tenant_id: var("AZURE_TENANT_ID"),
            client_id: var("AZURE_CLIENT_ID"),
            client_secret: var("AZURE_CLIENT_SECRET"),
            authority: var("AZURE_AUTHORITY_HOST").unwrap_or_else(|| DEFAULT_AUTHORITY.into()),
            http: reqwest::Client::new(),
        }
    }

    #[cfg(test)]
    fn with_values(authority: &str, tenant: &str, client: &str, secret: &str) -> Self {
        Self {
            tenant_id: Some(tenant.into()),
            client_id: Some(client.into()),
            client_secret: Some(secret.into()),
            authority: authority.into(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TokenCredential for EnvironmentCredential {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn get_token(&self, scope: &str) -> Result<AccessToken, CredentialError> {
        let (Some(tenant), Some(client_id), Some(secret)) =
            (&self.tenant_id, &self.client_id, &self.client_secret)
        else {
            return Err(CredentialError::unavailable(
                NAME,
                "AZURE_TENANT_ID, AZURE_CLIENT_ID and AZURE_CLIENT_SECRET are not all set",
            ));
        };

        let url = format!(
            "{}/{tenant}/oauth2/v2.0/token",
            self.authority.trim_end_matches('/')
        );
        debug!(%url, "requesting client-credentials token");
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", client_id.as_str()),
            ("client_secret", secret.as_str()),
            ("scope", scope),
        ];
        let resp = self
            .http
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| CredentialError::unavailable(NAME, e.to_string()))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(CredentialError::unavailable(
                NAME,
                format!("token endpoint returned {status}: {body}"),
            ));
        }
        let body: TokenResponse = resp
            .json()
            .await
            .map_err(|e| CredentialError::unavailable(NAME, format!("parse token: {e}")))?;
        Ok(AccessToken {
            token: body.access_token,
            expires_on: Utc::now() + Duration::seconds(body.expires_in),
        })
    }
}

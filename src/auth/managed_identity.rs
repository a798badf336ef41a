use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::time::Duration as StdDuration;

use super::{AccessToken, CredentialError, TokenCredential, scope_to_resource};

const NAME: &str = "ManagedIdentityCredential";
const IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const IMDS_API_VERSION: &str = "2018-02-01";

#[derive(Debug, Deserialize)]
struct ImdsToken {
    access_token: String,
    // IMDS reports epoch seconds as a string
    expires_on: String,
}

pub struct ManagedIdentityCredential {
    endpoint: String,
    http: reqwest::Client,
}

impl Default for ManagedIdentityCredential {
    fn default() -> Self {
        Self::new()
    }
}

impl ManagedIdentityCredential {
    pub fn new() -> Self {
        Self::with_endpoint(IMDS_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        // IMDS is link-local; off-Azure the request must fail fast.
        let http = reqwest::Client::builder()
            .connect_timeout(StdDuration::from_secs(1))
            .timeout(StdDuration::from_secs(5))
            .build()
            .unwrap_or_default();
        Self {
            endpoint: endpoint.into(),
            http,
        }
    }
}

#[async_trait]
impl TokenCredential for ManagedIdentityCredential {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn get_token(&self, scope: &str) -> Result<AccessToken, CredentialError> {
        let resp = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("api-version", IMDS_API_VERSION),
                ("resource", scope_to_resource(scope)),
            ])
            .header("Metadata", "true")
            .send()
            .await
            .map_err(|e| CredentialError::unavailable(NAME, format!("IMDS unreachable: {e}")))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(CredentialError::unavailable(
                NAME,
                format!("IMDS returned {status}: {body}"),
            ));
        }
        let body: ImdsToken = resp
            .json()
            .await
            .map_err(|e| CredentialError::unavailable(NAME, format!("parse token: {e}")))?;
        let expires_on = body
            .expires_on
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .unwrap_or_else(|| Utc::now() + Duration::minutes(10));
        Ok(AccessToken {
            token: body.access_token,
            expires_on,
        })
    }
}

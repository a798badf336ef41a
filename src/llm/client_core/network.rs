use reqwest::RequestBuilder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use super::{PROJECT_SCOPE, ProjectClient};
use crate::llm::ApiError;

pub(super) fn log_payload<B: Serialize + ?Sized>(url: &str, body: &B) {
    if let Ok(payload) = serde_json::to_string_pretty(body) {
        debug!(payload=%payload, endpoint=%url, "sending project api payload");
    }
}

/// Authenticate, send, and return the body of a successful response.
pub(super) async fn execute(
    client: &ProjectClient,
    builder: RequestBuilder,
    method: &'static str,
    path: &str,
) -> Result<String, ApiError> {
    let token = client.credential.get_token(PROJECT_SCOPE).await?;

    let resp = builder
        .bearer_auth(&token.token)
        .send()
        .await
        .map_err(|source| {
            error!(method, path, err=%source, "project api send error");
            ApiError::Transport {
                method,
                path: path.to_string(),
                source,
            }
        })?;

    let status = resp.status();
    let text = resp.text().await.map_err(|source| ApiError::Transport {
        method,
        path: path.to_string(),
        source,
    })?;

    if !status.is_success() {
        error!(method, path, status=%status.as_u16(), body=%text, "project api non-success status");
        return Err(ApiError::Status {
            method,
            path: path.to_string(),
            status,
            body: text,
        });
    }

    debug!(method, path, response_body=%text, "project api response");
    Ok(text)
}

pub(super) fn decode<T: DeserializeOwned>(path: &str, text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|source| {
        error!(path, err=%source, "project api deserialize error");
        ApiError::Decode {
            path: path.to_string(),
            source,
        }
    })
}

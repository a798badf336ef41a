use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::TokenCredential;
use crate::config::HttpConfig;
use crate::llm::ApiError;

mod network;

/// Token scope for the AI project data plane.
pub const PROJECT_SCOPE: &str = "https://ai.azure.com/.default";
pub const DEFAULT_API_VERSION: &str = "2025-11-15-preview";
pub const DEFAULT_CHAT_API_VERSION: &str = "2024-10-21";

#[derive(Clone)]
pub struct ProjectClient {
    pub endpoint: String,
    pub api_version: String,
    pub chat_api_version: String,
    pub(crate) inner: reqwest::Client,
    credential: Arc<dyn TokenCredential>,
}

impl std::fmt::Debug for ProjectClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectClient")
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .field("chat_api_version", &self.chat_api_version)
            .field("credential", &self.credential.name())
            .finish()
    }
}

impl ProjectClient {
    pub fn new(endpoint: impl Into<String>, credential: Arc<dyn TokenCredential>) -> Result<Self> {
        let inner = reqwest::Client::builder().build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            chat_api_version: DEFAULT_CHAT_API_VERSION.to_string(),
            inner,
            credential,
        })
    }

    pub fn with_http_config(mut self, cfg: &HttpConfig) -> Self {
        let builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(cfg.connect_timeout_ms))
            .timeout(Duration::from_millis(cfg.request_timeout_ms));
        // Keep the default client if the builder rejects the settings.
        if let Ok(c) = builder.build() {
            self.inner = c;
        }
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_chat_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.chat_api_version = api_version.into();
        self
    }

    pub(crate) fn url(&self, path: &str, api_version: &str) -> String {
        format!(
            "{}/{}?api-version={}",
            self.endpoint.trim_end_matches('/'),
            path.trim_start_matches('/'),
            api_version
        )
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path, &self.api_version);
        let text = network::execute(self, self.inner.get(&url), "GET", path).await?;
        network::decode(path, &text)
    }

    pub(crate) async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.post_json_versioned(path, &self.api_version, body).await
    }

    pub(crate) async fn post_json_versioned<B, T>(
        &self,
        path: &str,
        api_version: &str,
        body: &B,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path, api_version);
        network::log_payload(&url, body);
        let text = network::execute(self, self.inner.post(&url).json(body), "POST", path).await?;
        network::decode(path, &text)
    }

    /// POST whose response body is irrelevant.
    pub(crate) async fn post_discard<B>(&self, path: &str, body: &B) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path, &self.api_version);
        network::log_payload(&url, body);
        network::execute(self, self.inner.post(&url).json(body), "POST", path).await?;
        Ok(())
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = self.url(path, &self.api_version);
        network::execute(self, self.inner.delete(&url), "DELETE", path).await?;
        Ok(())
    }
}

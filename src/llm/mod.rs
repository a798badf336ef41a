mod agents;
mod chat;
mod client_core;
mod conversations;
mod responses;
pub mod types;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::auth::CredentialError;

pub use client_core::*;
pub use types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    RateLimited,
    Server,
    Network,
    Timeout,
    Client,
    Deserialize,
    Unknown,
}

pub fn classify_error(status: Option<StatusCode>, err: Option<&reqwest::Error>) -> LlmErrorKind {
    if let Some(st) = status {
        if st == StatusCode::TOO_MANY_REQUESTS {
            return LlmErrorKind::RateLimited;
        }
        if st.is_server_error() {
            return LlmErrorKind::Server;
        }
        if st.is_client_error() {
            return LlmErrorKind::Client;
        }
    }
    if let Some(e) = err {
        if e.is_timeout() {
            return LlmErrorKind::Timeout;
        }
        if e.is_connect() || e.is_body() || e.is_request() {
            return LlmErrorKind::Network;
        }
        if e.is_decode() {
            return LlmErrorKind::Deserialize;
        }
    }
    LlmErrorKind::Unknown
}

/// Outcome of a failed remote call.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{method} {path} returned {status}: {body}")]
    Status {
        method: &'static str,
        path: String,
        status: StatusCode,
        body: String,
    },
    #[error("{method} {path} failed: {source}")]
    Transport {
        method: &'static str,
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("parse response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Empty(String),
    #[error(transparent)]
    Credential(#[from] CredentialError),
}

impl ApiError {
    pub fn kind(&self) -> LlmErrorKind {
        match self {
            ApiError::Status { status, .. } => classify_error(Some(*status), None),
            ApiError::Transport { source, .. } => classify_error(None, Some(source)),
            ApiError::Decode { .. } | ApiError::Empty(_) => LlmErrorKind::Deserialize,
            ApiError::Credential(_) => LlmErrorKind::Client,
        }
    }
}

/// The remote operations the dispatch loop drives.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    async fn create_agent_version(
        &self,
        name: &str,
        definition: &PromptAgentDefinition,
    ) -> Result<AgentVersion, ApiError>;

    async fn delete_agent_version(&self, agent: &AgentVersion) -> Result<(), ApiError>;

    async fn create_conversation(&self) -> Result<Conversation, ApiError>;

    async fn delete_conversation(&self, conversation_id: &str) -> Result<(), ApiError>;

    async fn add_conversation_items(
        &self,
        conversation_id: &str,
        items: &[InputMessage],
    ) -> Result<(), ApiError>;

    /// Ask the agent to respond to the conversation as it stands.
    async fn create_response(
        &self,
        conversation_id: &str,
        agent: &AgentReference,
    ) -> Result<ModelResponse, ApiError>;

    /// Hand tool outputs back to the model, chained on the prior response.
    async fn continue_response(
        &self,
        previous_response_id: &str,
        outputs: &[FunctionCallOutput],
        agent: &AgentReference,
    ) -> Result<ModelResponse, ApiError>;
}

#[async_trait]
impl AgentBackend for ProjectClient {
    async fn create_agent_version(
        &self,
        name: &str,
        definition: &PromptAgentDefinition,
    ) -> Result<AgentVersion, ApiError> {
        ProjectClient::create_agent_version(self, name, definition).await
    }

    async fn delete_agent_version(&self, agent: &AgentVersion) -> Result<(), ApiError> {
        ProjectClient::delete_agent_version(self, agent).await
    }

    async fn create_conversation(&self) -> Result<Conversation, ApiError> {
        ProjectClient::create_conversation(self).await
    }

    async fn delete_conversation(&self, conversation_id: &str) -> Result<(), ApiError> {
        ProjectClient::delete_conversation(self, conversation_id).await
    }

    async fn add_conversation_items(
        &self,
        conversation_id: &str,
        items: &[InputMessage],
    ) -> Result<(), ApiError> {
        ProjectClient::add_conversation_items(self, conversation_id, items).await
    }

    async fn create_response(
        &self,
        conversation_id: &str,
        agent: &AgentReference,
    ) -> Result<ModelResponse, ApiError> {
        ProjectClient::create_response(self, conversation_id, agent).await
    }

    async fn continue_response(
        &self,
        previous_response_id: &str,
        outputs: &[FunctionCallOutput],
        agent: &AgentReference,
    ) -> Result<ModelResponse, ApiError> {
        ProjectClient::continue_response(self, previous_response_id, outputs, agent).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_by_status() {
        assert_eq!(
            classify_error(Some(StatusCode::TOO_MANY_REQUESTS), None),
            LlmErrorKind::RateLimited
        );
        assert_eq!(
            classify_error(Some(StatusCode::BAD_GATEWAY), None),
            LlmErrorKind::Server
        );
        assert_eq!(
            classify_error(Some(StatusCode::UNAUTHORIZED), None),
            LlmErrorKind::Client
        );
        assert_eq!(classify_error(None, None), LlmErrorKind::Unknown);
    }

    #[test]
    fn status_error_display_includes_body() {
        let err = ApiError::Status {
            method: "POST",
            path: "openai/responses".into(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "oops".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("500"));
        assert!(msg.contains("oops"));
        assert_eq!(err.kind(), LlmErrorKind::Server);
    }
}

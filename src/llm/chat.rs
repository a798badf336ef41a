use tracing::debug;

use crate::llm::types::{ChatMessage, ChatRequest, ChatResponse, Connection, ConnectionList};
use crate::llm::{ApiError, ProjectClient};

impl ProjectClient {
    /// Single chat.completions round trip; returns the assistant text.
    pub async fn chat_once(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ApiError> {
        let req = ChatRequest { model, messages };
        let body: ChatResponse = self
            .post_json_versioned("openai/chat/completions", &self.chat_api_version, &req)
            .await?;
        debug!(id=?body.id, choices = body.choices.len(), "chat completion received");
        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or_else(|| ApiError::Empty("no choices returned".into()))
    }

    pub async fn list_connections(&self) -> Result<Vec<Connection>, ApiError> {
        let list: ConnectionList = self.get_json("connections").await?;
        Ok(list.value)
    }
}

use tracing::{debug, info};

use crate::llm::types::{AddItemsRequest, Conversation, InputMessage};
use crate::llm::{ApiError, ProjectClient};

impl ProjectClient {
    pub async fn create_conversation(&self) -> Result<Conversation, ApiError> {
        let conversation: Conversation = self
            .post_json("openai/conversations", &serde_json::json!({}))
            .await?;
        info!(id=%conversation.id, "conversation created");
        Ok(conversation)
    }

    pub async fn add_conversation_items(
        &self,
        conversation_id: &str,
        items: &[InputMessage],
    ) -> Result<(), ApiError> {
        let path = format!("openai/conversations/{conversation_id}/items");
        self.post_discard(&path, &AddItemsRequest { items }).await?;
        debug!(conversation_id, count = items.len(), "conversation items added");
        Ok(())
    }

    pub async fn delete_conversation(&self, conversation_id: &str) -> Result<(), ApiError> {
        self.delete(&format!("openai/conversations/{conversation_id}"))
            .await?;
        info!(id=%conversation_id, "conversation deleted");
        Ok(())
    }
}

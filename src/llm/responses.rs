use tracing::debug;

use crate::llm::types::{
    AgentReference, CreateResponseRequest, FunctionCallOutput, ModelResponse, ResponseInput,
};
use crate::llm::{ApiError, ProjectClient};

const RESPONSES_PATH: &str = "openai/responses";

impl ProjectClient {
    pub async fn create_response(
        &self,
        conversation_id: &str,
        agent: &AgentReference,
    ) -> Result<ModelResponse, ApiError> {
        let req = CreateResponseRequest {
            conversation: Some(conversation_id),
            previous_response_id: None,
            input: ResponseInput::Text(""),
            agent,
        };
        let resp: ModelResponse = self.post_json(RESPONSES_PATH, &req).await?;
        debug!(id=%resp.id, status=?resp.status, items = resp.output.len(), "response created");
        Ok(resp)
    }

    pub async fn continue_response(
        &self,
        previous_response_id: &str,
        outputs: &[FunctionCallOutput],
        agent: &AgentReference,
    ) -> Result<ModelResponse, ApiError> {
        let req = CreateResponseRequest {
            conversation: None,
            previous_response_id: Some(previous_response_id),
            input: ResponseInput::Items(outputs),
            agent,
        };
        let resp: ModelResponse = self.post_json(RESPONSES_PATH, &req).await?;
        debug!(id=%resp.id, previous=%previous_response_id, status=?resp.status, "follow-up response created");
        Ok(resp)
    }
}

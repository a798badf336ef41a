use std::io::{self, Write};
use tracing::{debug, warn};

use super::AgentSession;
use crate::llm::types::{
    FunctionCallItem, FunctionCallOutput, InputMessage, ModelResponse, OutputItem,
};
use crate::llm::{AgentBackend, ApiError};
use crate::tools::{ToolError, ToolRegistry};

/// Result of one user turn, ready to render.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Error detail of every response in the turn that came back `failed`.
    pub failures: Vec<String>,
    pub tool_results: usize,
    pub followup_sent: bool,
    pub final_response: ModelResponse,
}

/// Append the user's message to the conversation and ask the agent to respond.
pub async fn submit_user_turn<B: AgentBackend + ?Sized>(
    backend: &B,
    session: &AgentSession,
    text: &str,
) -> Result<ModelResponse, ApiError> {
    backend
        .add_conversation_items(&session.conversation_id, &[InputMessage::user(text)])
        .await?;
    backend
        .create_response(&session.conversation_id, &session.agent_reference())
        .await
}

pub fn extract_tool_calls(response: &ModelResponse) -> Vec<FunctionCallItem> {
    response
        .output
        .iter()
        .filter_map(|item| match item {
            OutputItem::FunctionCall(call) => Some(call.clone()),
            _ => None,
        })
        .collect()
}

/// Run every call with a registered handler. Unknown names are logged and
/// get no output.
pub fn execute_tool_calls(
    registry: &ToolRegistry,
    calls: &[FunctionCallItem],
) -> Vec<FunctionCallOutput> {
    let mut results = Vec::with_capacity(calls.len());
    for call in calls {
        match registry.execute(call) {
            Ok(result) => results.push(result),
            Err(ToolError::UnknownTool(name)) => {
                warn!(tool=%name, call_id=%call.call_id, "model requested an unregistered tool; no output sent");
            }
            Err(e) => {
                warn!(call_id=%call.call_id, error=%e, "tool call dropped");
            }
        }
    }
    results
}

/// Send collected outputs back to the model. No request is made for an empty batch.
pub async fn submit_tool_results<B: AgentBackend + ?Sized>(
    backend: &B,
    session: &AgentSession,
    previous_response_id: &str,
    results: &[FunctionCallOutput],
) -> Result<Option<ModelResponse>, ApiError> {
    if results.is_empty() {
        return Ok(None);
    }
    let resp = backend
        .continue_response(previous_response_id, results, &session.agent_reference())
        .await?;
    Ok(Some(resp))
}

pub fn render_final_text<W: Write>(out: &mut W, response: &ModelResponse) -> io::Result<()> {
    writeln!(out, "Agent response: {}", response.output_text())
}

fn failure_detail(response: &ModelResponse) -> Option<String> {
    if !response.is_failed() {
        return None;
    }
    Some(
        response
            .error
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "unknown error".to_string()),
    )
}

/// One full turn: prompt, tool dispatch, optional follow-up.
pub async fn run_turn<B: AgentBackend + ?Sized>(
    backend: &B,
    session: &AgentSession,
    registry: &ToolRegistry,
    text: &str,
) -> Result<TurnOutcome, ApiError> {
    let response = submit_user_turn(backend, session, text).await?;
    let mut failures: Vec<String> = failure_detail(&response).into_iter().collect();

    let calls = extract_tool_calls(&response);
    debug!(response=%response.id, tool_calls = calls.len(), "response received");
    let results = execute_tool_calls(registry, &calls);

    let (final_response, followup_sent) =
        match submit_tool_results(backend, session, &response.id, &results).await? {
            Some(followup) => {
                failures.extend(failure_detail(&followup));
                (followup, true)
            }
            None => (response, false),
        };

    Ok(TurnOutcome {
        failures,
        tool_results: results.len(),
        followup_sent,
        final_response,
    })
}

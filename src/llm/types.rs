use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionTool {
    #[serde(rename = "type")]
    pub kind: String, // "function"
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value, // JSON Schema object
    pub strict: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PromptAgentDefinition {
    pub kind: String, // "prompt"
    pub model: String,
    pub instructions: String,
    pub tools: Vec<FunctionTool>,
}

impl PromptAgentDefinition {
    pub fn new(
        model: impl Into<String>,
        instructions: impl Into<String>,
        tools: Vec<FunctionTool>,
    ) -> Self {
        Self {
            kind: "prompt".into(),
            model: model.into(),
            instructions: instructions.into(),
            tools,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateAgentVersionRequest<'a> {
    pub definition: &'a PromptAgentDefinition,
}

/// A created agent version, addressed by name + version for deletion.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AgentVersion {
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub version: String,
}

impl AgentVersion {
    pub fn reference(&self) -> AgentReference {
        AgentReference {
            name: self.name.clone(),
            kind: "agent_reference".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AgentReference {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String, // "agent_reference"
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Conversation {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InputMessage {
    #[serde(rename = "type")]
    pub kind: String, // "message"
    pub role: String,
    pub content: String,
}

impl InputMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            kind: "message".into(),
            role: "user".into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AddItemsRequest<'a> {
    pub items: &'a [InputMessage],
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ResponseInput<'a> {
    Text(&'a str),
    Items(&'a [FunctionCallOutput]),
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateResponseRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_response_id: Option<&'a str>,
    pub input: ResponseInput<'a>,
    pub agent: &'a AgentReference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Completed,
    Failed,
    InProgress,
    Cancelled,
    Queued,
    Incomplete,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ResponseError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl std::fmt::Display for ResponseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{code}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModelResponse {
    pub id: String,
    #[serde(default)]
    pub status: Option<ResponseStatus>,
    #[serde(default)]
    pub error: Option<ResponseError>,
    #[serde(default)]
    pub output: Vec<OutputItem>,
}

impl ModelResponse {
    pub fn is_failed(&self) -> bool {
        self.status == Some(ResponseStatus::Failed)
    }

    /// Aggregated text of every `output_text` part in the message items.
    pub fn output_text(&self) -> String {
        let mut text = String::new();
        for item in &self.output {
            if let OutputItem::Message { content } = item {
                for part in content {
                    if let ContentPart::OutputText { text: t } = part {
                        text.push_str(t);
                    }
                }
            }
        }
        text
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    Message {
        #[serde(default)]
        content: Vec<ContentPart>,
    },
    FunctionCall(FunctionCallItem),
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    OutputText {
        text: String,
    },
    #[serde(other)]
    Other,
}

/// A model request to run a local function.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FunctionCallItem {
    #[serde(default)]
    pub id: Option<String>,
    pub call_id: String,
    pub name: String,
    pub arguments: String, // JSON string
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FunctionCallOutput {
    #[serde(rename = "type")]
    pub kind: String, // "function_call_output"
    pub call_id: String,
    pub output: String,
}

impl FunctionCallOutput {
    pub fn new(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            kind: "function_call_output".into(),
            call_id: call_id.into(),
            output: output.into(),
        }
    }
}

// chat.completions, used by the plain chat loop

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub id: Option<String>,
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Connection {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionList {
    #[serde(default)]
    pub value: Vec<Connection>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(u64),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    })
}

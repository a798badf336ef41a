//! Local functions the remote model may call, keyed by tool name.

pub mod support_ticket;

use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm::types::{FunctionCallItem, FunctionCallOutput, FunctionTool};

pub use support_ticket::{SubmitSupportTicketArgs, submit_support_ticket};

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{tool} failed: {source}")]
    Execution {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Every local tool the agent can be given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    SubmitSupportTicket,
}

impl ToolKind {
    pub const ALL: &'static [ToolKind] = &[ToolKind::SubmitSupportTicket];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::SubmitSupportTicket => support_ticket::NAME,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.name() == name)
    }

    pub fn definition(self) -> FunctionTool {
        match self {
            ToolKind::SubmitSupportTicket => support_ticket::tool_def(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ToolRegistry {
    handlers: HashMap<&'static str, ToolKind>,
    ticket_dir: PathBuf,
}

impl ToolRegistry {
    pub fn new(ticket_dir: impl Into<PathBuf>) -> Self {
        let handlers = ToolKind::ALL.iter().map(|k| (k.name(), *k)).collect();
        Self {
            handlers,
            ticket_dir: ticket_dir.into(),
        }
    }

    pub fn ticket_dir(&self) -> &Path {
        &self.ticket_dir
    }

    pub fn definitions(&self) -> Vec<FunctionTool> {
        ToolKind::ALL.iter().map(|k| k.definition()).collect()
    }

    /// Every declared schema must have a handler. `definitions()` always
    /// passes; a schema assembled by hand is what it catches.
    pub fn validate(&self, declared: &[FunctionTool]) -> Result<(), ToolError> {
        for tool in declared {
            let handled = ToolKind::from_name(&tool.name)
                .is_some_and(|k| self.handlers.contains_key(k.name()));
            if !handled {
                return Err(ToolError::UnknownTool(tool.name.clone()));
            }
        }
        Ok(())
    }

    /// Run one model-issued call.
    ///
    /// Only an unknown tool name is an `Err`: there is nothing to answer. Bad
    /// arguments and execution failures still produce an output for the call id,
    /// carrying `{"error": ...}` so the model can react.
    pub fn execute(&self, call: &FunctionCallItem) -> Result<FunctionCallOutput, ToolError> {
        let kind = *self
            .handlers
            .get(call.name.as_str())
            .ok_or_else(|| ToolError::UnknownTool(call.name.clone()))?;
        debug!(tool = kind.name(), call_id=%call.call_id, "executing tool");

        let output = match self.run(kind, &call.arguments) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(tool = kind.name(), call_id=%call.call_id, error=%e, "tool call rejected");
                json!({"error": e.to_string()}).to_string()
            }
        };
        Ok(FunctionCallOutput::new(call.call_id.clone(), output))
    }

    fn run(&self, kind: ToolKind, arguments: &str) -> Result<String, ToolError> {
        match kind {
            ToolKind::SubmitSupportTicket => {
                let args: SubmitSupportTicketArgs = parse_args(kind, arguments)?;
                submit_support_ticket(&self.ticket_dir, &args).map_err(|source| {
                    ToolError::Execution {
                        tool: kind.name(),
                        source,
                    }
                })
            }
        }
    }
}

fn parse_args<T: DeserializeOwned>(kind: ToolKind, arguments: &str) -> Result<T, ToolError> {
    serde_json::from_str(arguments).map_err(|source| ToolError::InvalidArguments {
        tool: kind.name(),
        source,
    })
}

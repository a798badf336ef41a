use anyhow::{Context, Result};
use std::io::Write;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::llm::types::{AgentReference, AgentVersion, PromptAgentDefinition};
use crate::llm::{AgentBackend, ApiError};
use crate::tools::ToolRegistry;

/// Remote state owned by one program run: the agent version and its conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSession {
    pub agent: AgentVersion,
    pub conversation_id: String,
}

impl AgentSession {
    pub async fn start<B, W>(
        backend: &B,
        cfg: &AppConfig,
        registry: &ToolRegistry,
        out: &mut W,
    ) -> Result<Self>
    where
        B: AgentBackend + ?Sized,
        W: Write,
    {
        let tools = registry.definitions();
        registry.validate(&tools).context("validate tool registry")?;
        let definition = PromptAgentDefinition::new(&cfg.model, &cfg.instructions, tools);

        let agent = backend
            .create_agent_version(&cfg.agent_name, &definition)
            .await
            .context("create agent version")?;
        writeln!(
            out,
            "Using agent: {} (version: {})",
            agent.name, agent.version
        )?;

        let conversation = match backend.create_conversation().await {
            Ok(c) => c,
            Err(e) => {
                // the agent version would otherwise outlive the run
                if let Err(cleanup) = backend.delete_agent_version(&agent).await {
                    error!(error=%cleanup, "failed to delete agent after conversation error");
                }
                return Err(e).context("create conversation");
            }
        };
        writeln!(out, "Created conversation (id: {})", conversation.id)?;
        info!(agent=%agent.name, version=%agent.version, conversation=%conversation.id, "session started");

        Ok(Self {
            agent,
            conversation_id: conversation.id,
        })
    }

    pub fn agent_reference(&self) -> AgentReference {
        self.agent.reference()
    }

    /// Delete the conversation, then the agent version. Both are attempted
    /// even if the first fails; the first error is returned.
    pub async fn close<B, W>(&self, backend: &B, out: &mut W) -> Result<()>
    where
        B: AgentBackend + ?Sized,
        W: Write,
    {
        let mut first_err: Option<ApiError> = None;

        match backend.delete_conversation(&self.conversation_id).await {
            Ok(()) => writeln!(out, "Conversation deleted")?,
            Err(e) => {
                error!(conversation=%self.conversation_id, error=%e, "failed to delete conversation");
                first_err = Some(e);
            }
        }

        match backend.delete_agent_version(&self.agent).await {
            Ok(()) => writeln!(out, "Agent deleted")?,
            Err(e) => {
                error!(agent=%self.agent.name, version=%self.agent.version, error=%e, "failed to delete agent version");
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }

        match first_err {
            Some(e) => Err(e).context("clean up session"),
            None => Ok(()),
        }
    }
}

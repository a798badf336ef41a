use tracing::info;

use crate::llm::types::{AgentVersion, CreateAgentVersionRequest, PromptAgentDefinition};
use crate::llm::{ApiError, ProjectClient};

impl ProjectClient {
    /// Create (or add a version to) the named prompt agent.
    pub async fn create_agent_version(
        &self,
        name: &str,
        definition: &PromptAgentDefinition,
    ) -> Result<AgentVersion, ApiError> {
        let path = format!("agents/{name}/versions");
        let agent: AgentVersion = self
            .post_json(&path, &CreateAgentVersionRequest { definition })
            .await?;
        info!(name=%agent.name, version=%agent.version, "agent version created");
        Ok(agent)
    }

    pub async fn delete_agent_version(&self, agent: &AgentVersion) -> Result<(), ApiError> {
        let path = format!("agents/{}/versions/{}", agent.name, agent.version);
        self.delete(&path).await?;
        info!(name=%agent.name, version=%agent.version, "agent version deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenCredential;
    use crate::llm::types::FunctionTool;
    use httptest::{Expectation, Server, matchers::*, responders::*};
    use serde_json::json;
    use std::sync::Arc;

    fn client(server: &Server) -> ProjectClient {
        ProjectClient::new(
            server.url_str(""),
            Arc::new(StaticTokenCredential::new("t")),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn create_agent_version_posts_prompt_definition() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/agents/support-agent/versions"),
                request::body(json_decoded(eq(json!({
                    "definition": {
                        "kind": "prompt",
                        "model": "gpt-4o",
                        "instructions": "help",
                        "tools": [{
                            "type": "function",
                            "name": "noop",
                            "description": "does nothing",
                            "parameters": {"type": "object", "properties": {}},
                            "strict": true
                        }]
                    }
                })))),
            ])
            .respond_with(json_encoded(json!({
                "object": "agent.version",
                "name": "support-agent",
                "version": "1"
            }))),
        );

        let definition = PromptAgentDefinition::new(
            "gpt-4o",
            "help",
            vec![FunctionTool {
                kind: "function".into(),
                name: "noop".into(),
                description: "does nothing".into(),
                parameters: json!({"type": "object", "properties": {}}),
                strict: true,
            }],
        );
        let agent = client(&server)
            .create_agent_version("support-agent", &definition)
            .await
            .unwrap();
        assert_eq!(
            agent,
            AgentVersion {
                name: "support-agent".into(),
                version: "1".into()
            }
        );
    }

    #[tokio::test]
    async fn delete_agent_version_targets_name_and_version() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "DELETE",
                "/agents/support-agent/versions/4",
            ))
            .respond_with(json_encoded(json!({"deleted": true}))),
        );
        let agent = AgentVersion {
            name: "support-agent".into(),
            version: "4".into(),
        };
        client(&server).delete_agent_version(&agent).await.unwrap();
    }
}

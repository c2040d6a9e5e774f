//! A chat session: one agent and one thread shared by consecutive turns.

use tracing::{debug, info};

use crate::agents::AgentDefinition;
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::tools::list_tool_descriptors;

use super::runner::TurnOrchestrator;
use super::types::TurnOutcome;

/// Owns the agent and thread created at startup and runs turns against them.
pub struct ChatSession {
    orchestrator: TurnOrchestrator,
    agent_id: String,
    thread_id: String,
}

impl ChatSession {
    /// Describe the provider's tools to a new agent and open a thread for it.
    pub async fn start(orchestrator: TurnOrchestrator, config: &RelayConfig) -> Result<Self, RelayError> {
        let tools = list_tool_descriptors(orchestrator.dispatcher().provider().as_ref()).await?;
        let definition = AgentDefinition {
            model: config.model_deployment.clone(),
            name: config.agent_name.clone(),
            instructions: config.instructions.clone(),
            tools,
        };

        let agent_id = orchestrator.service().create_agent(&definition).await?;
        let thread_id = orchestrator.service().create_thread().await?;
        info!(
            agent_id = %agent_id,
            thread_id = %thread_id,
            tools = definition.tools.len(),
            "chat session started"
        );

        Ok(Self {
            orchestrator,
            agent_id,
            thread_id,
        })
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// Run one turn. Failures are reported in the outcome; the session stays usable.
    pub async fn send(&self, input: &str) -> TurnOutcome {
        debug!(thread_id = %self.thread_id, "starting turn");
        self.orchestrator
            .run_turn(&self.agent_id, &self.thread_id, input)
            .await
    }
}

//! Agent run service: agents, threads, and streaming runs.

pub mod http;
pub mod sse;

pub use http::HttpAgentRunService;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::RelayError;
use crate::tools::ToolDescriptor;

/// Everything needed to create an agent.
#[derive(Debug, Clone)]
pub struct AgentDefinition {
    pub model: String,
    pub name: String,
    pub instructions: String,
    pub tools: Vec<ToolDescriptor>,
}

/// Author of a thread message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Address of a run, as required by the resume endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRef {
    pub thread_id: String,
    pub run_id: String,
}

impl RunRef {
    pub fn new(thread_id: impl Into<String>, run_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            run_id: run_id.into(),
        }
    }
}

/// Approval decision for one tool call awaiting sign-off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolApproval {
    pub tool_call_id: String,
    pub approve: bool,
}

/// Output for one tool call the run is waiting on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}

/// One undecoded item from a run stream: the SSE event name and its JSON payload.
///
/// Required-action notifications arrive here already split to one item per tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRunEvent {
    pub event: String,
    pub data: serde_json::Value,
}

impl RawRunEvent {
    pub fn new(event: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }
}

/// Stream of raw run events. It ends once the service has sent everything for the
/// current phase; an `Err` item means the transport broke.
pub type RunEventStream = BoxStream<'static, Result<RawRunEvent, RelayError>>;

/// Remote service that hosts agents and executes runs.
#[async_trait]
pub trait AgentRunService: Send + Sync {
    async fn create_agent(&self, definition: &AgentDefinition) -> Result<String, RelayError>;

    async fn create_thread(&self) -> Result<String, RelayError>;

    async fn post_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        text: &str,
    ) -> Result<String, RelayError>;

    async fn start_run_stream(
        &self,
        thread_id: &str,
        agent_id: &str,
    ) -> Result<RunEventStream, RelayError>;

    /// Submit approvals and outputs together and continue the run as a new stream.
    async fn resume_run_stream(
        &self,
        run: &RunRef,
        approvals: &[ToolApproval],
        outputs: &[ToolOutput],
    ) -> Result<RunEventStream, RelayError>;
}

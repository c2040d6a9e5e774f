//! Shared test helpers: a scripted agent run service and run event builders.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::{json, Value};

use mcp_relay::agent_loop::{TurnEvent, TurnEventSink};
use mcp_relay::agents::{
    AgentDefinition, AgentRunService, MessageRole, RawRunEvent, RunEventStream, RunRef,
    ToolApproval, ToolOutput,
};
use mcp_relay::error::RelayError;

pub type ScriptedPass = Vec<Result<RawRunEvent, RelayError>>;

/// One recorded resume call.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeCall {
    pub run: RunRef,
    pub approvals: Vec<ToolApproval>,
    pub outputs: Vec<ToolOutput>,
}

/// Agent run service that replays one scripted pass per stream request.
///
/// The first pass answers `start_run_stream`; each later pass answers one
/// `resume_run_stream`. Once the script runs out, streams are empty.
#[derive(Default)]
pub struct ScriptedRunService {
    passes: Mutex<Vec<ScriptedPass>>,
    pub messages: Mutex<Vec<(String, MessageRole, String)>>,
    pub agents: Mutex<Vec<AgentDefinition>>,
    pub resumes: Mutex<Vec<ResumeCall>>,
    pub runs_started: Mutex<usize>,
}

impl ScriptedRunService {
    pub fn new(passes: Vec<ScriptedPass>) -> Arc<Self> {
        let service = Self::default();
        service.queue(passes);
        Arc::new(service)
    }

    /// Append passes for a later turn.
    pub fn queue(&self, passes: Vec<ScriptedPass>) {
        let mut queued = self.passes.lock().unwrap();
        let mut all: Vec<ScriptedPass> = queued.drain(..).rev().collect();
        all.extend(passes);
        *queued = all.into_iter().rev().collect();
    }

    pub fn resumes(&self) -> Vec<ResumeCall> {
        self.resumes.lock().unwrap().clone()
    }

    fn next_stream(&self) -> RunEventStream {
        let pass = self.passes.lock().unwrap().pop().unwrap_or_default();
        stream::iter(pass).boxed()
    }
}

#[async_trait]
impl AgentRunService for ScriptedRunService {
    async fn create_agent(&self, definition: &AgentDefinition) -> Result<String, RelayError> {
        self.agents.lock().unwrap().push(definition.clone());
        Ok("asst_1".into())
    }

    async fn create_thread(&self) -> Result<String, RelayError> {
        Ok("thread_1".into())
    }

    async fn post_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        text: &str,
    ) -> Result<String, RelayError> {
        self.messages
            .lock()
            .unwrap()
            .push((thread_id.to_string(), role, text.to_string()));
        Ok("msg_1".into())
    }

    async fn start_run_stream(
        &self,
        _thread_id: &str,
        _agent_id: &str,
    ) -> Result<RunEventStream, RelayError> {
        *self.runs_started.lock().unwrap() += 1;
        Ok(self.next_stream())
    }

    async fn resume_run_stream(
        &self,
        run: &RunRef,
        approvals: &[ToolApproval],
        outputs: &[ToolOutput],
    ) -> Result<RunEventStream, RelayError> {
        self.resumes.lock().unwrap().push(ResumeCall {
            run: run.clone(),
            approvals: approvals.to_vec(),
            outputs: outputs.to_vec(),
        });
        Ok(self.next_stream())
    }
}

/// Sink that records every turn event.
pub fn recording_sink() -> (TurnEventSink, Arc<Mutex<Vec<TurnEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let captured = events.clone();
    let sink: TurnEventSink = Arc::new(move |event| captured.lock().unwrap().push(event));
    (sink, events)
}

fn event(name: &str, data: Value) -> Result<RawRunEvent, RelayError> {
    Ok(RawRunEvent::new(name, data))
}

pub fn run_created() -> Result<RawRunEvent, RelayError> {
    event(
        "thread.run.created",
        json!({"id": "run_1", "thread_id": "thread_1", "status": "queued"}),
    )
}

pub fn text_delta(text: &str) -> Result<RawRunEvent, RelayError> {
    event(
        "thread.message.delta",
        json!({"id": "msg_2", "delta": {"content": [{"index": 0, "type": "text", "text": {"value": text}}]}}),
    )
}

pub fn run_completed() -> Result<RawRunEvent, RelayError> {
    event(
        "thread.run.completed",
        json!({"id": "run_1", "thread_id": "thread_1", "status": "completed"}),
    )
}

pub fn run_failed(message: &str) -> Result<RawRunEvent, RelayError> {
    event(
        "thread.run.failed",
        json!({"id": "run_1", "thread_id": "thread_1", "last_error": {"code": "rate_limit_exceeded", "message": message}}),
    )
}

pub fn tool_output_request(call_id: &str, function: &str) -> Result<RawRunEvent, RelayError> {
    event(
        "thread.run.requires_action",
        json!({
            "id": "run_1",
            "thread_id": "thread_1",
            "required_action_type": "submit_tool_outputs",
            "tool_call": {"id": call_id, "type": "function", "function": {"name": function, "arguments": "{}"}}
        }),
    )
}

pub fn approval_request(call_id: &str, tool: &str, arguments: &str) -> Result<RawRunEvent, RelayError> {
    event(
        "thread.run.requires_action",
        json!({
            "id": "run_1",
            "thread_id": "thread_1",
            "required_action_type": "submit_tool_approval",
            "tool_call": {"id": call_id, "type": "mcp", "name": tool, "arguments": arguments, "server_label": "inventory"}
        }),
    )
}

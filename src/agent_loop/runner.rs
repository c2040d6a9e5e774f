//! Turn orchestration: stream passes, tool dispatch, and resubmission.

use std::sync::Arc;

use futures::StreamExt;
use serde_json::json;
use tracing::{debug, warn};

use crate::agents::{AgentRunService, MessageRole, RunEventStream, RunRef, ToolApproval, ToolOutput};
use crate::error::RelayError;
use crate::tools::{ToolArguments, ToolDispatcher};

use super::approvals::{AllowAll, ApprovalDecision, ApprovalPolicy};
use super::events::{classify, StreamEvent};
use super::pending::PendingWork;
use super::types::{TurnOptions, TurnOutcome, TurnState, TurnStatus, UnresolvedCallPolicy};

/// Callback used for observing a turn as it progresses.
pub type TurnEventSink = Arc<dyn Fn(TurnEvent) + Send + Sync>;

/// Progress notifications emitted while a turn runs.
#[derive(Debug, Clone)]
pub enum TurnEvent {
    StateChanged(TurnState),
    Stream(StreamEvent),
    ApprovalDecided {
        call_id: String,
        tool_name: String,
        arguments: ToolArguments,
        decision: ApprovalDecision,
    },
    ToolOutputReady {
        call_id: String,
        function_name: String,
        is_error: bool,
    },
    ToolUnresolved {
        call_id: String,
        function_name: String,
    },
    Resubmitting {
        approvals: usize,
        outputs: usize,
    },
    Finished(TurnOutcome),
}

/// Drives one user turn against an agent run service until the run is terminal.
pub struct TurnOrchestrator {
    service: Arc<dyn AgentRunService>,
    dispatcher: ToolDispatcher,
    approval_policy: Arc<dyn ApprovalPolicy>,
    options: TurnOptions,
    event_sink: Option<TurnEventSink>,
}

#[derive(Debug, Default)]
struct PassSummary {
    completed: bool,
    error: Option<String>,
    events: usize,
}

impl TurnOrchestrator {
    pub fn new(service: Arc<dyn AgentRunService>, dispatcher: ToolDispatcher) -> Self {
        Self {
            service,
            dispatcher,
            approval_policy: Arc::new(AllowAll),
            options: TurnOptions::default(),
            event_sink: None,
        }
    }

    pub fn with_approval_policy(mut self, policy: Arc<dyn ApprovalPolicy>) -> Self {
        self.approval_policy = policy;
        self
    }

    pub fn with_options(mut self, options: TurnOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_event_sink(mut self, sink: TurnEventSink) -> Self {
        self.event_sink = Some(sink);
        self
    }

    pub fn service(&self) -> &Arc<dyn AgentRunService> {
        &self.service
    }

    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }

    pub fn options(&self) -> TurnOptions {
        self.options
    }

    /// Post `input` to the thread and run the agent until the turn is terminal.
    ///
    /// Transport and service failures end the turn as [`TurnStatus::Errored`]; they
    /// never poison the orchestrator, so the next turn can start normally.
    pub async fn run_turn(&self, agent_id: &str, thread_id: &str, input: &str) -> TurnOutcome {
        self.emit(TurnEvent::StateChanged(TurnState::Running));

        let mut stream = match self.open_run(agent_id, thread_id, input).await {
            Ok(stream) => stream,
            Err(err) => return self.finish(TurnStatus::errored(err.to_string()), 0, 0),
        };

        let mut pending = PendingWork::new();
        let mut run: Option<RunRef> = None;
        let mut passes = 0usize;
        let mut resume_calls = 0usize;

        loop {
            passes += 1;
            let summary = self.drain_pass(stream, &mut pending, &mut run).await;
            debug!(
                pass = passes,
                events = summary.events,
                completed = summary.completed,
                approvals = pending.approvals().len(),
                outputs = pending.outputs().len(),
                "run pass drained"
            );
            self.emit(TurnEvent::StateChanged(TurnState::AwaitingResubmission));

            if let Some(message) = summary.error {
                return self.finish(TurnStatus::errored(message), passes, resume_calls);
            }
            if pending.is_empty() {
                let status = if summary.completed {
                    TurnStatus::Completed
                } else {
                    TurnStatus::Incomplete
                };
                return self.finish(status, passes, resume_calls);
            }
            if passes >= self.options.max_passes {
                return self.finish(
                    TurnStatus::errored(format!("turn exceeded {} passes", self.options.max_passes)),
                    passes,
                    resume_calls,
                );
            }
            let Some(run_ref) = run.clone() else {
                return self.finish(
                    TurnStatus::errored("run requested tool work without identifying itself"),
                    passes,
                    resume_calls,
                );
            };

            let (approvals, outputs) = pending.take();
            self.emit(TurnEvent::Resubmitting {
                approvals: approvals.len(),
                outputs: outputs.len(),
            });
            debug!(
                run_id = %run_ref.run_id,
                approvals = approvals.len(),
                outputs = outputs.len(),
                "resubmitting run"
            );
            resume_calls += 1;
            stream = match self
                .service
                .resume_run_stream(&run_ref, &approvals, &outputs)
                .await
            {
                Ok(stream) => stream,
                Err(err) => {
                    return self.finish(TurnStatus::errored(err.to_string()), passes, resume_calls)
                }
            };
            self.emit(TurnEvent::StateChanged(TurnState::Running));
        }
    }

    async fn open_run(
        &self,
        agent_id: &str,
        thread_id: &str,
        input: &str,
    ) -> Result<RunEventStream, RelayError> {
        self.service
            .post_message(thread_id, MessageRole::User, input)
            .await?;
        self.service.start_run_stream(thread_id, agent_id).await
    }

    /// Consume one stream to its end, recording approvals and outputs.
    async fn drain_pass(
        &self,
        mut stream: RunEventStream,
        pending: &mut PendingWork,
        run: &mut Option<RunRef>,
    ) -> PassSummary {
        let mut summary = PassSummary::default();

        while let Some(item) = stream.next().await {
            summary.events += 1;
            let event = match item {
                Ok(raw) => classify(raw),
                Err(err) => {
                    warn!(error = %err, "run stream failed");
                    let event = StreamEvent::RunErrored {
                        message: err.to_string(),
                    };
                    self.emit(TurnEvent::Stream(event));
                    summary.error.get_or_insert_with(|| err.to_string());
                    break;
                }
            };
            self.emit(TurnEvent::Stream(event.clone()));

            match event {
                StreamEvent::RunCreated { run: created } => {
                    *run = Some(created);
                }
                StreamEvent::ApprovalRequest {
                    run: requested,
                    call_id,
                    tool_name,
                    arguments,
                } => {
                    remember_run(run, requested);
                    let decision = self.approval_policy.decide(&tool_name, &arguments).await;
                    pending.record_approval(ToolApproval {
                        tool_call_id: call_id.clone(),
                        approve: decision.is_approved(),
                    });
                    self.emit(TurnEvent::ApprovalDecided {
                        call_id,
                        tool_name,
                        arguments,
                        decision,
                    });
                }
                StreamEvent::ToolOutputRequest {
                    run: requested,
                    call_id,
                    function_name,
                    arguments,
                } => {
                    remember_run(run, requested);
                    match self
                        .resolve_output(&call_id, &function_name, &arguments)
                        .await
                    {
                        Some(output) => pending.record_output(output),
                        None => pending.forget(&call_id),
                    }
                }
                StreamEvent::RunCompleted => summary.completed = true,
                StreamEvent::RunErrored { message } => {
                    summary.error.get_or_insert(message);
                }
                StreamEvent::ContentDelta { .. } | StreamEvent::StepProgress(_) => {}
            }
        }

        summary
    }

    async fn resolve_output(
        &self,
        call_id: &str,
        function_name: &str,
        arguments: &ToolArguments,
    ) -> Option<ToolOutput> {
        let (output, is_error) = match self.dispatcher.invoke(function_name, arguments).await {
            Ok(text) => (text, false),
            Err(RelayError::ToolNotFound(name)) => {
                warn!(call_id, tool = %name, "no tool provider lists the requested function");
                self.emit(TurnEvent::ToolUnresolved {
                    call_id: call_id.to_string(),
                    function_name: function_name.to_string(),
                });
                match self.options.unresolved_calls {
                    UnresolvedCallPolicy::Omit => return None,
                    UnresolvedCallPolicy::Report => (
                        json!({ "error": format!("tool '{name}' not found") }).to_string(),
                        true,
                    ),
                }
            }
            Err(err) => {
                warn!(call_id, tool = function_name, error = %err, "tool call failed");
                (json!({ "error": err.to_string() }).to_string(), true)
            }
        };

        self.emit(TurnEvent::ToolOutputReady {
            call_id: call_id.to_string(),
            function_name: function_name.to_string(),
            is_error,
        });
        Some(ToolOutput {
            tool_call_id: call_id.to_string(),
            output,
        })
    }

    fn finish(&self, status: TurnStatus, passes: usize, resume_calls: usize) -> TurnOutcome {
        let state = match status {
            TurnStatus::Errored { .. } => TurnState::Errored,
            TurnStatus::Completed | TurnStatus::Incomplete => TurnState::Completed,
        };
        let outcome = TurnOutcome::new(status, passes, resume_calls);
        debug!(status = ?outcome.status, passes, resume_calls, "turn finished");
        self.emit(TurnEvent::StateChanged(state));
        self.emit(TurnEvent::Finished(outcome.clone()));
        outcome
    }

    fn emit(&self, event: TurnEvent) {
        let Some(sink) = &self.event_sink else {
            return;
        };
        (sink)(event);
    }
}

/// Requests carry the authoritative run address; empty ids leave the known one in place.
fn remember_run(run: &mut Option<RunRef>, requested: RunRef) {
    if !requested.run_id.is_empty() {
        *run = Some(requested);
    }
}

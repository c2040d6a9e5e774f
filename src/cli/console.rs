//! Console rendering of turn progress.

use std::io::Write;
use std::sync::Arc;

use crate::agent_loop::{ApprovalDecision, StepActivity, StreamEvent, TurnEvent, TurnEventSink, TurnStatus};

pub const RUN_STARTED: &str = "--- Run Started! ---";
pub const RUN_COMPLETED: &str = "--- Run Completed! ---";

/// Text to print for a turn event, if it has a console representation.
pub fn render(event: &TurnEvent) -> Option<String> {
    match event {
        TurnEvent::Stream(StreamEvent::RunCreated { .. }) => Some(format!("{RUN_STARTED}\n")),
        TurnEvent::Stream(StreamEvent::ContentDelta { text }) if !text.is_empty() => {
            Some(text.clone())
        }
        TurnEvent::Stream(StreamEvent::StepProgress(step)) if !step.activities.is_empty() => {
            Some(step.activities.iter().map(render_activity).collect())
        }
        TurnEvent::Stream(StreamEvent::RunCompleted) => Some(format!("\n{RUN_COMPLETED}\n")),
        TurnEvent::ApprovalDecided {
            tool_name,
            arguments,
            decision,
            ..
        } => {
            let verb = match decision {
                ApprovalDecision::Approve => "Approving",
                ApprovalDecision::Deny => "Denying",
            };
            Some(format!(
                "{verb} MCP tool call: {tool_name}, Arguments: {arguments}\n"
            ))
        }
        TurnEvent::Finished(outcome) => match &outcome.status {
            TurnStatus::Errored { message } => Some(format!("Error: {message}\n")),
            TurnStatus::Completed | TurnStatus::Incomplete => None,
        },
        _ => None,
    }
}

fn render_activity(activity: &StepActivity) -> String {
    let mut out = format!(
        "The function {} with description \"{}\" will be called.\n",
        activity.function,
        activity.description.as_deref().unwrap_or_default()
    );
    if activity.parameters.is_empty() {
        out.push_str("This function has no parameters\n");
        return out;
    }

    out.push_str("Function parameters:\n");
    for param in &activity.parameters {
        out.push_str(&format!("\t{}\n", param.name));
        out.push_str(&format!(
            "\t\tType: {}\n",
            param.kind.as_deref().unwrap_or("unknown")
        ));
        if let Some(description) = param.description.as_deref().filter(|d| !d.is_empty()) {
            out.push_str(&format!("\t\tDescription: {description}\n"));
        }
    }
    out
}

/// Sink that writes rendered events to stdout as they arrive.
pub fn console_sink() -> TurnEventSink {
    Arc::new(|event: TurnEvent| {
        let Some(text) = render(&event) else {
            return;
        };
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    })
}

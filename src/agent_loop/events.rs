//! Run event classification.
//!
//! Every raw item of a run stream maps to exactly one [`StreamEvent`]. Kinds this
//! module does not know become [`StreamEvent::StepProgress`] with the payload kept.

use serde_json::Value;

use crate::agents::{RawRunEvent, RunRef};
use crate::tools::ToolArguments;

const APPROVAL_ACTION: &str = "submit_tool_approval";
const OUTPUT_ACTION: &str = "submit_tool_outputs";

/// A classified run stream event.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    RunCreated {
        run: RunRef,
    },
    ContentDelta {
        text: String,
    },
    /// The run wants sign-off before the service executes a tool itself.
    ApprovalRequest {
        run: RunRef,
        call_id: String,
        tool_name: String,
        arguments: ToolArguments,
    },
    /// The run wants the client to execute a function and return its output.
    ToolOutputRequest {
        run: RunRef,
        call_id: String,
        function_name: String,
        arguments: ToolArguments,
    },
    StepProgress(StepProgress),
    RunCompleted,
    RunErrored {
        message: String,
    },
}

/// Progress of a run step, or any event kind without a dedicated variant.
#[derive(Debug, Clone, PartialEq)]
pub struct StepProgress {
    pub kind: String,
    /// Functions the step announces it will call.
    pub activities: Vec<StepActivity>,
    pub raw: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepActivity {
    pub function: String,
    pub description: Option<String>,
    pub parameters: Vec<ActivityParameter>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityParameter {
    pub name: String,
    pub kind: Option<String>,
    pub description: Option<String>,
}

/// Classify one raw run event.
pub fn classify(raw: RawRunEvent) -> StreamEvent {
    let RawRunEvent { event, data } = raw;
    match event.as_str() {
        "thread.run.created" => StreamEvent::RunCreated {
            run: run_ref(&data),
        },
        "thread.message.delta" => StreamEvent::ContentDelta {
            text: delta_text(&data),
        },
        "thread.run.requires_action" => classify_required_action(event.clone(), data),
        "thread.run.completed" => StreamEvent::RunCompleted,
        "thread.run.failed" => StreamEvent::RunErrored {
            message: str_at(&data, &["last_error", "message"])
                .unwrap_or("run failed")
                .to_string(),
        },
        "thread.run.cancelled" => StreamEvent::RunErrored {
            message: "run cancelled".into(),
        },
        "thread.run.expired" => StreamEvent::RunErrored {
            message: "run expired".into(),
        },
        "error" => StreamEvent::RunErrored {
            message: error_message(&data),
        },
        kind if kind.starts_with("thread.run.step.") => StreamEvent::StepProgress(StepProgress {
            activities: step_activities(&data),
            kind: event.clone(),
            raw: data,
        }),
        _ => unrecognized(event.clone(), data),
    }
}

fn classify_required_action(event: String, data: Value) -> StreamEvent {
    let Some(call) = data.get("tool_call") else {
        return unrecognized(event, data);
    };
    let call_id = call.get("id").and_then(Value::as_str).unwrap_or_default();
    // Function calls nest name/arguments under "function"; approval calls carry them inline.
    let target = call.get("function").unwrap_or(call);
    let name = target.get("name").and_then(Value::as_str).unwrap_or_default();
    let arguments = target
        .get("arguments")
        .cloned()
        .map(ToolArguments::new)
        .unwrap_or_default();

    match data.get("required_action_type").and_then(Value::as_str) {
        Some(APPROVAL_ACTION) => StreamEvent::ApprovalRequest {
            run: run_ref(&data),
            call_id: call_id.to_string(),
            tool_name: name.to_string(),
            arguments,
        },
        Some(OUTPUT_ACTION) => StreamEvent::ToolOutputRequest {
            run: run_ref(&data),
            call_id: call_id.to_string(),
            function_name: name.to_string(),
            arguments,
        },
        _ => unrecognized(event, data),
    }
}

fn unrecognized(kind: String, raw: Value) -> StreamEvent {
    StreamEvent::StepProgress(StepProgress {
        kind,
        activities: Vec::new(),
        raw,
    })
}

fn run_ref(data: &Value) -> RunRef {
    RunRef::new(
        str_at(data, &["thread_id"]).unwrap_or_default(),
        str_at(data, &["id"]).unwrap_or_default(),
    )
}

fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(value, |v, key| v.get(key))
        .and_then(Value::as_str)
}

fn delta_text(data: &Value) -> String {
    let Some(parts) = data
        .get("delta")
        .and_then(|d| d.get("content"))
        .and_then(Value::as_array)
    else {
        return String::new();
    };

    parts
        .iter()
        .filter_map(|part| str_at(part, &["text", "value"]))
        .collect()
}

fn error_message(data: &Value) -> String {
    if let Some(text) = data.as_str() {
        return text.to_string();
    }
    str_at(data, &["error", "message"])
        .or_else(|| str_at(data, &["message"]))
        .map(str::to_string)
        .unwrap_or_else(|| data.to_string())
}

fn step_activities(data: &Value) -> Vec<StepActivity> {
    let Some(activities) = data
        .get("step_details")
        .filter(|d| str_at(d, &["type"]) == Some("activities"))
        .and_then(|d| d.get("activities"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    activities
        .iter()
        .filter_map(|activity| activity.get("tools").and_then(Value::as_object))
        .flat_map(|tools| tools.iter())
        .map(|(name, function)| StepActivity {
            function: name.clone(),
            description: str_at(function, &["description"]).map(str::to_string),
            parameters: function
                .get("parameters")
                .and_then(|p| p.get("properties"))
                .and_then(Value::as_object)
                .map(|props| {
                    props
                        .iter()
                        .map(|(arg, schema)| ActivityParameter {
                            name: arg.clone(),
                            kind: str_at(schema, &["type"]).map(str::to_string),
                            description: str_at(schema, &["description"]).map(str::to_string),
                        })
                        .collect()
                })
                .unwrap_or_default(),
        })
        .collect()
}

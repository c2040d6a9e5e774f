//! Server-sent event framing for run streams.

use super::RawRunEvent;

/// Terminating event name sent after the last frame of a phase.
pub const DONE_EVENT: &str = "done";
const DONE_DATA: &str = "[DONE]";
const REQUIRES_ACTION_EVENT: &str = "thread.run.requires_action";

/// One dispatched SSE frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

impl SseFrame {
    pub fn is_done(&self) -> bool {
        self.event.as_deref() == Some(DONE_EVENT) || self.data.trim() == DONE_DATA
    }
}

/// Incremental decoder; feed it byte chunks as they arrive.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every frame completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();

        while let Some(line_end) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=line_end).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(frame) = self.accept_line(line) {
                frames.push(frame);
            }
        }

        frames
    }

    /// Flush a trailing frame that was not followed by a blank line.
    pub fn finish(&mut self) -> Option<SseFrame> {
        if !self.buffer.is_empty() {
            let raw = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&raw).trim_end_matches('\r').to_string();
            if let Some(frame) = self.accept_line(&line) {
                return Some(frame);
            }
        }
        self.dispatch()
    }

    fn accept_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        if self.event.is_none() && self.data.is_empty() {
            return None;
        }
        Some(SseFrame {
            event: self.event.take(),
            data: std::mem::take(&mut self.data).join("\n"),
        })
    }
}

/// What a frame means to the run stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Events(Vec<RawRunEvent>),
    Done,
}

/// Turn a frame into raw run events, splitting required actions per tool call.
pub fn decode_frame(frame: SseFrame) -> Decoded {
    if frame.is_done() {
        return Decoded::Done;
    }

    let event = frame.event.unwrap_or_else(|| "message".to_string());
    let data = serde_json::from_str::<serde_json::Value>(&frame.data)
        .unwrap_or(serde_json::Value::String(frame.data));

    if event == REQUIRES_ACTION_EVENT {
        if let Some(split) = split_required_action(&data) {
            return Decoded::Events(
                split
                    .into_iter()
                    .map(|data| RawRunEvent::new(REQUIRES_ACTION_EVENT, data))
                    .collect(),
            );
        }
    }

    Decoded::Events(vec![RawRunEvent::new(event, data)])
}

/// `{id, thread_id, required_action: {type, <type>: {tool_calls: [...]}}}` becomes one
/// `{id, thread_id, required_action_type, tool_call}` payload per call.
fn split_required_action(run: &serde_json::Value) -> Option<Vec<serde_json::Value>> {
    let action = run.get("required_action")?;
    let action_type = action.get("type")?.as_str()?;
    let calls = action.get(action_type)?.get("tool_calls")?.as_array()?;
    if calls.is_empty() {
        return None;
    }

    Some(
        calls
            .iter()
            .map(|call| {
                serde_json::json!({
                    "id": run.get("id").cloned().unwrap_or_default(),
                    "thread_id": run.get("thread_id").cloned().unwrap_or_default(),
                    "required_action_type": action_type,
                    "tool_call": call,
                })
            })
            .collect(),
    )
}

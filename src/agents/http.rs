//! HTTP + SSE client for an assistants-style agents REST API.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;

use super::sse::{decode_frame, Decoded, SseDecoder};
use super::{
    AgentDefinition, AgentRunService, MessageRole, RunEventStream, RunRef, ToolApproval,
    ToolOutput,
};
use crate::config::RelayConfig;
use crate::error::RelayError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Agent run service reached over HTTPS with a bearer token.
pub struct HttpAgentRunService {
    client: reqwest::Client,
    endpoint: String,
    api_version: String,
    access_token: String,
}

impl HttpAgentRunService {
    pub fn new(config: &RelayConfig) -> Result<Self, RelayError> {
        // No overall request timeout: run streams stay open for as long as the run works.
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: reqwest::Client, config: &RelayConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            access_token: config.access_token.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}?api-version={}",
            self.endpoint, path, self.api_version
        )
    }

    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, RelayError> {
        let resp = self
            .client
            .post(self.url(path))
            .headers(bearer_headers(&self.access_token))
            .json(body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let text = resp.text().await?;
        if !(200..300).contains(&status) {
            return Err(status_to_error(status, &text));
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn post_created_id(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<String, RelayError> {
        let value = self.post_json(path, body).await?;
        value
            .get("id")
            .and_then(|id| id.as_str())
            .map(str::to_string)
            .ok_or_else(|| RelayError::Provider {
                provider: "agents".into(),
                message: format!("{path}: response has no id"),
            })
    }

    async fn post_stream(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<RunEventStream, RelayError> {
        let mut headers = bearer_headers(&self.access_token);
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));

        let resp = self
            .client
            .post(self.url(path))
            .headers(headers)
            .json(body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        Ok(sse_run_stream(resp.bytes_stream()))
    }
}

#[async_trait]
impl AgentRunService for HttpAgentRunService {
    async fn create_agent(&self, definition: &AgentDefinition) -> Result<String, RelayError> {
        let tools: Vec<serde_json::Value> = definition
            .tools
            .iter()
            .map(|tool| tool.to_function_tool())
            .collect();
        let tool_count = tools.len();
        let body = serde_json::json!({
            "model": definition.model,
            "name": definition.name,
            "instructions": definition.instructions,
            "tools": tools,
        });
        let id = self.post_created_id("assistants", &body).await?;
        debug!(agent_id = %id, tools = tool_count, "agent created");
        Ok(id)
    }

    async fn create_thread(&self) -> Result<String, RelayError> {
        let id = self
            .post_created_id("threads", &serde_json::json!({}))
            .await?;
        debug!(thread_id = %id, "thread created");
        Ok(id)
    }

    async fn post_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        text: &str,
    ) -> Result<String, RelayError> {
        let body = serde_json::json!({
            "role": role.as_str(),
            "content": text,
        });
        self.post_created_id(&format!("threads/{thread_id}/messages"), &body)
            .await
    }

    async fn start_run_stream(
        &self,
        thread_id: &str,
        agent_id: &str,
    ) -> Result<RunEventStream, RelayError> {
        let body = serde_json::json!({
            "assistant_id": agent_id,
            "stream": true,
        });
        self.post_stream(&format!("threads/{thread_id}/runs"), &body)
            .await
    }

    async fn resume_run_stream(
        &self,
        run: &RunRef,
        approvals: &[ToolApproval],
        outputs: &[ToolOutput],
    ) -> Result<RunEventStream, RelayError> {
        let mut body = serde_json::json!({
            "tool_outputs": outputs,
            "stream": true,
        });
        if !approvals.is_empty() {
            body["tool_approvals"] = serde_json::to_value(approvals)?;
        }
        self.post_stream(
            &format!(
                "threads/{}/runs/{}/submit_tool_outputs",
                run.thread_id, run.run_id
            ),
            &body,
        )
        .await
    }
}

/// Decode an SSE byte stream into raw run events.
///
/// The stream must end with the service's `done` frame; ending without it is reported
/// as a transport error so the turn does not mistake a dropped connection for a drained
/// phase.
pub fn sse_run_stream<S, B, E>(byte_stream: S) -> RunEventStream
where
    S: futures::Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<RelayError> + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut decoder = SseDecoder::new();
        let mut done = false;
        let mut failed = false;
        futures::pin_mut!(byte_stream);

        'read: while let Some(chunk_result) = byte_stream.next().await {
            let chunk = match chunk_result {
                Ok(c) => c,
                Err(e) => {
                    yield Err(e.into());
                    failed = true;
                    break;
                }
            };

            for frame in decoder.push(chunk.as_ref()) {
                match decode_frame(frame) {
                    Decoded::Done => {
                        done = true;
                        break 'read;
                    }
                    Decoded::Events(events) => {
                        for event in events {
                            yield Ok(event);
                        }
                    }
                }
            }
        }

        if !done && !failed {
            if let Some(frame) = decoder.finish() {
                match decode_frame(frame) {
                    Decoded::Done => done = true,
                    Decoded::Events(events) => {
                        for event in events {
                            yield Ok(event);
                        }
                    }
                }
            }
            if !done {
                yield Err(RelayError::Stream(
                    "run stream closed before the service signalled completion".into(),
                ));
            }
        }
    };

    Box::pin(stream)
}

/// Build default headers for a Bearer-token API.
fn bearer_headers(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {token}")) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// Map a non-success HTTP status to an error, preferring the service's own message.
fn status_to_error(status: u16, body: &str) -> RelayError {
    let message = extract_error_message(body).unwrap_or_else(|| body.to_string());
    match status {
        401 | 403 => RelayError::Authentication(message),
        429 => RelayError::RateLimited {
            retry_after_ms: extract_retry_after(body),
        },
        _ => RelayError::api(status, message),
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

fn extract_retry_after(body: &str) -> Option<u64> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("retry_after"))
                .and_then(|r| r.as_f64())
                .map(|s| (s * 1000.0) as u64)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::RawRunEvent;
    use serde_json::json;

    fn chunks(parts: &[&'static str]) -> Vec<Result<&'static [u8], RelayError>> {
        parts.iter().map(|p| Ok(p.as_bytes())).collect()
    }

    #[tokio::test]
    async fn stream_yields_events_until_done() {
        let body = chunks(&[
            "event: thread.run.created\ndata: {\"id\":\"run_1\",\"thread_id\":\"t\"}\n\n",
            "event: thread.run.completed\ndata: {\"id\":\"run_1\"}\n\n",
            "event: done\ndata: [DONE]\n\n",
            "event: thread.run.created\ndata: {}\n\n",
        ]);
        let events: Vec<_> = sse_run_stream(futures::stream::iter(body)).collect().await;

        assert_eq!(events.len(), 2);
        let first: &RawRunEvent = events[0].as_ref().unwrap();
        assert_eq!(first.event, "thread.run.created");
        assert_eq!(first.data["id"], "run_1");
        assert_eq!(events[1].as_ref().unwrap().event, "thread.run.completed");
    }

    #[tokio::test]
    async fn stream_without_done_ends_with_error() {
        let body = chunks(&["event: thread.run.in_progress\ndata: {}\n\n"]);
        let events: Vec<_> = sse_run_stream(futures::stream::iter(body)).collect().await;

        assert_eq!(events.len(), 2);
        assert!(events[0].is_ok());
        assert!(matches!(&events[1], Err(RelayError::Stream(m)) if m.contains("closed")));
    }

    #[tokio::test]
    async fn transport_error_is_forwarded_once() {
        let body: Vec<Result<&'static [u8], RelayError>> = vec![
            Ok(b"event: thread.run.queued\ndata: {}\n\n"),
            Err(RelayError::Stream("connection reset".into())),
        ];
        let events: Vec<_> = sse_run_stream(futures::stream::iter(body)).collect().await;

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[1], Err(RelayError::Stream(m)) if m == "connection reset"));
    }

    #[test]
    fn status_mapping_uses_service_message() {
        let body = json!({"error": {"code": "unauthorized", "message": "token expired"}}).to_string();
        assert!(matches!(status_to_error(401, &body), RelayError::Authentication(m) if m == "token expired"));
        assert!(matches!(
            status_to_error(429, r#"{"error":{"retry_after":1.5}}"#),
            RelayError::RateLimited { retry_after_ms: Some(1500) }
        ));
        assert!(matches!(
            status_to_error(500, "plain failure"),
            RelayError::Api { status: 500, message } if message == "plain failure"
        ));
    }
}

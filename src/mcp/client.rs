//! MCP client for connecting to MCP servers.

use rmcp::model::{
    CallToolRequestParams, CallToolResult, ClientInfo, Content, JsonObject, ProtocolVersion,
    ResourceContents,
};
use rmcp::service::{ClientInitializeError, ServiceError};
use tracing::{debug, warn};

use crate::error::RelayError;
use crate::tools::{ContentBlock, ProvidedTool, ToolArguments, ToolCallResult};

use super::transport::{MCPRunningService, MCPTransport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MCPConnectionState {
    Disconnected,
    Initialized,
    Closed,
}

/// Client for a Model Context Protocol server.
///
/// Connects lazily on first use and reconnects once when the session drops.
pub struct MCPClient {
    transport: Box<dyn MCPTransport>,
    session: Option<MCPRunningService>,
    state: MCPConnectionState,
}

impl MCPClient {
    pub fn new(transport: Box<dyn MCPTransport>) -> Self {
        Self {
            transport,
            session: None,
            state: MCPConnectionState::Disconnected,
        }
    }

    pub fn connection_state(&self) -> MCPConnectionState {
        self.state
    }

    /// Initialize the MCP connection.
    pub async fn initialize(&mut self) -> Result<(), RelayError> {
        if self.state == MCPConnectionState::Closed {
            return Err(RelayError::Stream("MCP client is closed".into()));
        }
        if let Some(session) = self.session.as_ref() {
            if !session.is_closed() {
                return Ok(());
            }
            self.session = None;
        }

        debug!(server = %self.transport.describe(), "connecting to MCP server");
        let session = self.connect_with_protocol_fallback().await?;
        self.session = Some(session);
        self.state = MCPConnectionState::Initialized;
        Ok(())
    }

    /// List available tools from the MCP server.
    pub async fn list_tools(&mut self) -> Result<Vec<ProvidedTool>, RelayError> {
        self.initialize().await?;

        let tools = match self.list_tools_from_active_session().await {
            Ok(tools) => tools,
            Err(error) if should_reconnect_after_service_error(&error) => {
                warn!(error = %error, "MCP session dropped; reconnecting");
                self.session = None;
                self.initialize().await?;
                self.list_tools_from_active_session()
                    .await
                    .map_err(|retry_error| map_service_error("list_tools", retry_error))?
            }
            Err(error) => return Err(map_service_error("list_tools", error)),
        };

        Ok(tools.into_iter().map(map_mcp_tool).collect())
    }

    /// Execute a tool on the MCP server.
    pub async fn call_tool(
        &mut self,
        name: &str,
        arguments: &ToolArguments,
    ) -> Result<ToolCallResult, RelayError> {
        self.initialize().await?;
        let arguments = arguments.to_object()?;

        let result = match self
            .call_tool_from_active_session(name, arguments.clone())
            .await
        {
            Ok(result) => result,
            Err(error) if should_reconnect_after_service_error(&error) => {
                warn!(error = %error, tool = name, "MCP session dropped; reconnecting");
                self.session = None;
                self.initialize().await?;
                self.call_tool_from_active_session(name, arguments)
                    .await
                    .map_err(|retry_error| map_service_error("call_tool", retry_error))?
            }
            Err(error) => return Err(map_service_error("call_tool", error)),
        };

        Ok(map_call_result(result))
    }

    /// Shut down the session. The client cannot be used afterwards.
    pub async fn close(&mut self) -> Result<(), RelayError> {
        self.state = MCPConnectionState::Closed;
        if let Some(session) = self.session.take() {
            session
                .cancel()
                .await
                .map_err(|e| RelayError::Stream(format!("MCP shutdown failed: {e}")))?;
        }
        Ok(())
    }

    async fn connect_with_protocol_fallback(&mut self) -> Result<MCPRunningService, RelayError> {
        let latest_client_info = ClientInfo {
            protocol_version: ProtocolVersion::LATEST,
            ..Default::default()
        };

        match self.transport.connect(latest_client_info).await {
            Ok(session) => return Ok(session),
            Err(error) if should_retry_protocol_fallback(&error) => {
                debug!("MCP server rejected latest protocol version; retrying with 2024-11-05");
            }
            Err(error) => return Err(map_client_initialize_error(error)),
        }

        let fallback_client_info = ClientInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            ..Default::default()
        };
        self.transport
            .connect(fallback_client_info)
            .await
            .map_err(map_client_initialize_error)
    }

    async fn list_tools_from_active_session(
        &mut self,
    ) -> Result<Vec<rmcp::model::Tool>, ServiceError> {
        let session = self.session.as_mut().ok_or(ServiceError::TransportClosed)?;

        match session.list_all_tools().await {
            Ok(tools) => Ok(tools),
            Err(ServiceError::UnexpectedResponse) => {
                session.list_tools(None).await.map(|page| page.tools)
            }
            Err(error) => Err(error),
        }
    }

    async fn call_tool_from_active_session(
        &mut self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, ServiceError> {
        let session = self.session.as_mut().ok_or(ServiceError::TransportClosed)?;
        session
            .call_tool(CallToolRequestParams {
                meta: None,
                name: name.to_owned().into(),
                arguments,
                task: None,
            })
            .await
    }
}

fn should_reconnect_after_service_error(error: &ServiceError) -> bool {
    matches!(
        error,
        ServiceError::TransportClosed | ServiceError::TransportSend(_)
    )
}

fn should_retry_protocol_fallback(error: &ClientInitializeError) -> bool {
    match error {
        ClientInitializeError::JsonRpcError(error) => {
            let message = error.message.to_ascii_lowercase();
            message.contains("protocol") && message.contains("version")
        }
        _ => false,
    }
}

fn map_mcp_tool(tool: rmcp::model::Tool) -> ProvidedTool {
    ProvidedTool {
        name: tool.name.to_string(),
        description: tool.description.map(|d| d.to_string()),
        input_schema: Some(serde_json::Value::Object((*tool.input_schema).clone())),
    }
}

fn map_content(item: &Content) -> ContentBlock {
    if let Some(text) = item.as_text() {
        return ContentBlock::Text(text.text.clone());
    }
    if let Some(resource) = item.as_resource() {
        if let ResourceContents::TextResourceContents { text, .. } = &resource.resource {
            return ContentBlock::Text(text.clone());
        }
    }
    let kind = serde_json::to_value(item)
        .ok()
        .and_then(|value| value.get("type").and_then(|t| t.as_str()).map(str::to_string))
        .unwrap_or_else(|| "unknown".into());
    ContentBlock::Other { kind }
}

fn map_call_result(result: CallToolResult) -> ToolCallResult {
    let mut content: Vec<ContentBlock> = result.content.iter().map(map_content).collect();
    if content.is_empty() {
        if let Some(structured) = &result.structured_content {
            content.push(ContentBlock::Text(structured.to_string()));
        }
    }

    ToolCallResult {
        content,
        is_error: result.is_error.unwrap_or(false),
    }
}

fn map_client_initialize_error(error: ClientInitializeError) -> RelayError {
    match error {
        ClientInitializeError::ConnectionClosed(context) => {
            RelayError::ToolProviderUnavailable(format!("MCP initialize connection closed: {context}"))
        }
        ClientInitializeError::TransportError { error, context } => {
            RelayError::ToolProviderUnavailable(format!(
                "MCP initialize transport error ({context}): {error}"
            ))
        }
        ClientInitializeError::JsonRpcError(error) => RelayError::Provider {
            provider: "mcp".into(),
            message: format!(
                "MCP initialize JSON-RPC error {}: {}",
                error.code.0, error.message
            ),
        },
        ClientInitializeError::Cancelled => {
            RelayError::ToolProviderUnavailable("MCP initialize cancelled".into())
        }
        other => RelayError::Provider {
            provider: "mcp".into(),
            message: format!("MCP initialize error: {other}"),
        },
    }
}

fn map_service_error(context: &str, error: ServiceError) -> RelayError {
    match error {
        ServiceError::McpError(error) => RelayError::Provider {
            provider: "mcp".into(),
            message: format!("{context}: MCP error {}: {}", error.code.0, error.message),
        },
        ServiceError::TransportSend(error) => {
            RelayError::Stream(format!("{context}: MCP transport send failed: {error}"))
        }
        ServiceError::TransportClosed => {
            RelayError::Stream(format!("{context}: MCP transport closed"))
        }
        ServiceError::UnexpectedResponse => RelayError::Provider {
            provider: "mcp".into(),
            message: format!("{context}: unexpected MCP response"),
        },
        ServiceError::Cancelled { reason } => {
            let suffix = reason
                .as_deref()
                .map(|r| format!(" ({r})"))
                .unwrap_or_default();
            RelayError::Stream(format!("{context}: MCP request cancelled{suffix}"))
        }
        ServiceError::Timeout { timeout } => RelayError::Timeout(timeout.as_millis() as u64),
        other => RelayError::Provider {
            provider: "mcp".into(),
            message: format!("{context}: MCP service error: {other}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct RejectingTransport {
        errors: Vec<ClientInitializeError>,
        attempted: Arc<Mutex<Vec<ProtocolVersion>>>,
    }

    #[async_trait]
    impl MCPTransport for RejectingTransport {
        async fn connect(
            &mut self,
            client_info: ClientInfo,
        ) -> Result<MCPRunningService, ClientInitializeError> {
            self.attempted
                .lock()
                .unwrap()
                .push(client_info.protocol_version.clone());
            Err(self.errors.remove(0))
        }

        fn describe(&self) -> String {
            "rejecting".into()
        }
    }

    fn version_mismatch() -> ClientInitializeError {
        ClientInitializeError::JsonRpcError(rmcp::model::ErrorData::invalid_request(
            "unsupported protocol version",
            None,
        ))
    }

    #[tokio::test]
    async fn initialize_retries_with_fallback_protocol() {
        let attempted = Arc::new(Mutex::new(Vec::new()));
        let mut client = MCPClient::new(Box::new(RejectingTransport {
            errors: vec![version_mismatch(), ClientInitializeError::Cancelled],
            attempted: attempted.clone(),
        }));

        let err = client.initialize().await.unwrap_err();
        assert!(matches!(err, RelayError::ToolProviderUnavailable(_)));
        assert_eq!(
            *attempted.lock().unwrap(),
            vec![ProtocolVersion::LATEST, ProtocolVersion::V_2024_11_05]
        );
        assert_eq!(client.connection_state(), MCPConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn closed_client_refuses_to_reconnect() {
        let mut client = MCPClient::new(Box::new(RejectingTransport {
            errors: Vec::new(),
            attempted: Arc::new(Mutex::new(Vec::new())),
        }));
        client.close().await.unwrap();
        assert!(matches!(
            client.list_tools().await,
            Err(RelayError::Stream(_))
        ));
    }

    #[test]
    fn map_mcp_tool_copies_fields() {
        let mut schema = serde_json::Map::new();
        schema.insert("type".into(), json!("object"));
        let tool = rmcp::model::Tool::new("GetInventoryLevels", "inventory", schema);

        let mapped = map_mcp_tool(tool);
        assert_eq!(mapped.name, "GetInventoryLevels");
        assert_eq!(mapped.description.as_deref(), Some("inventory"));
        assert_eq!(mapped.input_schema, Some(json!({"type": "object"})));
    }

    #[test]
    fn map_call_result_keeps_text_and_tags_other_content() {
        let result: CallToolResult = serde_json::from_value(json!({
            "content": [
                { "type": "image", "data": "aGk=", "mimeType": "image/png" },
                { "type": "text", "text": "Shampoo: 8 units" }
            ]
        }))
        .expect("fixture call result should deserialize");

        let mapped = map_call_result(result);
        assert!(!mapped.is_error);
        assert_eq!(
            mapped.content,
            vec![
                ContentBlock::Other {
                    kind: "image".into()
                },
                ContentBlock::Text("Shampoo: 8 units".into()),
            ]
        );
        assert_eq!(mapped.first_text(), Some("Shampoo: 8 units"));
    }

    #[test]
    fn map_call_result_preserves_error_flag() {
        let result: CallToolResult = serde_json::from_value(json!({
            "content": [{ "type": "text", "text": "tool failed at runtime" }],
            "isError": true
        }))
        .expect("fixture call result should deserialize");

        let mapped = map_call_result(result);
        assert!(mapped.is_error);
        assert_eq!(mapped.first_text(), Some("tool failed at runtime"));
    }

    #[test]
    fn map_service_error_timeout_maps_to_timeout_error() {
        let err = map_service_error(
            "call_tool",
            ServiceError::Timeout {
                timeout: Duration::from_millis(2750),
            },
        );
        assert!(matches!(err, RelayError::Timeout(2750)));
    }

    #[test]
    fn map_service_error_cancelled_reason_is_preserved() {
        let err = map_service_error(
            "call_tool",
            ServiceError::Cancelled {
                reason: Some("client cancelled".into()),
            },
        );
        assert!(matches!(
            err,
            RelayError::Stream(message) if message.contains("client cancelled")
        ));
    }
}

//! Expose an MCP server as a [`ToolProvider`].

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::RelayError;
use crate::tools::{ProvidedTool, ToolArguments, ToolCallResult, ToolProvider};

use super::client::MCPClient;
use super::transport::StdioTransport;

#[async_trait]
trait MCPClientOps: Send {
    async fn list_tools(&mut self) -> Result<Vec<ProvidedTool>, RelayError>;
    async fn call_tool(
        &mut self,
        name: &str,
        arguments: &ToolArguments,
    ) -> Result<ToolCallResult, RelayError>;
    async fn close(&mut self) -> Result<(), RelayError>;
}

#[async_trait]
impl MCPClientOps for MCPClient {
    async fn list_tools(&mut self) -> Result<Vec<ProvidedTool>, RelayError> {
        MCPClient::list_tools(self).await
    }

    async fn call_tool(
        &mut self,
        name: &str,
        arguments: &ToolArguments,
    ) -> Result<ToolCallResult, RelayError> {
        MCPClient::call_tool(self, name, arguments).await
    }

    async fn close(&mut self) -> Result<(), RelayError> {
        MCPClient::close(self).await
    }
}

/// Tool provider backed by an MCP server. Requests are serialized over one client.
pub struct McpToolProvider {
    client: Mutex<Box<dyn MCPClientOps>>,
}

impl McpToolProvider {
    pub fn new(client: MCPClient) -> Self {
        Self {
            client: Mutex::new(Box::new(client)),
        }
    }

    /// Provider for a server launched as a child process speaking MCP over stdio.
    pub fn stdio(command: impl Into<String>, args: Vec<String>) -> Self {
        Self::new(MCPClient::new(Box::new(StdioTransport::new(command, args))))
    }

    pub async fn shutdown(&self) -> Result<(), RelayError> {
        self.client.lock().await.close().await
    }

    #[cfg(test)]
    fn from_client_ops(client: Box<dyn MCPClientOps>) -> Self {
        Self {
            client: Mutex::new(client),
        }
    }
}

#[async_trait]
impl ToolProvider for McpToolProvider {
    async fn list_tools(&self) -> Result<Vec<ProvidedTool>, RelayError> {
        let mut client = self.client.lock().await;
        client.list_tools().await
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: &ToolArguments,
    ) -> Result<ToolCallResult, RelayError> {
        let mut client = self.client.lock().await;
        client.call_tool(name, arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex as StdMutex};

    struct MockClientOps {
        tools: Vec<ProvidedTool>,
        call_results: VecDeque<Result<ToolCallResult, RelayError>>,
        seen_arguments: Arc<StdMutex<Vec<serde_json::Value>>>,
    }

    #[async_trait]
    impl MCPClientOps for MockClientOps {
        async fn list_tools(&mut self) -> Result<Vec<ProvidedTool>, RelayError> {
            Ok(self.tools.clone())
        }

        async fn call_tool(
            &mut self,
            _name: &str,
            arguments: &ToolArguments,
        ) -> Result<ToolCallResult, RelayError> {
            self.seen_arguments
                .lock()
                .unwrap()
                .push(arguments.raw().clone());
            self.call_results
                .pop_front()
                .unwrap_or_else(|| Err(RelayError::Stream("missing mock call_tool result".into())))
        }

        async fn close(&mut self) -> Result<(), RelayError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn list_tools_passes_listing_through() {
        let provider = McpToolProvider::from_client_ops(Box::new(MockClientOps {
            tools: vec![ProvidedTool::new("GetWeeklySales", "sales")],
            call_results: VecDeque::new(),
            seen_arguments: Arc::default(),
        }));

        let tools = provider.list_tools().await.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "GetWeeklySales");
    }

    #[tokio::test]
    async fn call_tool_forwards_arguments_and_errors() {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let provider = McpToolProvider::from_client_ops(Box::new(MockClientOps {
            tools: Vec::new(),
            call_results: VecDeque::from([
                Ok(ToolCallResult::text("ok")),
                Err(RelayError::ToolExecution {
                    tool_name: "search".into(),
                    message: "downstream tool failure".into(),
                }),
            ]),
            seen_arguments: seen.clone(),
        }));

        let args = ToolArguments::new(json!({"q": "rust"}));
        let first = provider.call_tool("search", &args).await.unwrap();
        assert_eq!(first.first_text(), Some("ok"));

        let err = provider.call_tool("search", &args).await.unwrap_err();
        assert!(matches!(
            err,
            RelayError::ToolExecution { tool_name, message }
            if tool_name == "search" && message.contains("downstream tool failure")
        ));
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unreachable_server_reports_provider_unavailable() {
        let provider = McpToolProvider::stdio("mcp-relay-test-command-that-does-not-exist", Vec::new());
        let err = provider.list_tools().await.unwrap_err();
        assert!(matches!(err, RelayError::ToolProviderUnavailable(_)));
    }
}

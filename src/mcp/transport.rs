//! MCP transport layer.

use async_trait::async_trait;
use rmcp::model::ClientInfo;
use rmcp::service::{ClientInitializeError, DynService, RoleClient, RunningService, ServiceExt};
use rmcp::transport::TokioChildProcess;
use tokio::process::Command;

pub type DynClientService = Box<dyn DynService<RoleClient>>;
pub type MCPRunningService = RunningService<RoleClient, DynClientService>;

/// Transport trait for MCP communication.
#[async_trait]
pub trait MCPTransport: Send {
    /// Create and initialize a new rmcp running service for this transport.
    async fn connect(
        &mut self,
        client_info: ClientInfo,
    ) -> Result<MCPRunningService, ClientInitializeError>;

    /// Human-readable target, for logs.
    fn describe(&self) -> String;
}

/// Stdio-based MCP transport: spawns the server as a child process.
#[derive(Debug, Clone)]
pub struct StdioTransport {
    command: String,
    args: Vec<String>,
}

impl StdioTransport {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

#[async_trait]
impl MCPTransport for StdioTransport {
    async fn connect(
        &mut self,
        client_info: ClientInfo,
    ) -> Result<MCPRunningService, ClientInitializeError> {
        let mut command = Command::new(&self.command);
        command.args(&self.args);
        let transport = TokioChildProcess::new(command).map_err(|error| {
            ClientInitializeError::transport::<TokioChildProcess>(error, "spawn stdio transport")
        })?;

        client_info.into_dyn().serve(transport).await
    }

    fn describe(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_joins_command_and_args() {
        let transport = StdioTransport::new("dotnet", vec!["run".into(), "./server.cs".into()]);
        assert_eq!(transport.describe(), "dotnet run ./server.cs");
        assert_eq!(transport.args().len(), 2);
        assert_eq!(StdioTransport::new("server", Vec::new()).describe(), "server");
    }

    #[tokio::test]
    async fn spawn_failure_surfaces_as_initialize_error() {
        let mut transport = StdioTransport::new("mcp-relay-test-command-that-does-not-exist", Vec::new());
        let result = transport.connect(ClientInfo::default()).await;
        assert!(matches!(
            result,
            Err(ClientInitializeError::TransportError { .. })
        ));
    }
}

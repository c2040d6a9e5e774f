//! Tool provider contract: runtime-discovered tools (MCP servers, in-process backends).

use async_trait::async_trait;

use super::arguments::ToolArguments;
use crate::error::RelayError;

/// A tool as listed by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvidedTool {
    pub name: String,
    pub description: Option<String>,
    /// JSON schema for the tool input, when the provider publishes one.
    pub input_schema: Option<serde_json::Value>,
}

impl ProvidedTool {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            input_schema: None,
        }
    }

    pub fn with_input_schema(mut self, schema: serde_json::Value) -> Self {
        self.input_schema = Some(schema);
        self
    }
}

/// One block of tool output.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text(String),
    /// Non-text content (images, resources, ...), identified by its type tag.
    Other { kind: String },
}

/// Result of executing a tool.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToolCallResult {
    pub content: Vec<ContentBlock>,
    pub is_error: bool,
}

impl ToolCallResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text(text.into())],
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text(text.into())],
            is_error: true,
        }
    }

    /// First textual block, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text(text) => Some(text.as_str()),
            ContentBlock::Other { .. } => None,
        })
    }
}

/// Trait for collaborators that can list and execute tools at runtime.
///
/// Implementations must tolerate repeated and concurrent listing.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// List available tools.
    async fn list_tools(&self) -> Result<Vec<ProvidedTool>, RelayError>;

    /// Execute a tool by name.
    async fn call_tool(
        &self,
        name: &str,
        arguments: &ToolArguments,
    ) -> Result<ToolCallResult, RelayError>;
}

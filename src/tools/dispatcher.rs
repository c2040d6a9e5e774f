//! Resolves tool-output requests against the tool provider.

use std::sync::Arc;

use tracing::debug;

use super::arguments::ToolArguments;
use super::provider::ToolProvider;
use crate::error::RelayError;

/// Invokes tools by name on behalf of the orchestrator.
///
/// The listing is re-queried on every call so tools that appear or disappear
/// mid-session are observed immediately.
#[derive(Clone)]
pub struct ToolDispatcher {
    provider: Arc<dyn ToolProvider>,
}

impl ToolDispatcher {
    pub fn new(provider: Arc<dyn ToolProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<dyn ToolProvider> {
        &self.provider
    }

    /// Execute `function_name` and return the first text block of its result.
    ///
    /// Names match exactly (case-sensitive). An unknown name yields
    /// [`RelayError::ToolNotFound`]; an error result or a result without text
    /// yields [`RelayError::ToolExecution`].
    pub async fn invoke(
        &self,
        function_name: &str,
        arguments: &ToolArguments,
    ) -> Result<String, RelayError> {
        let tools = self.provider.list_tools().await?;
        let Some(tool) = tools.iter().find(|t| t.name == function_name) else {
            return Err(RelayError::ToolNotFound(function_name.to_string()));
        };

        debug!(tool = %tool.name, "dispatching tool call");
        let result = self.provider.call_tool(&tool.name, arguments).await?;

        if result.is_error {
            return Err(RelayError::ToolExecution {
                tool_name: tool.name.clone(),
                message: result
                    .first_text()
                    .unwrap_or("tool returned an error result")
                    .to_string(),
            });
        }

        result
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| RelayError::ToolExecution {
                tool_name: tool.name.clone(),
                message: "tool returned no text content".into(),
            })
    }
}

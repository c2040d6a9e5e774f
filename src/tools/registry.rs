//! Converts a provider's tool listing into descriptors for agent creation.

use tracing::debug;

use super::descriptor::{parameters_or_empty, ToolDescriptor};
use super::provider::ToolProvider;
use crate::error::RelayError;

/// Query the provider and build one descriptor per tool.
///
/// Any provider failure surfaces as [`RelayError::ToolProviderUnavailable`].
pub async fn list_tool_descriptors(
    provider: &dyn ToolProvider,
) -> Result<Vec<ToolDescriptor>, RelayError> {
    let tools = provider
        .list_tools()
        .await
        .map_err(|e| RelayError::ToolProviderUnavailable(e.to_string()))?;

    let descriptors: Vec<ToolDescriptor> = tools
        .into_iter()
        .map(|tool| ToolDescriptor {
            parameters: parameters_or_empty(tool.input_schema.as_ref()),
            description: tool.description.unwrap_or_default(),
            name: tool.name,
        })
        .collect();

    debug!(count = descriptors.len(), "tool descriptors listed");
    Ok(descriptors)
}

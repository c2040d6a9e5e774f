//! Tool call arguments as delivered by the agent run service.

use crate::error::RelayError;

/// Wrapper around tool call arguments.
///
/// The service sends arguments as a JSON-encoded string; providers want an object.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolArguments {
    value: serde_json::Value,
}

impl ToolArguments {
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    /// No arguments.
    pub fn empty() -> Self {
        Self {
            value: serde_json::Value::Null,
        }
    }

    /// Get the raw JSON value.
    pub fn raw(&self) -> &serde_json::Value {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        match &self.value {
            serde_json::Value::Null => true,
            serde_json::Value::Object(map) => map.is_empty(),
            serde_json::Value::String(raw) => raw.trim().is_empty() || raw.trim() == "{}",
            _ => false,
        }
    }

    /// Normalize into a JSON object, parsing stringified objects. `None` means no arguments.
    pub fn to_object(
        &self,
    ) -> Result<Option<serde_json::Map<String, serde_json::Value>>, RelayError> {
        coerce_object(self.value.clone())
    }
}

impl Default for ToolArguments {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Display for ToolArguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            serde_json::Value::String(raw) => f.write_str(raw),
            serde_json::Value::Null => f.write_str("{}"),
            other => write!(f, "{other}"),
        }
    }
}

fn coerce_object(
    value: serde_json::Value,
) -> Result<Option<serde_json::Map<String, serde_json::Value>>, RelayError> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Object(map) => Ok(Some(map)),
        serde_json::Value::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            let parsed: serde_json::Value = serde_json::from_str(trimmed).map_err(|e| {
                RelayError::InvalidArgument(format!("tool arguments must be valid JSON: {e}"))
            })?;
            coerce_object(parsed)
        }
        other => Err(RelayError::InvalidArgument(format!(
            "tool arguments must be a JSON object; got {other}"
        ))),
    }
}

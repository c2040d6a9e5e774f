//! Tool descriptors handed to the agent run service.

use serde::{Deserialize, Serialize};

/// Name, description and parameter schema of one callable tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Function-tool wire shape used by the agents API.
    pub fn to_function_tool(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

/// Parameter schema for a tool that takes no arguments.
pub fn empty_parameters() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {},
        "required": [],
    })
}

/// Use the provider's schema when it is a typed object schema, otherwise the empty schema.
pub fn parameters_or_empty(schema: Option<&serde_json::Value>) -> serde_json::Value {
    match schema {
        Some(serde_json::Value::Object(map)) if map.contains_key("type") => {
            let mut map = map.clone();
            map.entry("properties")
                .or_insert_with(|| serde_json::json!({}));
            serde_json::Value::Object(map)
        }
        _ => empty_parameters(),
    }
}

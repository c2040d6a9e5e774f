//! Configuration system (layered: code > env > `.env` file).

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::error::RelayError;

pub const ENDPOINT_VAR: &str = "AI_FOUNDRY_PROJECT_ENDPOINT";
pub const MODEL_VAR: &str = "MODEL_DEPLOYMENT_NAME";
pub const TOKEN_VAR: &str = "AI_FOUNDRY_ACCESS_TOKEN";
pub const TENANT_VAR: &str = "TENANT_ID";
pub const API_VERSION_VAR: &str = "AI_FOUNDRY_API_VERSION";
pub const AGENT_NAME_VAR: &str = "AGENT_NAME";
pub const INSTRUCTIONS_VAR: &str = "AGENT_INSTRUCTIONS";

pub const DEFAULT_API_VERSION: &str = "v1";
pub const DEFAULT_AGENT_NAME: &str = "InventoryAgent";
pub const DEFAULT_INSTRUCTIONS: &str = "You are an inventory assistant. Here are some general guidelines:
- Recommend restock if item inventory < 10 and weekly sales > 15
- Recommend clearance if item inventory > 20 and weekly sales < 5";

/// Resolved settings for talking to the agent run service.
#[derive(Clone)]
pub struct RelayConfig {
    pub endpoint: String,
    pub model_deployment: String,
    pub access_token: String,
    pub tenant_id: Option<String>,
    pub api_version: String,
    pub agent_name: String,
    pub instructions: String,
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("endpoint", &self.endpoint)
            .field("model_deployment", &self.model_deployment)
            .field("access_token", &"..")
            .field("tenant_id", &self.tenant_id)
            .field("api_version", &self.api_version)
            .field("agent_name", &self.agent_name)
            .finish()
    }
}

impl RelayConfig {
    /// Load from process environment, reading `.env` from the working directory first if present.
    pub fn from_env() -> Result<Self, RelayError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an explicit `.env` file. Process environment wins over the file.
    pub fn from_env_file(path: &Path) -> Result<Self, RelayError> {
        let iter = dotenvy::from_path_iter(path).map_err(|e| {
            RelayError::Configuration(format!("cannot read env file {}: {e}", path.display()))
        })?;
        let mut file_values = HashMap::new();
        for item in iter {
            let (key, value) = item.map_err(|e| {
                RelayError::Configuration(format!("invalid env file {}: {e}", path.display()))
            })?;
            file_values.insert(key, value);
        }
        Self::from_lookup(|key| {
            std::env::var(key)
                .ok()
                .or_else(|| file_values.get(key).cloned())
        })
    }

    /// Build from an arbitrary key lookup. Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RelayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let endpoint = get(ENDPOINT_VAR);
        let model_deployment = get(MODEL_VAR);
        let access_token = get(TOKEN_VAR);

        let missing: Vec<&str> = [
            (ENDPOINT_VAR, endpoint.is_none()),
            (MODEL_VAR, model_deployment.is_none()),
            (TOKEN_VAR, access_token.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        let (Some(endpoint), Some(model_deployment), Some(access_token)) =
            (endpoint, model_deployment, access_token)
        else {
            return Err(RelayError::Configuration(format!(
                "please set {} in the environment or .env file",
                missing.join(", ")
            )));
        };

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model_deployment,
            access_token,
            tenant_id: get(TENANT_VAR),
            api_version: get(API_VERSION_VAR).unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            agent_name: get(AGENT_NAME_VAR).unwrap_or_else(|| DEFAULT_AGENT_NAME.to_string()),
            instructions: get(INSTRUCTIONS_VAR)
                .unwrap_or_else(|| DEFAULT_INSTRUCTIONS.to_string()),
        })
    }

    pub fn with_agent_name(mut self, name: impl Into<String>) -> Self {
        self.agent_name = name.into();
        self
    }
}

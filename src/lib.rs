//! mcp-relay: drives streaming agent runs and resolves their tool calls.
//!
//! A [`agent_loop::TurnOrchestrator`] posts user input to a hosted agent thread,
//! consumes the run's event stream, answers approval and tool-output requests
//! through a [`tools::ToolProvider`] (an MCP server or the built-in inventory
//! tools), and resubmits until the run reaches a terminal state.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use mcp_relay::agent_loop::{ChatSession, TurnOrchestrator};
//! use mcp_relay::agents::HttpAgentRunService;
//! use mcp_relay::config::RelayConfig;
//! use mcp_relay::tools::{InventoryToolProvider, ToolDispatcher};
//!
//! # async fn example() -> mcp_relay::error::Result<()> {
//! let config = RelayConfig::from_env()?;
//! let service = Arc::new(HttpAgentRunService::new(&config)?);
//! let dispatcher = ToolDispatcher::new(Arc::new(InventoryToolProvider::builtin()));
//! let session = ChatSession::start(TurnOrchestrator::new(service, dispatcher), &config).await?;
//!
//! let outcome = session.send("Which products need restocking?").await;
//! println!("{:?}", outcome.status);
//! # Ok(())
//! # }
//! ```

pub mod agent_loop;
pub mod agents;
pub mod config;
pub mod error;
pub mod tools;

#[cfg(feature = "mcp")]
pub mod mcp;

#[cfg(feature = "cli")]
pub mod cli;

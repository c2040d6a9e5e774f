//! CLI entry point for mcp-relay.

pub mod console;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt};

use crate::agent_loop::{ChatSession, TurnOptions, UnresolvedCallPolicy};
use crate::error::RelayError;
use crate::mcp::McpToolProvider;
use crate::tools::{InventoryToolProvider, ToolProvider};

pub const PROMPT: &str = "Enter a command (or 'exit' to quit):";

/// mcp-relay CLI
#[derive(Parser, Debug)]
#[command(
    name = "mcp-relay",
    version,
    about = "Chat with a hosted agent whose tool calls are served by an MCP server"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive chat session (default)
    Chat(ChatArgs),
    /// Print the tool descriptors the agent would receive, as JSON
    Tools(ProviderArgs),
}

/// Where tools come from.
#[derive(Args, Debug, Clone, Default)]
pub struct ProviderArgs {
    /// Command that launches an MCP server over stdio (built-in inventory tools when omitted)
    #[arg(long)]
    pub mcp_command: Option<String>,

    /// Argument for the MCP server command (repeatable)
    #[arg(long = "mcp-arg", allow_hyphen_values = true)]
    pub mcp_args: Vec<String>,
}

/// Arguments for the `chat` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ChatArgs {
    #[command(flatten)]
    pub provider: ProviderArgs,

    /// Load settings from this .env file instead of ./.env
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    /// Agent name (overrides AGENT_NAME)
    #[arg(long)]
    pub agent_name: Option<String>,

    /// Submit an error output for tool calls no provider can resolve
    #[arg(long)]
    pub report_missing_tools: bool,

    /// Maximum stream passes per turn
    #[arg(long, default_value_t = TurnOptions::default().max_passes)]
    pub max_passes: usize,
}

impl Default for ChatArgs {
    fn default() -> Self {
        Self {
            provider: ProviderArgs::default(),
            env_file: None,
            agent_name: None,
            report_missing_tools: false,
            max_passes: TurnOptions::default().max_passes,
        }
    }
}

impl ChatArgs {
    pub fn turn_options(&self) -> TurnOptions {
        TurnOptions {
            max_passes: self.max_passes,
            unresolved_calls: if self.report_missing_tools {
                UnresolvedCallPolicy::Report
            } else {
                UnresolvedCallPolicy::Omit
            },
        }
    }
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The requested command; a bare invocation means `chat`.
    pub fn command_or_default(self) -> Commands {
        self.command
            .unwrap_or_else(|| Commands::Chat(ChatArgs::default()))
    }
}

/// The tool provider selected on the command line.
pub enum SelectedProvider {
    Mcp(Arc<McpToolProvider>),
    Inventory(Arc<InventoryToolProvider>),
}

impl SelectedProvider {
    pub fn from_args(args: &ProviderArgs) -> Self {
        match &args.mcp_command {
            Some(command) => Self::Mcp(Arc::new(McpToolProvider::stdio(
                command.clone(),
                args.mcp_args.clone(),
            ))),
            None => Self::Inventory(Arc::new(InventoryToolProvider::builtin())),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::Mcp(_) => "MCP server",
            Self::Inventory(_) => "built-in inventory tools",
        }
    }

    pub fn as_provider(&self) -> Arc<dyn ToolProvider> {
        match self {
            Self::Mcp(provider) => provider.clone(),
            Self::Inventory(provider) => provider.clone(),
        }
    }

    pub async fn shutdown(&self) -> Result<(), RelayError> {
        match self {
            Self::Mcp(provider) => provider.shutdown().await,
            Self::Inventory(_) => Ok(()),
        }
    }
}

/// Whether a line ends the chat session.
pub fn is_exit_command(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("exit")
}

/// Read commands from `input` and run one turn per non-blank line until `exit` or EOF.
///
/// Returns the number of turns run. Turn failures are reported through the session's
/// event sink and do not end the loop.
pub async fn chat_loop<R>(session: &ChatSession, input: R) -> Result<usize, RelayError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut stdout = tokio::io::stdout();
    let mut turns = 0usize;

    loop {
        stdout.write_all(format!("{PROMPT}\n> ").as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if is_exit_command(&line) {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        session.send(line).await;
        turns += 1;
        stdout.write_all(b"\n").await?;
    }

    Ok(turns)
}

//! mcp-relay CLI binary entry point.

use std::sync::Arc;

use mcp_relay::agent_loop::{ChatSession, TurnOrchestrator};
use mcp_relay::agents::HttpAgentRunService;
use mcp_relay::cli::console::console_sink;
use mcp_relay::cli::{chat_loop, ChatArgs, Cli, Commands, ProviderArgs, SelectedProvider};
use mcp_relay::config::RelayConfig;
use mcp_relay::error::RelayError;
use mcp_relay::tools::{list_tool_descriptors, ToolDispatcher};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_args();
    let result = match cli.command_or_default() {
        Commands::Chat(args) => handle_chat(args).await,
        Commands::Tools(args) => handle_tools(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn handle_chat(args: ChatArgs) -> Result<(), RelayError> {
    let mut config = match &args.env_file {
        Some(path) => RelayConfig::from_env_file(path)?,
        None => RelayConfig::from_env()?,
    };
    if let Some(name) = &args.agent_name {
        config = config.with_agent_name(name.clone());
    }

    println!("Using project endpoint: {}", config.endpoint);
    println!("Using model: {}", config.model_deployment);
    if let Some(tenant) = &config.tenant_id {
        println!("Using tenant: {tenant}");
    }

    let provider = SelectedProvider::from_args(&args.provider);
    if matches!(provider, SelectedProvider::Mcp(_)) {
        println!("Connecting to MCP server...");
    }

    let result = run_chat(&args, &config, &provider).await;
    if let Err(e) = provider.shutdown().await {
        tracing::warn!(error = %e, "tool provider shutdown failed");
    }
    result
}

async fn run_chat(
    args: &ChatArgs,
    config: &RelayConfig,
    provider: &SelectedProvider,
) -> Result<(), RelayError> {
    let service = Arc::new(HttpAgentRunService::new(config)?);
    let orchestrator = TurnOrchestrator::new(service, ToolDispatcher::new(provider.as_provider()))
        .with_options(args.turn_options())
        .with_event_sink(console_sink());

    let session = ChatSession::start(orchestrator, config).await?;
    tracing::info!(tools = provider.describe(), "session ready");

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let turns = chat_loop(&session, stdin).await?;
    tracing::debug!(turns, "chat session ended");
    Ok(())
}

async fn handle_tools(args: ProviderArgs) -> Result<(), RelayError> {
    let provider = SelectedProvider::from_args(&args);
    let listed = list_tool_descriptors(provider.as_provider().as_ref()).await;
    if let Err(e) = provider.shutdown().await {
        tracing::warn!(error = %e, "tool provider shutdown failed");
    }

    let functions: Vec<_> = listed?
        .iter()
        .map(|descriptor| descriptor.to_function_tool())
        .collect();
    println!("{}", serde_json::to_string_pretty(&functions)?);
    Ok(())
}

mod agent;
mod auth;
mod chat;
mod cli;
mod config;
mod llm;
mod logging;
mod tools;

use std::{io, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use dotenvy::dotenv;
use tracing::info;

use crate::auth::{DefaultCredential, DefaultCredentialOptions};
use crate::config::AppConfig;
use crate::llm::ProjectClient;
use crate::tools::ToolRegistry;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "support-agent",
    version,
    about = "Technical support agent with local function calling"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Project endpoint (default: $PROJECT_ENDPOINT)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Model deployment name (default: $MODEL_DEPLOYMENT_NAME)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Name under which the agent version is created
    #[arg(long, global = true)]
    agent_name: Option<String>,

    /// Directory ticket files are written to (default: next to the executable)
    #[arg(long, global = true)]
    ticket_dir: Option<PathBuf>,

    /// api-version for agent, conversation and response calls
    #[arg(long, global = true)]
    api_version: Option<String>,

    /// api-version for chat completions
    #[arg(long, global = true)]
    chat_api_version: Option<String>,

    /// Log level (error,warn,info,debug,trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Do not clear the console at startup
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    no_clear: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Command {
    /// Chat with the support agent; tool calls are executed locally (default)
    #[default]
    Agent,
    /// Plain chat completions with a client-side history
    Chat,
    /// List the project's connections
    Connections,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    let level = cli
        .log_level
        .clone()
        .or_else(|| std::env::var("SUPPORT_AGENT_LOG").ok())
        .unwrap_or_else(|| "info".to_string());
    logging::init_logging(&level, cli.log_file.as_deref())?;

    let cfg = AppConfig::from_cli(&cli).context("load configuration")?;
    info!(?cfg, "app config");
    let command = cli.command.unwrap_or_default();

    let mut out = io::stdout();
    if cfg.clear_screen && command != Command::Connections {
        cli::clear_screen(&mut out)?;
    }

    // The agent resolves credentials interactively, never from the
    // environment or a managed identity.
    let interactive = command == Command::Agent;
    let credential = Arc::new(DefaultCredential::new(DefaultCredentialOptions {
        exclude_environment_credential: interactive,
        exclude_managed_identity_credential: interactive,
        ..DefaultCredentialOptions::default()
    }));
    let client = ProjectClient::new(&cfg.endpoint, credential)?
        .with_http_config(&cfg.http)
        .with_api_version(&cfg.api_version)
        .with_chat_api_version(&cfg.chat_api_version);

    match command {
        Command::Agent => {
            let registry = ToolRegistry::new(&cfg.ticket_dir);
            info!(ticket_dir=%registry.ticket_dir().display(), "tool registry ready");
            let mut lines = cli::spawn_line_reader(io::BufReader::new(io::stdin()));
            agent::run(
                &client,
                &cfg,
                &registry,
                &mut lines,
                &mut out,
                cli::interrupted(),
            )
            .await
        }
        Command::Chat => {
            chat::run_chat_loop(&client, &cfg.model, io::stdin().lock(), &mut out).await
        }
        Command::Connections => chat::print_connections(&client, &mut out).await,
    }
}

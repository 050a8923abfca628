// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Frontdesk CLI
//!
//! The `frontdesk` binary runs the help desk that backs the receptionist and
//! gives supervisors a terminal view of it.
//!
//! ## Commands
//!
//! - `frontdesk serve` - Run the help desk API (escalations, knowledge base, SSE)
//! - `frontdesk console` - Serve the API and talk to the receptionist on stdin
//! - `frontdesk requests list|show|resolve` - Supervisor operations
//! - `frontdesk kb list|match` - Inspect the knowledge base
//! - `frontdesk config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use frontdesk::commands::{self, ConfigCommand, KbCommand, RequestsCommand};
use frontdesk_core::domain::config::{FrontdeskConfigManifest, LoggingConfig};

/// Frontdesk - knowledge-backed receptionist with human escalation
#[derive(Parser)]
#[command(name = "frontdesk")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "FRONTDESK_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// HTTP API port (default: from configuration, 8000)
    #[arg(long, global = true, env = "FRONTDESK_PORT")]
    port: Option<u16>,

    /// HTTP API host (default: from configuration)
    #[arg(long, global = true, env = "FRONTDESK_HOST")]
    host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "FRONTDESK_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the help desk API
    #[command(name = "serve")]
    Serve,

    /// Serve the API and run an interactive receptionist session
    #[command(name = "console")]
    Console {
        /// Room identifier recorded on escalations
        #[arg(long, default_value = "console")]
        room: String,

        /// Print context injected into the conversation
        #[arg(long)]
        show_context: bool,
    },

    /// Supervisor help request operations
    #[command(name = "requests")]
    Requests {
        #[command(subcommand)]
        command: RequestsCommand,
    },

    /// Knowledge base operations
    #[command(name = "kb")]
    Kb {
        #[command(subcommand)]
        command: KbCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env first, .env.local wins
    dotenvy::dotenv().ok();
    dotenvy::from_filename_override(".env.local").ok();

    let cli = Cli::parse();

    // Logging settings come from the config when it loads; commands report load errors
    let logging = FrontdeskConfigManifest::load_or_default(cli.config.clone())
        .map(|config| config.spec.observability.logging)
        .unwrap_or_default();
    init_logging(cli.log_level.as_deref().unwrap_or(&logging.level), &logging)?;

    let host = cli.host.as_deref();
    match cli.command {
        Some(Commands::Serve) => commands::serve::handle_command(cli.config, host, cli.port).await,
        Some(Commands::Console { room, show_context }) => {
            commands::console::handle_command(cli.config, host, cli.port, room, show_context).await
        }
        Some(Commands::Requests { command }) => {
            commands::requests::handle_command(command, cli.config, host, cli.port).await
        }
        Some(Commands::Kb { command }) => commands::kb::handle_command(command, cli.config, host, cli.port).await,
        Some(Commands::Config { command }) => commands::config::handle_command(command, cli.config).await,
        None => {
            // No command provided - show help
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.compact().init();
    }

    Ok(())
}

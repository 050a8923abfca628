// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use super::load_config;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,

        /// Print the effective manifest as YAML
        #[arg(long)]
        yaml: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./frontdesk-config.yaml)
        #[arg(short, long, default_value = "./frontdesk-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths, yaml } => show(config_override, paths, yaml).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool, as_yaml: bool) -> Result<()> {
    let config = load_config(config_override.clone())?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. FRONTDESK_CONFIG_PATH: {}",
            std::env::var("FRONTDESK_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./frontdesk-config.yaml");
        println!("  4. ~/.frontdesk/config.yaml");
        println!("  5. /etc/frontdesk/config.yaml");
        println!();
    }

    if as_yaml {
        print!("{}", serde_yaml::to_string(&config).context("Failed to render configuration")?);
        return Ok(());
    }

    let spec = &config.spec;
    println!("{}", "Current configuration:".bold());
    println!("  Name: {}", config.metadata.name);
    println!();

    println!("{}", "Knowledge:".bold());
    println!("  Match threshold: {}", spec.knowledge.match_threshold);
    println!("  Lexical threshold: {}", spec.knowledge.lexical_threshold);
    if spec.knowledge.backfill.enabled {
        println!("  Backfill sweep: every {}s", spec.knowledge.backfill.interval_seconds);
    } else {
        println!("  Backfill sweep: {}", "disabled".dimmed());
    }
    println!();

    println!("{}", "Embedding:".bold());
    println!("  Provider: {}", spec.embedding.provider_type);
    if spec.embedding.provider_type == "hash" {
        println!("  Dimensions: {}", spec.embedding.dimensions);
    } else {
        println!("  Endpoint: {}", spec.embedding.endpoint);
        println!("  Model: {}", spec.embedding.model);
        println!(
            "  API key: {}",
            match spec.embedding.api_key.as_deref() {
                Some(key) if key.starts_with("env:") => key.to_string(),
                Some(_) => "(inline)".to_string(),
                None => "(none)".to_string(),
            }
        );
    }
    println!();

    println!("{}", "Escalation:".bold());
    println!("  Help desk: {}", spec.escalation.backend_url);
    println!("  Request timeout: {}s", spec.escalation.request_timeout_seconds);
    println!("  Max wait: {}s", spec.escalation.max_wait_seconds);
    println!();

    println!("{}", "Storage:".bold());
    println!("  Backend: {}", spec.storage.backend);
    if let Some(path) = &spec.storage.path {
        println!("  Path: {}", path);
    }
    println!();

    println!("{}", "Network:".bold());
    println!("  Listen: {}:{}", spec.network.bind_address, spec.network.port);
    println!("  CORS origins: {}", spec.network.cors_allowed_origins.join(", "));
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = load_config(config_path)?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

fn sample(with_examples: bool) -> &'static str {
    if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    }
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    std::fs::write(&output, sample(with_examples))
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

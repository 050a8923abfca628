// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the Frontdesk CLI

pub mod config;
pub mod console;
pub mod kb;
pub mod requests;
pub mod serve;

pub use self::config::ConfigCommand;
pub use self::kb::KbCommand;
pub use self::requests::RequestsCommand;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use frontdesk_core::domain::config::FrontdeskConfigManifest;
use frontdesk_core::infrastructure::help_desk_client::HelpDeskClient;

/// Load configuration with discovery and environment overrides
pub fn load_config(config_path: Option<PathBuf>) -> Result<FrontdeskConfigManifest> {
    FrontdeskConfigManifest::load_or_default(config_path).context("Failed to load configuration")
}

/// Apply `--host` / `--port` to the listener settings
pub fn apply_network_overrides(config: &mut FrontdeskConfigManifest, host: Option<&str>, port: Option<u16>) {
    if let Some(host) = host {
        config.spec.network.bind_address = host.to_string();
    }
    if let Some(port) = port {
        config.spec.network.port = port;
    }
}

/// Help desk URL: `--host` / `--port` when given, else the configured backend
pub fn help_desk_url(config: &FrontdeskConfigManifest, host: Option<&str>, port: Option<u16>) -> String {
    if host.is_none() && port.is_none() {
        return config.spec.escalation.backend_url.clone();
    }
    format!(
        "http://{}:{}",
        host.unwrap_or("127.0.0.1"),
        port.unwrap_or(config.spec.network.port)
    )
}

pub fn help_desk_client(
    config_path: Option<PathBuf>,
    host: Option<&str>,
    port: Option<u16>,
) -> Result<HelpDeskClient> {
    let config = load_config(config_path)?;
    HelpDeskClient::with_timeout(
        help_desk_url(&config, host, port),
        Duration::from_secs(config.spec.escalation.request_timeout_seconds),
    )
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `frontdesk serve`: run the help desk API

use anyhow::Result;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{apply_network_overrides, load_config};
use crate::embedded::EmbeddedServices;
use crate::server;

pub async fn handle_command(config_path: Option<PathBuf>, host: Option<&str>, port: Option<u16>) -> Result<()> {
    let mut config = load_config(config_path)?;
    apply_network_overrides(&mut config, host, port);

    let services = EmbeddedServices::from_config(config)?;
    server::install_metrics_exporter(&services.config.spec.observability.metrics)?;

    let shutdown = CancellationToken::new();
    let sweeper = services
        .backfill_sweeper(shutdown.child_token())
        .map(|sweeper| sweeper.start());

    let network = &services.config.spec.network;
    let listener = server::bind(&network.bind_address, network.port).await?;
    tokio::spawn(server::shutdown_signal(shutdown.clone()));

    info!(
        storage = %services.config.spec.storage.backend,
        embedding = services.embedder.name(),
        "Frontdesk help desk starting"
    );
    let result = server::serve(listener, services.router()?, shutdown.clone()).await;

    shutdown.cancel();
    if let Some(handle) = sweeper {
        if let Err(e) = handle.await {
            warn!("Backfill sweeper task failed: {}", e);
        }
    }

    result
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Backfill Sweeper - Background task that heals entries missing embeddings
//!
//! The matcher backfills lazily while answering queries. The sweeper does the
//! same work on a timer so entries imported without vectors (or whose
//! embedding failed at resolution time) are repaired before anyone asks.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Periodic embedding backfill

use std::sync::Arc;
use std::time::{Duration, Instant};
use anyhow::Result;
use tokio::time::interval;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, debug};

use crate::application::{BackfillReport, EventBus, KnowledgeService};
use crate::domain::CortexEvent;

/// Configuration for the backfill sweeper
#[derive(Debug, Clone)]
pub struct BackfillSweeperConfig {
    /// How often to run the sweep (in seconds)
    pub interval_seconds: u64,

    /// Whether sweeping is enabled
    pub enabled: bool,
}

impl Default for BackfillSweeperConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 600,
            enabled: true,
        }
    }
}

/// Backfill Sweeper - Background task
pub struct BackfillSweeper {
    knowledge_service: Arc<dyn KnowledgeService>,
    event_bus: Arc<dyn EventBus>,
    config: BackfillSweeperConfig,
    shutdown_token: CancellationToken,
}

impl BackfillSweeper {
    pub fn new(
        knowledge_service: Arc<dyn KnowledgeService>,
        event_bus: Arc<dyn EventBus>,
        config: BackfillSweeperConfig,
    ) -> Self {
        Self {
            knowledge_service,
            event_bus,
            config,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Stop together with an outer shutdown token
    pub fn with_shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown_token = token;
        self
    }

    /// Get a handle to trigger shutdown
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Start the sweeper background task
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(&self) {
        if !self.config.enabled {
            info!("Backfill sweeper is disabled");
            return;
        }

        info!(
            interval_seconds = self.config.interval_seconds,
            "Starting backfill sweeper background task"
        );

        let mut tick = interval(Duration::from_secs(self.config.interval_seconds.max(1)));

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    debug!("Running backfill sweep");

                    match self.sweep_cycle().await {
                        Ok(report) => {
                            if report.backfilled > 0 || report.failed > 0 {
                                info!(
                                    backfilled = report.backfilled,
                                    failed = report.failed,
                                    "Backfill sweep completed"
                                );
                            }
                        }
                        Err(e) => {
                            warn!("Backfill sweep failed: {}", e);
                        }
                    }
                }
                _ = self.shutdown_token.cancelled() => {
                    info!("Shutdown signal received, stopping backfill sweeper");
                    break;
                }
            }
        }

        info!("Backfill sweeper background task stopped");
    }

    /// Execute a single sweep
    async fn sweep_cycle(&self) -> Result<BackfillReport> {
        let started = Instant::now();
        let report = self.knowledge_service.backfill_missing().await?;

        let event = CortexEvent::BackfillSweepCompleted {
            backfilled: report.backfilled,
            failed: report.failed,
            duration_ms: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        };
        self.event_bus.publish(event).await?;

        Ok(report)
    }
}

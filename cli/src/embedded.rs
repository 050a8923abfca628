// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-process service wiring
//!
//! Builds the help desk, knowledge base and event bus from a loaded
//! configuration. Shared by `serve` and `console`.

use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

use frontdesk_core::{
    application::{create_stores, storage_backend_from_config, EscalationCoordinator, HelpDeskService, Stores},
    domain::config::FrontdeskConfigManifest,
    domain::escalation::EscalationBackend,
    infrastructure::{embedding_registry::create_embedding_provider, event_bus::EventBus},
    presentation::api::{app, AppState},
};
use frontdesk_cortex::{
    BackfillSweeper, BackfillSweeperConfig, EmbeddingProvider, KnowledgeMatcher, MatchThresholds,
    StandardKnowledgeService,
};

pub struct EmbeddedServices {
    pub config: FrontdeskConfigManifest,
    pub event_bus: EventBus,
    pub stores: Stores,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub knowledge: Arc<StandardKnowledgeService>,
    pub matcher: Arc<KnowledgeMatcher>,
    pub help_desk: Arc<HelpDeskService>,
}

impl EmbeddedServices {
    pub fn from_config(config: FrontdeskConfigManifest) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;

        let event_bus = EventBus::with_default_capacity();
        let backend = storage_backend_from_config(&config.spec.storage)?;
        let stores = create_stores(&backend, event_bus.clone()).context("Failed to initialize storage")?;

        let embedder = create_embedding_provider(&config.spec.embedding)
            .context("Failed to initialize embedding provider")?;
        info!(provider = embedder.name(), "Embedding provider ready");

        let bus: Arc<dyn frontdesk_cortex::EventBus> = Arc::new(event_bus.clone());
        let knowledge = Arc::new(StandardKnowledgeService::new(
            stores.knowledge.clone(),
            embedder.clone(),
            bus.clone(),
        ));
        let matcher = Arc::new(
            KnowledgeMatcher::new(stores.knowledge.clone(), embedder.clone(), bus).with_thresholds(MatchThresholds {
                match_threshold: config.spec.knowledge.match_threshold,
                lexical_threshold: config.spec.knowledge.lexical_threshold,
            }),
        );
        let help_desk = Arc::new(HelpDeskService::new(
            stores.escalations.clone(),
            knowledge.clone(),
            matcher.clone(),
        ));

        Ok(Self {
            config,
            event_bus,
            stores,
            embedder,
            knowledge,
            matcher,
            help_desk,
        })
    }

    pub fn router(&self) -> Result<Router> {
        let state = Arc::new(AppState::new(self.help_desk.clone(), self.event_bus.clone()));
        app(state, &self.config.spec.network.cors_allowed_origins)
    }

    /// Background backfill task, if enabled
    pub fn backfill_sweeper(&self, shutdown: CancellationToken) -> Option<Arc<BackfillSweeper>> {
        let backfill = &self.config.spec.knowledge.backfill;
        if !backfill.enabled {
            return None;
        }

        let config = BackfillSweeperConfig {
            interval_seconds: backfill.interval_seconds,
            enabled: backfill.enabled,
        };
        Some(Arc::new(
            BackfillSweeper::new(self.knowledge.clone(), Arc::new(self.event_bus.clone()), config)
                .with_shutdown_token(shutdown),
        ))
    }

    /// Coordinator filing through `backend` and watching the local store
    pub fn coordinator(&self, backend: Arc<dyn EscalationBackend>, shutdown: CancellationToken) -> EscalationCoordinator {
        EscalationCoordinator::new(backend, self.stores.escalations.clone())
            .with_max_wait(Duration::from_secs(self.config.spec.escalation.max_wait_seconds))
            .with_shutdown_token(shutdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_config() -> FrontdeskConfigManifest {
        let mut config = FrontdeskConfigManifest::default();
        config.spec.embedding.provider_type = "hash".to_string();
        config.spec.embedding.api_key = None;
        config
    }

    #[tokio::test]
    async fn test_services_from_offline_config() {
        let services = EmbeddedServices::from_config(offline_config()).unwrap();
        assert_eq!(services.embedder.name(), "hash");
        assert!(services.router().is_ok());
        assert!(services.backfill_sweeper(CancellationToken::new()).is_some());
    }

    #[tokio::test]
    async fn test_thresholds_come_from_config() {
        let mut config = offline_config();
        config.spec.knowledge.match_threshold = 0.8;
        config.spec.knowledge.backfill.enabled = false;

        let services = EmbeddedServices::from_config(config).unwrap();
        assert_eq!(services.matcher.thresholds().match_threshold, 0.8);
        assert!(services.backfill_sweeper(CancellationToken::new()).is_none());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = offline_config();
        config.spec.storage.backend = "sled".to_string();
        assert!(EmbeddedServices::from_config(config).is_err());
    }
}

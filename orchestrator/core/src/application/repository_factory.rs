// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Repository Factory - Application Layer
//!
//! Creates concrete repository implementations based on storage backend
//! configuration. The domain layer only sees the traits; this is the one place
//! that knows which adapters exist.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Select escalation and knowledge storage adapters

use anyhow::Context;
use frontdesk_cortex::{InMemoryKnowledgeStore, KnowledgeStore, SledKnowledgeStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::domain::config::StorageConfig;
use crate::domain::repository::{EscalationRepository, SledConfig, StorageBackend};
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::repositories::{InMemoryEscalationRepository, SledEscalationRepository};

/// Repositories sharing one storage backend
#[derive(Clone)]
pub struct Stores {
    pub escalations: Arc<dyn EscalationRepository>,
    pub knowledge: Arc<dyn KnowledgeStore>,
}

/// Translate the storage section of the manifest into a backend choice
pub fn storage_backend_from_config(config: &StorageConfig) -> anyhow::Result<StorageBackend> {
    match config.backend.as_str() {
        "memory" => Ok(StorageBackend::InMemory),
        "sled" => {
            let path = config
                .path
                .as_deref()
                .filter(|p| !p.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("spec.storage.path is required for the sled backend"))?;
            Ok(StorageBackend::Sled(SledConfig {
                path: PathBuf::from(path),
            }))
        }
        other => anyhow::bail!("Unknown storage backend: {}", other),
    }
}

/// Creates the escalation and knowledge repositories for the configured backend
pub fn create_stores(backend: &StorageBackend, event_bus: EventBus) -> anyhow::Result<Stores> {
    match backend {
        StorageBackend::InMemory => {
            info!("Using in-memory storage (data is lost on restart)");
            Ok(Stores {
                escalations: Arc::new(InMemoryEscalationRepository::new(event_bus)),
                knowledge: Arc::new(InMemoryKnowledgeStore::new()),
            })
        }
        StorageBackend::Sled(config) => {
            info!(path = %config.path.display(), "Opening sled storage");
            let db = sled::open(&config.path)
                .with_context(|| format!("Failed to open sled database at {}", config.path.display()))?;
            Ok(Stores {
                escalations: Arc::new(SledEscalationRepository::new(db.clone(), event_bus)?),
                knowledge: Arc::new(SledKnowledgeStore::from_db(db)?),
            })
        }
    }
}

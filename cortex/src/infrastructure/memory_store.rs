// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-memory knowledge store for development and tests

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::{KnowledgeEntry, KnowledgeEntryId, KnowledgeEntryPatch};
use crate::infrastructure::repository::{KnowledgeStore, StoreError};

/// Vec-backed store; keeps insertion order so scans are deterministic
#[derive(Clone, Default)]
pub struct InMemoryKnowledgeStore {
    entries: Arc<RwLock<Vec<KnowledgeEntry>>>,
}

impl InMemoryKnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing entries
    pub fn with_entries(entries: Vec<KnowledgeEntry>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(entries)),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    async fn list_all(&self) -> Result<Vec<KnowledgeEntry>, StoreError> {
        Ok(self.entries.read().await.clone())
    }

    async fn get(&self, id: KnowledgeEntryId) -> Result<Option<KnowledgeEntry>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.iter().find(|e| e.id == id).cloned())
    }

    async fn update(&self, id: KnowledgeEntryId, patch: KnowledgeEntryPatch) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        patch.apply(entry);
        Ok(())
    }

    async fn append(&self, entry: KnowledgeEntry) -> Result<KnowledgeEntryId, StoreError> {
        let mut entries = self.entries.write().await;
        if entries.iter().any(|e| e.id == entry.id) {
            return Err(StoreError::AlreadyExists(entry.id.to_string()));
        }
        let id = entry.id;
        entries.push(entry);
        Ok(id)
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Shared test doubles for the cortex unit tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::application::EventBus;
use crate::domain::{CortexEvent, EmbeddingError, EmbeddingProvider, KnowledgeEntry, KnowledgeEntryId, KnowledgeEntryPatch};
use crate::infrastructure::{KnowledgeStore, StoreError};

/// Embedder that returns pre-registered vectors and counts every call.
/// Unknown text fails with a network error.
#[derive(Default)]
pub struct ScriptedEmbedder {
    vectors: Mutex<HashMap<String, Vec<f32>>>,
    calls: AtomicUsize,
}

impl ScriptedEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.lock().unwrap().insert(text.to_string(), vector);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for ScriptedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.vectors
            .lock()
            .unwrap()
            .get(text)
            .cloned()
            .ok_or_else(|| EmbeddingError::Network(format!("no vector scripted for {:?}", text)))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub struct MockEventBus {
    events: Arc<Mutex<Vec<CortexEvent>>>,
}

impl MockEventBus {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn get_events(&self) -> Vec<CortexEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn event_types(&self) -> Vec<&'static str> {
        self.get_events().iter().map(|e| e.event_type()).collect()
    }
}

#[async_trait]
impl EventBus for MockEventBus {
    async fn publish(&self, event: CortexEvent) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// Store whose reads and writes always fail
pub struct UnavailableStore;

#[async_trait]
impl KnowledgeStore for UnavailableStore {
    async fn list_all(&self) -> Result<Vec<KnowledgeEntry>, StoreError> {
        Err(StoreError::Database("connection refused".into()))
    }

    async fn get(&self, _id: KnowledgeEntryId) -> Result<Option<KnowledgeEntry>, StoreError> {
        Err(StoreError::Database("connection refused".into()))
    }

    async fn update(&self, _id: KnowledgeEntryId, _patch: KnowledgeEntryPatch) -> Result<(), StoreError> {
        Err(StoreError::Database("connection refused".into()))
    }

    async fn append(&self, _entry: KnowledgeEntry) -> Result<KnowledgeEntryId, StoreError> {
        Err(StoreError::Database("connection refused".into()))
    }
}

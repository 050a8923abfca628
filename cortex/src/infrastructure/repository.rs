// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository interface for the knowledge base
//! Defines the narrow contract the matcher and the escalation workflow depend on

use async_trait::async_trait;
use crate::domain::{KnowledgeEntry, KnowledgeEntryId, KnowledgeEntryPatch};

/// Durable collection of question/answer entries
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Snapshot of every entry, in insertion order
    async fn list_all(&self) -> Result<Vec<KnowledgeEntry>, StoreError>;

    /// Find an entry by its ID
    async fn get(&self, id: KnowledgeEntryId) -> Result<Option<KnowledgeEntry>, StoreError>;

    /// Apply a partial update (embedding backfill)
    async fn update(&self, id: KnowledgeEntryId, patch: KnowledgeEntryPatch) -> Result<(), StoreError>;

    /// Append a new entry; never overwrites an existing one
    async fn append(&self, entry: KnowledgeEntry) -> Result<KnowledgeEntryId, StoreError>;
}

/// Knowledge store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("Entry already exists: {0}")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Sled Knowledge Store
//!
//! Embedded, durable knowledge base backed by `sled`.
//!
//! Entries live in the `knowledge_base` tree keyed by a monotonic sequence
//! number (big-endian, so iteration order is insertion order). A second tree,
//! `knowledge_index`, maps entry IDs to their sequence key.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Implements KnowledgeStore on local disk

use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

use crate::domain::{KnowledgeEntry, KnowledgeEntryId, KnowledgeEntryPatch};
use crate::infrastructure::repository::{KnowledgeStore, StoreError};

const ENTRIES_TREE: &str = "knowledge_base";
const INDEX_TREE: &str = "knowledge_index";

#[derive(Clone)]
pub struct SledKnowledgeStore {
    db: sled::Db,
    entries: sled::Tree,
    index: sled::Tree,
}

impl SledKnowledgeStore {
    /// Open (or create) the store at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = sled::open(path.as_ref())?;
        Self::from_db(db)
    }

    /// Share an already open database (e.g. with the escalation store)
    pub fn from_db(db: sled::Db) -> Result<Self, StoreError> {
        let entries = db.open_tree(ENTRIES_TREE)?;
        let index = db.open_tree(INDEX_TREE)?;
        Ok(Self { db, entries, index })
    }

    fn sequence_key(&self, id: KnowledgeEntryId) -> Result<Option<sled::IVec>, StoreError> {
        Ok(self.index.get(id.0.as_bytes())?)
    }
}

#[async_trait]
impl KnowledgeStore for SledKnowledgeStore {
    async fn list_all(&self) -> Result<Vec<KnowledgeEntry>, StoreError> {
        let mut all = Vec::with_capacity(self.entries.len());
        for item in self.entries.iter() {
            let (_, value) = item?;
            all.push(serde_json::from_slice(&value)?);
        }
        Ok(all)
    }

    async fn get(&self, id: KnowledgeEntryId) -> Result<Option<KnowledgeEntry>, StoreError> {
        let Some(key) = self.sequence_key(id)? else {
            return Ok(None);
        };
        match self.entries.get(key)? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, id: KnowledgeEntryId, patch: KnowledgeEntryPatch) -> Result<(), StoreError> {
        let key = self
            .sequence_key(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let value = self
            .entries
            .get(&key)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let mut entry: KnowledgeEntry = serde_json::from_slice(&value)?;
        patch.apply(&mut entry);
        self.entries.insert(key, serde_json::to_vec(&entry)?)?;
        self.db.flush_async().await?;
        Ok(())
    }

    async fn append(&self, entry: KnowledgeEntry) -> Result<KnowledgeEntryId, StoreError> {
        let key = self.db.generate_id()?.to_be_bytes();
        let claimed = self
            .index
            .compare_and_swap(entry.id.0.as_bytes(), None as Option<&[u8]>, Some(&key[..]))?;
        if claimed.is_err() {
            return Err(StoreError::AlreadyExists(entry.id.to_string()));
        }

        self.entries.insert(key, serde_json::to_vec(&entry)?)?;
        self.db.flush_async().await?;
        debug!(entry_id = %entry.id, "Appended knowledge entry");
        Ok(entry.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_append_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let entry = KnowledgeEntry::new("What time do you close on Fridays?", "We close at 9 PM on Fridays")
            .with_source_escalation("req-1")
            .with_embeddings(Some(vec![0.1, 0.2]), None);
        let id = entry.id;

        {
            let store = SledKnowledgeStore::open(dir.path()).unwrap();
            store.append(entry.clone()).await.unwrap();
        }

        let store = SledKnowledgeStore::open(dir.path()).unwrap();
        let loaded = store.get(id).await.unwrap().unwrap();
        assert_eq!(loaded, entry);
    }

    #[tokio::test]
    async fn test_list_all_in_insertion_order() {
        let dir = TempDir::new().unwrap();
        let store = SledKnowledgeStore::open(dir.path()).unwrap();

        let mut ids = Vec::new();
        for i in 0..5 {
            ids.push(store.append(KnowledgeEntry::new(format!("q{i}"), "a")).await.unwrap());
        }

        let listed: Vec<_> = store.list_all().await.unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn test_duplicate_append_rejected() {
        let dir = TempDir::new().unwrap();
        let store = SledKnowledgeStore::open(dir.path()).unwrap();
        let entry = KnowledgeEntry::new("q", "a");

        store.append(entry.clone()).await.unwrap();
        let err = store.append(entry).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_backfills_embedding() {
        let dir = TempDir::new().unwrap();
        let store = SledKnowledgeStore::open(dir.path()).unwrap();
        let id = store.append(KnowledgeEntry::new("q", "a")).await.unwrap();

        store
            .update(id, KnowledgeEntryPatch::content_embedding(vec![1.0, 0.0]))
            .await
            .unwrap();

        let entry = store.get(id).await.unwrap().unwrap();
        assert_eq!(entry.content_embedding, Some(vec![1.0, 0.0]));
        assert!(entry.question_embedding.is_none());
    }

    #[tokio::test]
    async fn test_get_missing_entry() {
        let dir = TempDir::new().unwrap();
        let store = SledKnowledgeStore::open(dir.path()).unwrap();
        assert!(store.get(KnowledgeEntryId::new()).await.unwrap().is_none());
    }
}

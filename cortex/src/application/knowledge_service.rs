// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # KnowledgeService - Knowledge Base Growth
//!
//! Application service that turns resolved escalations into reusable
//! knowledge entries and repairs entries that lack vectors.
//!
//! ## Growth
//!
//! Each resolution `{question, answer}` becomes a new entry with two
//! independently computed embeddings:
//!
//! - `question_embedding` of the bare question
//! - `content_embedding` of `"Question: …\nAnswer: …"`
//!
//! Either embedding may fail; the entry is stored with whatever succeeded.
//! Entries are append-only, so asking the same question twice grows the
//! knowledge base twice.
//!
//! ## Backfill
//!
//! [`KnowledgeService::backfill_missing`] embeds every entry that has no
//! usable vector. The matcher does the same lazily per query; this path
//! lets the [`BackfillSweeper`](super::BackfillSweeper) do it ahead of time.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::{combined_text, CortexEvent, EmbeddingProvider, KnowledgeEntry, KnowledgeEntryId, KnowledgeEntryPatch};
use crate::infrastructure::{KnowledgeStore, StoreError};

/// Event bus trait for publishing domain events
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, event: CortexEvent) -> anyhow::Result<()>;
}

/// Outcome of one backfill pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub backfilled: usize,
    pub failed: usize,
}

/// KnowledgeService interface
#[async_trait]
pub trait KnowledgeService: Send + Sync {
    /// Append a knowledge entry for a resolved escalation.
    /// Returns `None` when the question or answer is blank.
    async fn record_resolution(
        &self,
        question: &str,
        answer: &str,
        source_escalation_id: Option<String>,
    ) -> Result<Option<KnowledgeEntryId>, StoreError>;

    /// All entries, newest first
    async fn list_entries(&self) -> Result<Vec<KnowledgeEntry>, StoreError>;

    /// Embed and persist vectors for entries that have none
    async fn backfill_missing(&self) -> Result<BackfillReport, StoreError>;
}

/// Standard implementation of KnowledgeService
pub struct StandardKnowledgeService {
    store: Arc<dyn KnowledgeStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    event_bus: Arc<dyn EventBus>,
}

impl StandardKnowledgeService {
    pub fn new(
        store: Arc<dyn KnowledgeStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        event_bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            store,
            embedder,
            event_bus,
        }
    }

    async fn embed_or_log(&self, text: &str, kind: &'static str) -> Option<Vec<f32>> {
        match self.embedder.embed(text).await {
            Ok(vector) if !vector.is_empty() => Some(vector),
            Ok(_) => {
                warn!(kind, provider = self.embedder.name(), "Embedding provider returned an empty vector");
                None
            }
            Err(e) => {
                warn!(kind, provider = self.embedder.name(), error = %e, "Failed to compute embedding");
                None
            }
        }
    }

    async fn publish(&self, event: CortexEvent) {
        if let Err(e) = self.event_bus.publish(event).await {
            warn!("Failed to publish cortex event: {}", e);
        }
    }
}

#[async_trait]
impl KnowledgeService for StandardKnowledgeService {
    async fn record_resolution(
        &self,
        question: &str,
        answer: &str,
        source_escalation_id: Option<String>,
    ) -> Result<Option<KnowledgeEntryId>, StoreError> {
        let (question, answer) = (question.trim(), answer.trim());
        if question.is_empty() || answer.is_empty() {
            debug!("Skipping knowledge growth for blank question or answer");
            return Ok(None);
        }

        let content = combined_text(question, answer);
        let (question_embedding, content_embedding) = tokio::join!(
            self.embed_or_log(question, "question"),
            self.embed_or_log(&content, "content"),
        );

        let mut entry = KnowledgeEntry::new(question, answer)
            .with_embeddings(question_embedding, content_embedding);
        if let Some(source) = source_escalation_id {
            entry = entry.with_source_escalation(source);
        }

        let event = CortexEvent::KnowledgeEntryRecorded {
            entry_id: entry.id,
            source_escalation_id: entry.source_escalation_id.clone(),
            has_question_embedding: entry.question_embedding.is_some(),
            has_content_embedding: entry.content_embedding.is_some(),
            timestamp: Utc::now(),
        };

        let id = self.store.append(entry).await?;
        metrics::counter!("frontdesk_knowledge_entries_recorded_total").increment(1);
        info!(entry_id = %id, "Recorded knowledge entry from resolved escalation");
        self.publish(event).await;

        Ok(Some(id))
    }

    async fn list_entries(&self) -> Result<Vec<KnowledgeEntry>, StoreError> {
        let mut entries = self.store.list_all().await?;
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    async fn backfill_missing(&self) -> Result<BackfillReport, StoreError> {
        let mut report = BackfillReport::default();

        for entry in self.store.list_all().await? {
            if entry.has_embedding() {
                continue;
            }
            let Some(text) = entry.fallback_text() else {
                continue;
            };
            let Some(vector) = self.embed_or_log(&text, "backfill").await else {
                report.failed += 1;
                continue;
            };

            let dimensions = vector.len();
            match self
                .store
                .update(entry.id, KnowledgeEntryPatch::content_embedding(vector))
                .await
            {
                Ok(()) => {
                    report.backfilled += 1;
                    metrics::counter!("frontdesk_knowledge_backfills_total").increment(1);
                    self.publish(CortexEvent::EmbeddingBackfilled {
                        entry_id: entry.id,
                        dimensions,
                        timestamp: Utc::now(),
                    })
                    .await;
                }
                Err(e) => {
                    warn!(entry_id = %entry.id, error = %e, "Failed to persist backfilled embedding");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

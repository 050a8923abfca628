// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Knowledge Matcher
//!
//! Decides, per incoming query, whether a previously answered question is
//! close enough to reuse.
//!
//! ## Algorithm
//!
//! 1. Embed the query. A zero-norm query vector carries no signal and yields
//!    no match without scanning the store.
//! 2. Take a snapshot of every entry. Each entry is compared through its
//!    [`search_vector`](crate::domain::KnowledgeEntry::search_vector). Entries
//!    without one are backfilled: the fallback text is embedded, used for this
//!    comparison, and persisted in a detached task. Persistence is best-effort.
//! 3. Keep the single highest-cosine entry. Ties keep the first entry seen.
//! 4. Accept when the cosine reaches `match_threshold`, otherwise when the
//!    lexical similarity between the query and the best entry's question
//!    reaches `lexical_threshold`.
//! 5. An accepted entry with an empty answer is never returned.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Semantic-plus-lexical retrieval over the knowledge base

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::application::EventBus;
use crate::domain::{
    cosine, lexical, normalize, similarity::norm, AcceptanceReason, CortexEvent, EmbeddingError,
    EmbeddingProvider, KnowledgeEntry, KnowledgeEntryPatch, SimilarityError,
};
use crate::infrastructure::{KnowledgeStore, StoreError};

pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.55;
pub const DEFAULT_LEXICAL_THRESHOLD: f64 = 0.6;

/// Acceptance thresholds, both in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchThresholds {
    pub match_threshold: f64,
    pub lexical_threshold: f64,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            lexical_threshold: DEFAULT_LEXICAL_THRESHOLD,
        }
    }
}

/// Best candidate for a query and whether it was accepted
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub entry: KnowledgeEntry,
    /// Cosine similarity between the query and the entry
    pub score: f64,
    pub accepted: bool,
    pub accepted_by: Option<AcceptanceReason>,
}

#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    #[error("Query embedding unavailable: {0}")]
    EmbeddingUnavailable(#[from] EmbeddingError),

    #[error("Knowledge store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

pub struct KnowledgeMatcher {
    store: Arc<dyn KnowledgeStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    event_bus: Arc<dyn EventBus>,
    thresholds: MatchThresholds,
}

impl KnowledgeMatcher {
    pub fn new(
        store: Arc<dyn KnowledgeStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        event_bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            store,
            embedder,
            event_bus,
            thresholds: MatchThresholds::default(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: MatchThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn thresholds(&self) -> MatchThresholds {
        self.thresholds
    }

    /// Accepted match for `query`, if any
    pub async fn resolve(&self, query: &str) -> Result<Option<MatchResult>, MatcherError> {
        Ok(self.evaluate(query).await?.filter(|m| m.accepted))
    }

    /// Best candidate for `query` with the acceptance decision, accepted or not.
    /// `None` when nothing could be compared.
    pub async fn evaluate(&self, query: &str) -> Result<Option<MatchResult>, MatcherError> {
        let query_vector = self.embedder.embed(query).await?;
        if norm(&query_vector) == 0.0 {
            debug!("Query embedding has zero norm, skipping knowledge scan");
            self.record_miss(None).await;
            return Ok(None);
        }

        let entries = self.store.list_all().await?;
        let mut best: Option<(KnowledgeEntry, f64)> = None;

        for entry in entries {
            let vector = match entry.search_vector() {
                Some(vector) => vector.to_vec(),
                None => match self.backfill(&entry).await {
                    Some(vector) => vector,
                    None => continue,
                },
            };

            if norm(&vector) == 0.0 {
                continue;
            }

            let score = match cosine(&query_vector, &vector) {
                Ok(score) => score,
                Err(SimilarityError::DimensionMismatch { left, right }) => {
                    warn!(
                        entry_id = %entry.id,
                        query_dimensions = left,
                        entry_dimensions = right,
                        "Skipping knowledge entry from a different embedding space"
                    );
                    continue;
                }
            };

            if best.as_ref().map_or(true, |(_, top)| score > *top) {
                best = Some((entry, score));
            }
        }

        let Some((entry, score)) = best else {
            self.record_miss(None).await;
            return Ok(None);
        };

        let accepted_by = self.accept(query, &entry, score);
        let accepted = accepted_by.is_some() && !entry.answer.trim().is_empty();

        if accepted {
            info!(entry_id = %entry.id, similarity = score, "Knowledge base match accepted");
            metrics::counter!("frontdesk_knowledge_lookups_total", "outcome" => "hit").increment(1);
            if let Some(reason) = accepted_by {
                self.publish(CortexEvent::KnowledgeMatched {
                    entry_id: entry.id,
                    similarity: score,
                    accepted_by: reason,
                    timestamp: Utc::now(),
                })
                .await;
            }
        } else {
            debug!(entry_id = %entry.id, similarity = score, "Best knowledge candidate rejected");
            self.record_miss(Some((&entry, score))).await;
        }

        Ok(Some(MatchResult {
            entry,
            score,
            accepted,
            accepted_by: accepted_by.filter(|_| accepted),
        }))
    }

    fn accept(&self, query: &str, entry: &KnowledgeEntry, score: f64) -> Option<AcceptanceReason> {
        if score >= self.thresholds.match_threshold {
            return Some(AcceptanceReason::Semantic);
        }

        // Lexical rescue only when both sides have text to compare
        if normalize(query).is_empty() || normalize(&entry.question).is_empty() {
            return None;
        }
        let ratio = lexical(query, &entry.question);
        if ratio >= self.thresholds.lexical_threshold {
            debug!(entry_id = %entry.id, lexical = ratio, "Accepted on lexical similarity");
            return Some(AcceptanceReason::Lexical);
        }
        None
    }

    /// Embed an entry's fallback text for this comparison and persist it in
    /// the background.
    async fn backfill(&self, entry: &KnowledgeEntry) -> Option<Vec<f32>> {
        let text = entry.fallback_text()?;
        let vector = match self.embedder.embed(&text).await {
            Ok(vector) if !vector.is_empty() => vector,
            Ok(_) => return None,
            Err(e) => {
                warn!(entry_id = %entry.id, error = %e, "Failed to backfill knowledge entry embedding");
                return None;
            }
        };

        let store = self.store.clone();
        let event_bus = self.event_bus.clone();
        let id = entry.id;
        let patch = KnowledgeEntryPatch::content_embedding(vector.clone());
        let dimensions = vector.len();
        tokio::spawn(async move {
            match store.update(id, patch).await {
                Ok(()) => {
                    metrics::counter!("frontdesk_knowledge_backfills_total").increment(1);
                    debug!(entry_id = %id, dimensions, "Persisted backfilled embedding");
                    let event = CortexEvent::EmbeddingBackfilled {
                        entry_id: id,
                        dimensions,
                        timestamp: Utc::now(),
                    };
                    if let Err(e) = event_bus.publish(event).await {
                        warn!("Failed to publish cortex event: {}", e);
                    }
                }
                Err(e) => warn!(entry_id = %id, error = %e, "Failed to persist backfilled embedding"),
            }
        });

        Some(vector)
    }

    async fn record_miss(&self, best: Option<(&KnowledgeEntry, f64)>) {
        metrics::counter!("frontdesk_knowledge_lookups_total", "outcome" => "miss").increment(1);
        self.publish(CortexEvent::KnowledgeMissed {
            best_entry_id: best.map(|(entry, _)| entry.id),
            best_similarity: best.map(|(_, score)| score),
            timestamp: Utc::now(),
        })
        .await;
    }

    async fn publish(&self, event: CortexEvent) {
        if let Err(e) = self.event_bus.publish(event).await {
            warn!("Failed to publish cortex event: {}", e);
        }
    }
}

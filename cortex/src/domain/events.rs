// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Domain events for the Cortex bounded context
//! Published whenever the knowledge base learns, heals or answers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use super::knowledge::KnowledgeEntryId;

/// Cortex domain events
/// These events are published to the EventBus for observability and the supervisor dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CortexEvent {
    /// A resolved escalation was turned into a new knowledge entry
    KnowledgeEntryRecorded {
        entry_id: KnowledgeEntryId,
        source_escalation_id: Option<String>,
        has_question_embedding: bool,
        has_content_embedding: bool,
        timestamp: DateTime<Utc>,
    },

    /// A missing embedding was computed for an existing entry
    EmbeddingBackfilled {
        entry_id: KnowledgeEntryId,
        dimensions: usize,
        timestamp: DateTime<Utc>,
    },

    /// A query was answered from the knowledge base
    KnowledgeMatched {
        entry_id: KnowledgeEntryId,
        similarity: f64,
        accepted_by: AcceptanceReason,
        timestamp: DateTime<Utc>,
    },

    /// No stored answer was close enough to reuse
    KnowledgeMissed {
        best_entry_id: Option<KnowledgeEntryId>,
        best_similarity: Option<f64>,
        timestamp: DateTime<Utc>,
    },

    /// Backfill sweep finished
    BackfillSweepCompleted {
        backfilled: usize,
        failed: usize,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
}

/// Which rule accepted a knowledge match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptanceReason {
    /// Cosine similarity met the match threshold
    Semantic,
    /// Normalized text similarity met the lexical threshold
    Lexical,
}

impl CortexEvent {
    /// Get the timestamp of the event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            CortexEvent::KnowledgeEntryRecorded { timestamp, .. } => *timestamp,
            CortexEvent::EmbeddingBackfilled { timestamp, .. } => *timestamp,
            CortexEvent::KnowledgeMatched { timestamp, .. } => *timestamp,
            CortexEvent::KnowledgeMissed { timestamp, .. } => *timestamp,
            CortexEvent::BackfillSweepCompleted { timestamp, .. } => *timestamp,
        }
    }

    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            CortexEvent::KnowledgeEntryRecorded { .. } => "knowledge_entry_recorded",
            CortexEvent::EmbeddingBackfilled { .. } => "embedding_backfilled",
            CortexEvent::KnowledgeMatched { .. } => "knowledge_matched",
            CortexEvent::KnowledgeMissed { .. } => "knowledge_missed",
            CortexEvent::BackfillSweepCompleted { .. } => "backfill_sweep_completed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = CortexEvent::KnowledgeMatched {
            entry_id: KnowledgeEntryId::new(),
            similarity: 0.71,
            accepted_by: AcceptanceReason::Semantic,
            timestamp: Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "knowledge_matched");
        assert_eq!(json["accepted_by"], "semantic");

        let deserialized: CortexEvent = serde_json::from_value(json).unwrap();
        assert_eq!(event.event_type(), deserialized.event_type());
    }
}

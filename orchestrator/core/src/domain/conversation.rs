// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Conversation port: where answers are injected into a live session

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::escalation::EscalationId;

/// A message appended to the conversation's chat context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMessage {
    pub role: String,
    pub content: String,
}

impl ContextMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Context quoting a trusted answer from the knowledge base
    pub fn knowledge_answer(query: &str, answer: &str) -> Self {
        Self::system(format!(
            "ADDITIONAL CONTEXT: The user asked '{}'. A similar question was answered before. \
             The trusted answer is: '{}' Use this answer to respond to the user.",
            query, answer
        ))
    }

    /// Context carrying a supervisor's answer to an escalation
    pub fn supervisor_answer(answer: &str) -> Self {
        Self::system(format!(
            "ADDITIONAL CONTEXT: The supervisor has provided this answer: '{}'. \
             You must use this information to answer the user's question.",
            answer
        ))
    }
}

/// What the receptionist says aloud when a supervisor answer arrives
pub fn supervisor_update_speech(answer: &str) -> String {
    format!("I have an update from my supervisor. {}", answer)
}

#[derive(Debug, thiserror::Error)]
pub enum ConversationError {
    #[error("Conversation closed")]
    Closed,

    #[error("Conversation sink failed: {0}")]
    Sink(String),
}

/// Receives context and speech for one live conversation.
/// Appends are observed in call order.
#[async_trait]
pub trait ConversationContextSink: Send + Sync {
    async fn append_context(&self, message: ContextMessage) -> Result<(), ConversationError>;

    async fn say(&self, text: &str) -> Result<(), ConversationError>;
}

/// Escalations a conversation is still waiting on, keyed by request id
#[derive(Debug, Clone, Default)]
pub struct PendingEscalations {
    inner: Arc<Mutex<HashMap<EscalationId, String>>>,
}

impl PendingEscalations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&self, id: EscalationId, query: impl Into<String>) {
        self.inner.lock().insert(id, query.into());
    }

    /// Returns the tracked query, if the id was pending
    pub fn remove(&self, id: &EscalationId) -> Option<String> {
        self.inner.lock().remove(id)
    }

    pub fn contains(&self, id: &EscalationId) -> bool {
        self.inner.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn ids(&self) -> Vec<EscalationId> {
        self.inner.lock().keys().copied().collect()
    }
}

/// Handle to one live conversation
#[derive(Clone)]
pub struct Conversation {
    pub room_id: String,
    pub participant_id: Option<String>,
    pub sink: Arc<dyn ConversationContextSink>,
    pub pending: PendingEscalations,
}

impl Conversation {
    pub fn new(
        room_id: impl Into<String>,
        participant_id: Option<String>,
        sink: Arc<dyn ConversationContextSink>,
    ) -> Self {
        Self {
            room_id: room_id.into(),
            participant_id,
            sink,
            pending: PendingEscalations::new(),
        }
    }
}

impl std::fmt::Debug for Conversation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conversation")
            .field("room_id", &self.room_id)
            .field("participant_id", &self.participant_id)
            .field("pending", &self.pending.len())
            .finish()
    }
}

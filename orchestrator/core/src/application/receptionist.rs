// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Receptionist turn handling
//!
//! Glue between one live conversation, the knowledge matcher and the
//! escalation coordinator. Each user turn is first checked against the
//! knowledge base; a trusted answer is injected as context. When nothing
//! matches, the agent may call [`Receptionist::request_human_supervisor`],
//! which never blocks on the supervisor.

use frontdesk_cortex::{KnowledgeMatcher, MatchResult};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::application::escalation_coordinator::EscalationCoordinator;
use crate::domain::conversation::{ContextMessage, Conversation};
use crate::domain::escalation::{ChatMessage, ESCALATION_ACKNOWLEDGMENT};

/// Result of checking a user turn against the knowledge base
#[derive(Debug)]
pub enum KnowledgeLookup {
    /// A trusted answer was injected into the conversation
    Answered(MatchResult),
    NoMatch,
    /// The lookup could not run; the turn proceeds without knowledge context
    Degraded(String),
}

impl KnowledgeLookup {
    pub fn is_answered(&self) -> bool {
        matches!(self, KnowledgeLookup::Answered(_))
    }
}

pub struct Receptionist {
    matcher: Arc<KnowledgeMatcher>,
    coordinator: Arc<EscalationCoordinator>,
    conversation: Conversation,
}

impl Receptionist {
    pub fn new(
        matcher: Arc<KnowledgeMatcher>,
        coordinator: Arc<EscalationCoordinator>,
        conversation: Conversation,
    ) -> Self {
        Self {
            matcher,
            coordinator,
            conversation,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Check the knowledge base before the agent replies
    pub async fn on_user_turn(&self, text: &str) -> KnowledgeLookup {
        if text.trim().is_empty() {
            return KnowledgeLookup::NoMatch;
        }

        let matched = match self.matcher.resolve(text).await {
            Ok(Some(matched)) => matched,
            Ok(None) => {
                debug!(room_id = %self.conversation.room_id, "No knowledge base match for user turn");
                return KnowledgeLookup::NoMatch;
            }
            Err(e) => {
                metrics::counter!("frontdesk_knowledge_lookups_total", "outcome" => "degraded").increment(1);
                warn!(error = %e, "Knowledge lookup failed, continuing without it");
                return KnowledgeLookup::Degraded(e.to_string());
            }
        };

        let context = ContextMessage::knowledge_answer(text, &matched.entry.answer);
        if let Err(e) = self.conversation.sink.append_context(context).await {
            warn!(error = %e, "Failed to inject knowledge base answer");
        }
        info!(
            entry_id = %matched.entry.id,
            similarity = matched.score,
            "Answered from knowledge base"
        );
        KnowledgeLookup::Answered(matched)
    }

    /// Escalate `question` and return what to tell the caller right away.
    /// The supervisor's answer is delivered later by a detached wait.
    pub async fn request_human_supervisor(&self, question: &str, history: Vec<ChatMessage>) -> String {
        let created = self
            .coordinator
            .create(
                question,
                history,
                &self.conversation.room_id,
                self.conversation.participant_id.clone(),
            )
            .await;

        match created {
            Ok(id) => {
                self.conversation.pending.track(id, question);
                self.coordinator.spawn_resolution_wait(id, self.conversation.clone());
                ESCALATION_ACKNOWLEDGMENT.to_string()
            }
            Err(e) => e.user_message().to_string(),
        }
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Domain layer for the escalation bounded context

pub mod config;
pub mod conversation;
pub mod escalation;
pub mod events;
pub mod repository;

pub use conversation::{
    supervisor_update_speech, ContextMessage, Conversation, ConversationContextSink,
    ConversationError, PendingEscalations,
};
pub use escalation::{
    ChatMessage, EscalationBackend, EscalationError, EscalationId, EscalationReceipt,
    EscalationRequest, EscalationStateError, EscalationStatus, NewEscalation,
    ESCALATION_ACKNOWLEDGMENT,
};
pub use events::EscalationEvent;
pub use repository::{
    EscalationRepository, EscalationSubscription, RepositoryError, StorageBackend,
    SubscriptionError,
};

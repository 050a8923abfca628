// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contracts for the escalation aggregate. Interfaces live in the
//! domain layer and are implemented in `crate::infrastructure::repositories`.
//!
//! | Trait | Aggregate | Implementations |
//! |-------|-----------|----------------|
//! | `EscalationRepository` | `EscalationRequest` | `InMemoryEscalationRepository`, `SledEscalationRepository` |
//!
//! Knowledge entries are owned by `frontdesk_cortex::KnowledgeStore`.
//!
//! ## Change Notifications
//!
//! A coordinator waiting on a supervisor answer calls
//! [`EscalationRepository::subscribe`] and awaits
//! [`EscalationSubscription::next_change`]. Dropping a subscription
//! unsubscribes it; [`EscalationSubscription::unsubscribe`] makes that explicit.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::domain::escalation::{EscalationId, EscalationRequest, EscalationStatus};
use crate::domain::events::EscalationEvent;

/// Storage backend enum for pluggable persistence
#[derive(Debug, Clone)]
pub enum StorageBackend {
    InMemory,
    Sled(SledConfig),
}

#[derive(Debug, Clone)]
pub struct SledConfig {
    pub path: PathBuf,
}

/// Repository interface for EscalationRequest aggregates
#[async_trait]
pub trait EscalationRepository: Send + Sync {
    /// Save request (create or update) and notify subscribers of the change
    async fn save(&self, request: &EscalationRequest) -> Result<(), RepositoryError>;

    /// Find request by ID
    async fn find_by_id(&self, id: EscalationId) -> Result<Option<EscalationRequest>, RepositoryError>;

    /// List requests, optionally filtered by status, newest first
    async fn list(&self, status: Option<EscalationStatus>) -> Result<Vec<EscalationRequest>, RepositoryError>;

    /// Subscribe to changes of one request
    async fn subscribe(&self, id: EscalationId) -> Result<Box<dyn EscalationSubscription>, RepositoryError>;
}

/// Change feed for a single escalation request
#[async_trait]
pub trait EscalationSubscription: Send {
    /// Wait for the next change to the subscribed request
    async fn next_change(&mut self) -> Result<EscalationEvent, SubscriptionError>;

    /// Stop receiving changes
    fn unsubscribe(self: Box<Self>);
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubscriptionError {
    #[error("Change feed closed")]
    Closed,

    /// Changes were dropped; callers should re-read the request
    #[error("Subscription lagged by {0} changes")]
    Lagged(u64),
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

impl From<sled::Error> for RepositoryError {
    fn from(err: sled::Error) -> Self {
        RepositoryError::Database(err.to_string())
    }
}

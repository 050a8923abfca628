// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Escalation Domain
//!
//! A question the receptionist could not answer, filed for a human
//! supervisor. Requests are created `pending` and transition exactly once to
//! `resolved`, carrying the supervisor's non-empty answer.
//!
//! The wire shape (`originalQuery`, `livekitRoomId`, `requestId`, …) is the
//! one the supervisor dashboard and the help desk API speak.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Escalation aggregate, intake command and backend port

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EscalationId(pub Uuid);

impl EscalationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EscalationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EscalationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for EscalationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscalationStatus {
    Pending,
    Resolved,
}

impl std::fmt::Display for EscalationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EscalationStatus::Pending => write!(f, "pending"),
            EscalationStatus::Resolved => write!(f, "resolved"),
        }
    }
}

impl std::str::FromStr for EscalationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(EscalationStatus::Pending),
            "resolved" => Ok(EscalationStatus::Resolved),
            other => Err(format!("unknown escalation status '{}'", other)),
        }
    }
}

/// One turn of the conversation that led to the escalation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Intake command: what the receptionist sends when it escalates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEscalation {
    pub original_query: String,
    #[serde(default)]
    pub conversation_history: Vec<ChatMessage>,
    #[serde(rename = "livekitRoomId")]
    pub room_id: String,
    #[serde(rename = "livekitParticipantId", default)]
    pub participant_id: Option<String>,
}

/// Intake acknowledgment returned by the help desk API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationReceipt {
    pub request_id: EscalationId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationRequest {
    pub id: EscalationId,
    pub original_query: String,
    #[serde(default)]
    pub conversation_history: Vec<ChatMessage>,
    #[serde(rename = "livekitRoomId")]
    pub room_id: String,
    #[serde(rename = "livekitParticipantId", default)]
    pub participant_id: Option<String>,
    pub status: EscalationStatus,
    #[serde(default)]
    pub supervisor_response: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Invalid state transitions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EscalationStateError {
    #[error("Help request {0} is already resolved")]
    AlreadyResolved(EscalationId),

    #[error("A supervisor answer cannot be empty")]
    EmptyAnswer,
}

impl EscalationRequest {
    pub fn new(intake: NewEscalation) -> Self {
        Self {
            id: EscalationId::new(),
            original_query: intake.original_query,
            conversation_history: intake.conversation_history,
            room_id: intake.room_id,
            participant_id: intake.participant_id,
            status: EscalationStatus::Pending,
            supervisor_response: None,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == EscalationStatus::Pending
    }

    /// The single pending → resolved transition
    pub fn resolve(&mut self, answer: &str) -> Result<(), EscalationStateError> {
        if !self.is_pending() {
            return Err(EscalationStateError::AlreadyResolved(self.id));
        }
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(EscalationStateError::EmptyAnswer);
        }

        self.status = EscalationStatus::Resolved;
        self.supervisor_response = Some(answer.to_string());
        self.resolved_at = Some(Utc::now());
        Ok(())
    }

    /// The supervisor answer, present only once resolved
    pub fn answer(&self) -> Option<&str> {
        match self.status {
            EscalationStatus::Resolved => self.supervisor_response.as_deref(),
            EscalationStatus::Pending => None,
        }
    }
}

/// Failures filing an escalation with the help desk
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EscalationError {
    #[error("Help desk unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Help desk did not respond within {0}s")]
    BackendTimeout(u64),

    #[error("Help desk rejected the request{}: {message}", .status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    BackendRejected {
        status: Option<u16>,
        message: String,
    },
}

impl EscalationError {
    /// What the receptionist says instead of an acknowledgment. Never
    /// claims the supervisor was reached.
    pub fn user_message(&self) -> &'static str {
        match self {
            EscalationError::BackendUnavailable(_) => {
                "I can't connect to my supervisor right now. Please make sure the backend server is running."
            }
            EscalationError::BackendTimeout(_) => "My supervisor didn't respond in time. Please try again.",
            EscalationError::BackendRejected { status: Some(_), .. } => {
                "There was an error reaching my supervisor. Please try again."
            }
            EscalationError::BackendRejected { status: None, .. } => {
                "I've tried to reach my supervisor but didn't get a confirmation. Please try again."
            }
        }
    }
}

/// Said right after a request is filed
pub const ESCALATION_ACKNOWLEDGMENT: &str = "I don't have that information right now. I've contacted my supervisor and they'll get back to you shortly with an answer.";

/// Where escalations are filed
#[async_trait]
pub trait EscalationBackend: Send + Sync {
    async fn create(&self, request: NewEscalation) -> Result<EscalationId, EscalationError>;
}

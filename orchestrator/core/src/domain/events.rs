// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Escalation domain events
//! Published on every stored state change of a help request

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::escalation::{EscalationId, EscalationRequest, EscalationStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EscalationEvent {
    /// A new help request was filed
    Created {
        request_id: EscalationId,
        room_id: String,
        original_query: String,
        created_at: DateTime<Utc>,
    },

    /// A supervisor answered a help request
    Resolved {
        request_id: EscalationId,
        answer: String,
        resolved_at: DateTime<Utc>,
    },
}

impl EscalationEvent {
    /// The change a save represents, given the previously stored state
    pub fn for_transition(previous: Option<EscalationStatus>, current: &EscalationRequest) -> Option<Self> {
        match (previous, current.status) {
            (None, EscalationStatus::Pending) => Some(EscalationEvent::Created {
                request_id: current.id,
                room_id: current.room_id.clone(),
                original_query: current.original_query.clone(),
                created_at: current.created_at,
            }),
            (None | Some(EscalationStatus::Pending), EscalationStatus::Resolved) => {
                Some(EscalationEvent::Resolved {
                    request_id: current.id,
                    answer: current.supervisor_response.clone().unwrap_or_default(),
                    resolved_at: current.resolved_at.unwrap_or_else(Utc::now),
                })
            }
            _ => None,
        }
    }

    pub fn request_id(&self) -> EscalationId {
        match self {
            EscalationEvent::Created { request_id, .. } => *request_id,
            EscalationEvent::Resolved { request_id, .. } => *request_id,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            EscalationEvent::Created { .. } => "help_request_created",
            EscalationEvent::Resolved { .. } => "help_request_resolved",
        }
    }
}

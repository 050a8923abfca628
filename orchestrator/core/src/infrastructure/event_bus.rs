// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Event Bus Implementation - Pub/Sub for Domain Events
//
// Provides in-memory event streaming using tokio broadcast channels.
// Carries escalation changes to waiting coordinators and every event to the
// supervisor dashboard over SSE.
//
// In-memory only: events are lost on restart.

use async_trait::async_trait;
use frontdesk_cortex::application::EventBus as CortexEventBus;
use frontdesk_cortex::CortexEvent;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::domain::escalation::EscalationId;
use crate::domain::events::EscalationEvent;
use crate::domain::repository::{EscalationSubscription, SubscriptionError};

/// Unified domain event type for the event bus
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DomainEvent {
    Escalation(EscalationEvent),
    Knowledge(CortexEvent),
}

/// Event bus for publishing and subscribing to domain events
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    /// Capacity determines how many events can be buffered before dropping old ones
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Create event bus with default capacity (1000)
    pub fn with_default_capacity() -> Self {
        Self::new(1000)
    }

    pub fn publish_escalation_event(&self, event: EscalationEvent) {
        self.publish(DomainEvent::Escalation(event));
    }

    pub fn publish_knowledge_event(&self, event: CortexEvent) {
        self.publish(DomainEvent::Knowledge(event));
    }

    fn publish(&self, event: DomainEvent) {
        debug!("Publishing event: {:?}", event);

        // send() only fails when nobody is listening
        let receiver_count = self.sender.send(event).unwrap_or(0);
        if receiver_count == 0 {
            debug!("No subscribers listening to event");
        }
    }

    /// Subscribe to all domain events
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Subscribe to changes of a single escalation request
    pub fn subscribe_escalation(&self, request_id: EscalationId) -> EscalationEventReceiver {
        EscalationEventReceiver {
            receiver: self.sender.subscribe(),
            request_id,
        }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[async_trait]
impl CortexEventBus for EventBus {
    async fn publish(&self, event: CortexEvent) -> anyhow::Result<()> {
        self.publish_knowledge_event(event);
        Ok(())
    }
}

fn map_recv_error(e: broadcast::error::RecvError) -> EventBusError {
    match e {
        broadcast::error::RecvError::Closed => EventBusError::Closed,
        broadcast::error::RecvError::Lagged(n) => {
            warn!("Event receiver lagged by {} events", n);
            EventBusError::Lagged(n)
        }
    }
}

/// Receiver for all domain events
pub struct EventReceiver {
    receiver: broadcast::Receiver<DomainEvent>,
}

impl EventReceiver {
    /// Receive the next event
    pub async fn recv(&mut self) -> Result<DomainEvent, EventBusError> {
        self.receiver.recv().await.map_err(map_recv_error)
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Result<DomainEvent, EventBusError> {
        self.receiver.try_recv().map_err(|e| match e {
            broadcast::error::TryRecvError::Empty => EventBusError::Empty,
            broadcast::error::TryRecvError::Closed => EventBusError::Closed,
            broadcast::error::TryRecvError::Lagged(n) => {
                warn!("Event receiver lagged by {} events", n);
                EventBusError::Lagged(n)
            }
        })
    }
}

/// Receiver for one escalation request's events (filtered)
pub struct EscalationEventReceiver {
    receiver: broadcast::Receiver<DomainEvent>,
    request_id: EscalationId,
}

impl EscalationEventReceiver {
    /// Receive the next event for the subscribed request.
    /// Filters out events from other requests.
    pub async fn recv(&mut self) -> Result<EscalationEvent, EventBusError> {
        loop {
            let event = self.receiver.recv().await.map_err(map_recv_error)?;
            if let DomainEvent::Escalation(escalation_event) = event {
                if escalation_event.request_id() == self.request_id {
                    return Ok(escalation_event);
                }
            }
        }
    }
}

#[async_trait]
impl EscalationSubscription for EscalationEventReceiver {
    async fn next_change(&mut self) -> Result<EscalationEvent, SubscriptionError> {
        self.recv().await.map_err(|e| match e {
            EventBusError::Lagged(n) => SubscriptionError::Lagged(n),
            EventBusError::Closed | EventBusError::Empty => SubscriptionError::Closed,
        })
    }

    fn unsubscribe(self: Box<Self>) {
        debug!(request_id = %self.request_id, "Unsubscribing from escalation changes");
        drop(self);
    }
}

/// Errors that can occur when receiving events
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("No events available")]
    Empty,

    #[error("Receiver lagged by {0} events (events were dropped)")]
    Lagged(u64),
}

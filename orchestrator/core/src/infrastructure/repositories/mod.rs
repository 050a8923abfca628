// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the escalation repository defined in
//! the domain layer.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Persist and retrieve escalation requests
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! - **InMemoryEscalationRepository** - HashMap-backed, for development and tests
//! - **SledEscalationRepository** - Embedded on-disk storage
//!
//! Both publish an [`EscalationEvent`] on the shared [`EventBus`] whenever a
//! save changes a request's status; subscriptions are filtered views of that
//! bus.

pub mod sled_repository;

pub use sled_repository::SledEscalationRepository;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::escalation::{EscalationId, EscalationRequest, EscalationStatus};
use crate::domain::events::EscalationEvent;
use crate::domain::repository::{EscalationRepository, EscalationSubscription, RepositoryError};
use crate::infrastructure::event_bus::EventBus;

#[derive(Clone)]
pub struct InMemoryEscalationRepository {
    requests: Arc<RwLock<HashMap<EscalationId, EscalationRequest>>>,
    event_bus: EventBus,
}

impl InMemoryEscalationRepository {
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            requests: Arc::new(RwLock::new(HashMap::new())),
            event_bus,
        }
    }
}

#[async_trait]
impl EscalationRepository for InMemoryEscalationRepository {
    async fn save(&self, request: &EscalationRequest) -> Result<(), RepositoryError> {
        let previous = {
            let mut requests = self.requests.write();
            requests
                .insert(request.id, request.clone())
                .map(|old| old.status)
        };

        if let Some(event) = EscalationEvent::for_transition(previous, request) {
            self.event_bus.publish_escalation_event(event);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: EscalationId) -> Result<Option<EscalationRequest>, RepositoryError> {
        Ok(self.requests.read().get(&id).cloned())
    }

    async fn list(&self, status: Option<EscalationStatus>) -> Result<Vec<EscalationRequest>, RepositoryError> {
        let requests = self.requests.read();
        Ok(newest_first(
            requests
                .values()
                .filter(|r| status.map_or(true, |s| r.status == s))
                .cloned()
                .collect(),
        ))
    }

    async fn subscribe(&self, id: EscalationId) -> Result<Box<dyn EscalationSubscription>, RepositoryError> {
        Ok(Box::new(self.event_bus.subscribe_escalation(id)))
    }
}

pub(crate) fn newest_first(mut requests: Vec<EscalationRequest>) -> Vec<EscalationRequest> {
    requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    requests
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::escalation::NewEscalation;
    use chrono::{Duration, Utc};

    fn pending(query: &str) -> EscalationRequest {
        EscalationRequest::new(NewEscalation {
            original_query: query.to_string(),
            conversation_history: vec![],
            room_id: "room-1".to_string(),
            participant_id: None,
        })
    }

    #[tokio::test]
    async fn test_save_and_find() {
        let repo = InMemoryEscalationRepository::new(EventBus::new(10));
        let request = pending("Is parking free?");

        repo.save(&request).await.unwrap();
        assert_eq!(repo.find_by_id(request.id).await.unwrap(), Some(request));
        assert!(repo.find_by_id(EscalationId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters_and_sorts() {
        let repo = InMemoryEscalationRepository::new(EventBus::new(10));
        let mut old = pending("old");
        old.created_at = Utc::now() - Duration::minutes(5);
        let new = pending("new");
        let mut done = pending("done");
        done.resolve("answer").unwrap();
        for request in [&old, &new, &done] {
            repo.save(request).await.unwrap();
        }

        let pending_ids: Vec<_> = repo
            .list(Some(EscalationStatus::Pending))
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(pending_ids, vec![new.id, old.id]);

        let resolved = repo.list(Some(EscalationStatus::Resolved)).await.unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(repo.list(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_subscription_sees_resolution() {
        let repo = InMemoryEscalationRepository::new(EventBus::new(10));
        let mut request = pending("Do you do balayage?");
        repo.save(&request).await.unwrap();

        let mut subscription = repo.subscribe(request.id).await.unwrap();
        request.resolve("Yes, on weekdays").unwrap();
        repo.save(&request).await.unwrap();

        match subscription.next_change().await.unwrap() {
            EscalationEvent::Resolved { answer, .. } => assert_eq!(answer, "Yes, on weekdays"),
            other => panic!("unexpected change: {:?}", other),
        }
        subscription.unsubscribe();
    }

    #[tokio::test]
    async fn test_unchanged_save_is_silent() {
        let event_bus = EventBus::new(10);
        let repo = InMemoryEscalationRepository::new(event_bus.clone());
        let request = pending("q");
        repo.save(&request).await.unwrap();

        let mut receiver = event_bus.subscribe();
        repo.save(&request).await.unwrap();
        assert!(receiver.try_recv().is_err());
    }
}

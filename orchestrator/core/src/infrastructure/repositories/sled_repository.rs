// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Sled-backed escalation repository
//!
//! Requests are stored as JSON in the `help_requests` tree keyed by their
//! UUID bytes. The same `sled::Db` can be shared with the knowledge store.

use async_trait::async_trait;

use super::newest_first;
use crate::domain::escalation::{EscalationId, EscalationRequest, EscalationStatus};
use crate::domain::events::EscalationEvent;
use crate::domain::repository::{EscalationRepository, EscalationSubscription, RepositoryError};
use crate::infrastructure::event_bus::EventBus;

const HELP_REQUESTS_TREE: &str = "help_requests";

#[derive(Clone)]
pub struct SledEscalationRepository {
    db: sled::Db,
    requests: sled::Tree,
    event_bus: EventBus,
}

impl SledEscalationRepository {
    pub fn new(db: sled::Db, event_bus: EventBus) -> Result<Self, RepositoryError> {
        let requests = db.open_tree(HELP_REQUESTS_TREE)?;
        Ok(Self {
            db,
            requests,
            event_bus,
        })
    }
}

#[async_trait]
impl EscalationRepository for SledEscalationRepository {
    async fn save(&self, request: &EscalationRequest) -> Result<(), RepositoryError> {
        let previous = self
            .requests
            .insert(request.id.0.as_bytes(), serde_json::to_vec(request)?)?;
        self.db.flush_async().await?;

        let previous_status = match previous {
            Some(bytes) => Some(serde_json::from_slice::<EscalationRequest>(&bytes)?.status),
            None => None,
        };
        if let Some(event) = EscalationEvent::for_transition(previous_status, request) {
            self.event_bus.publish_escalation_event(event);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: EscalationId) -> Result<Option<EscalationRequest>, RepositoryError> {
        match self.requests.get(id.0.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, status: Option<EscalationStatus>) -> Result<Vec<EscalationRequest>, RepositoryError> {
        let mut requests = Vec::new();
        for item in self.requests.iter() {
            let (_, bytes) = item?;
            let request: EscalationRequest = serde_json::from_slice(&bytes)?;
            if status.map_or(true, |s| request.status == s) {
                requests.push(request);
            }
        }
        Ok(newest_first(requests))
    }

    async fn subscribe(&self, id: EscalationId) -> Result<Box<dyn EscalationSubscription>, RepositoryError> {
        Ok(Box::new(self.event_bus.subscribe_escalation(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::escalation::NewEscalation;
    use tempfile::TempDir;

    fn pending(query: &str) -> EscalationRequest {
        EscalationRequest::new(NewEscalation {
            original_query: query.to_string(),
            conversation_history: vec![],
            room_id: "room-1".to_string(),
            participant_id: Some("caller".to_string()),
        })
    }

    #[tokio::test]
    async fn test_requests_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let mut request = pending("What time do you close on Fridays?");
        request.resolve("We close at 9 PM on Fridays").unwrap();

        {
            let db = sled::open(dir.path()).unwrap();
            let repo = SledEscalationRepository::new(db, EventBus::new(10)).unwrap();
            repo.save(&request).await.unwrap();
        }

        let db = sled::open(dir.path()).unwrap();
        let repo = SledEscalationRepository::new(db, EventBus::new(10)).unwrap();
        assert_eq!(repo.find_by_id(request.id).await.unwrap(), Some(request));
    }

    #[tokio::test]
    async fn test_resolution_notifies_subscriber() {
        let dir = TempDir::new().unwrap();
        let db = sled::open(dir.path()).unwrap();
        let event_bus = EventBus::new(10);
        let repo = SledEscalationRepository::new(db, event_bus.clone()).unwrap();

        let mut request = pending("Do you sell gift cards?");
        repo.save(&request).await.unwrap();
        let mut subscription = repo.subscribe(request.id).await.unwrap();

        request.resolve("Yes").unwrap();
        repo.save(&request).await.unwrap();

        let change = subscription.next_change().await.unwrap();
        assert_eq!(change.event_type(), "help_request_resolved");
        subscription.unsubscribe();
        assert_eq!(event_bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_list_by_status() {
        let dir = TempDir::new().unwrap();
        let repo = SledEscalationRepository::new(sled::open(dir.path()).unwrap(), EventBus::new(10)).unwrap();

        let open = pending("a");
        let mut closed = pending("b");
        closed.resolve("done").unwrap();
        repo.save(&open).await.unwrap();
        repo.save(&closed).await.unwrap();

        let pending_only = repo.list(Some(EscalationStatus::Pending)).await.unwrap();
        assert_eq!(pending_only.len(), 1);
        assert_eq!(pending_only[0].id, open.id);
        assert_eq!(repo.list(None).await.unwrap().len(), 2);
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Help Desk Service
//!
//! Server side of the escalation workflow: files requests from the
//! receptionist, lists them for the supervisor dashboard, and resolves them.
//! Resolving a request marks it resolved (which notifies any waiting
//! coordinator through the repository's change feed) and then grows the
//! knowledge base from the question and the supervisor's answer.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Escalation use cases behind the help desk API

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use frontdesk_cortex::{
    AcceptanceReason, KnowledgeEntry, KnowledgeEntryId, KnowledgeMatcher, KnowledgeService,
    MatcherError, StoreError,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::escalation::{
    EscalationBackend, EscalationError, EscalationId, EscalationRequest, EscalationStateError,
    EscalationStatus, NewEscalation,
};
use crate::domain::repository::{EscalationRepository, RepositoryError};

/// Returned by a successful resolve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionReceipt {
    pub request_id: EscalationId,
    pub status: EscalationStatus,
    /// Absent when the question or answer was blank or the append failed
    pub knowledge_entry_id: Option<KnowledgeEntryId>,
}

/// Knowledge base listing row. Vectors are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeEntrySummary {
    pub id: KnowledgeEntryId,
    pub question: String,
    pub answer: String,
    pub source_request_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub has_question_embedding: bool,
    pub has_content_embedding: bool,
}

impl From<&KnowledgeEntry> for KnowledgeEntrySummary {
    fn from(entry: &KnowledgeEntry) -> Self {
        Self {
            id: entry.id,
            question: entry.question.clone(),
            answer: entry.answer.clone(),
            source_request_id: entry.source_escalation_id.clone(),
            created_at: entry.created_at,
            has_question_embedding: entry.question_embedding.as_ref().is_some_and(|v| !v.is_empty()),
            has_content_embedding: entry.content_embedding.as_ref().is_some_and(|v| !v.is_empty()),
        }
    }
}

/// Outcome of a knowledge lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDecision {
    pub matched: bool,
    /// Best cosine similarity, if any entry could be compared
    pub score: Option<f64>,
    /// Question of the best candidate
    pub question: Option<String>,
    /// Only present when matched
    pub answer: Option<String>,
    pub accepted_by: Option<AcceptanceReason>,
}

impl MatchDecision {
    fn no_candidate() -> Self {
        Self {
            matched: false,
            score: None,
            question: None,
            answer: None,
            accepted_by: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HelpDeskError {
    #[error("Help request not found: {0}")]
    NotFound(EscalationId),

    #[error("Help request {0} is already resolved")]
    AlreadyResolved(EscalationId),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Knowledge lookup unavailable: {0}")]
    Unavailable(String),
}

impl From<RepositoryError> for HelpDeskError {
    fn from(err: RepositoryError) -> Self {
        HelpDeskError::Storage(err.to_string())
    }
}

impl From<StoreError> for HelpDeskError {
    fn from(err: StoreError) -> Self {
        HelpDeskError::Storage(err.to_string())
    }
}

impl From<MatcherError> for HelpDeskError {
    fn from(err: MatcherError) -> Self {
        match err {
            MatcherError::EmbeddingUnavailable(e) => HelpDeskError::Unavailable(e.to_string()),
            MatcherError::StoreUnavailable(e) => HelpDeskError::Storage(e.to_string()),
        }
    }
}

pub struct HelpDeskService {
    repository: Arc<dyn EscalationRepository>,
    knowledge: Arc<dyn KnowledgeService>,
    matcher: Arc<KnowledgeMatcher>,
}

impl HelpDeskService {
    pub fn new(
        repository: Arc<dyn EscalationRepository>,
        knowledge: Arc<dyn KnowledgeService>,
        matcher: Arc<KnowledgeMatcher>,
    ) -> Self {
        Self {
            repository,
            knowledge,
            matcher,
        }
    }

    pub fn repository(&self) -> Arc<dyn EscalationRepository> {
        self.repository.clone()
    }

    /// File a new pending request
    pub async fn create(&self, intake: NewEscalation) -> Result<EscalationRequest, HelpDeskError> {
        if intake.original_query.trim().is_empty() {
            return Err(HelpDeskError::InvalidRequest("originalQuery is required".to_string()));
        }
        if intake.room_id.trim().is_empty() {
            return Err(HelpDeskError::InvalidRequest("livekitRoomId is required".to_string()));
        }

        let request = EscalationRequest::new(intake);
        self.repository.save(&request).await?;

        metrics::counter!("frontdesk_escalations_created_total").increment(1);
        info!(
            request_id = %request.id,
            room_id = %request.room_id,
            "Help request created"
        );
        Ok(request)
    }

    pub async fn get(&self, id: EscalationId) -> Result<EscalationRequest, HelpDeskError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(HelpDeskError::NotFound(id))
    }

    /// Requests newest first, optionally filtered by status
    pub async fn list(&self, status: Option<EscalationStatus>) -> Result<Vec<EscalationRequest>, HelpDeskError> {
        Ok(self.repository.list(status).await?)
    }

    /// Record the supervisor's answer, then grow the knowledge base.
    /// A failed knowledge append does not undo the resolution.
    pub async fn resolve(&self, id: EscalationId, answer: &str) -> Result<ResolutionReceipt, HelpDeskError> {
        let mut request = self.get(id).await?;
        request.resolve(answer).map_err(|e| match e {
            EscalationStateError::AlreadyResolved(id) => HelpDeskError::AlreadyResolved(id),
            EscalationStateError::EmptyAnswer => HelpDeskError::InvalidRequest(e.to_string()),
        })?;
        self.repository.save(&request).await?;

        metrics::counter!("frontdesk_escalations_resolved_total").increment(1);
        info!(request_id = %id, "Help request resolved");

        let answer = request.answer().unwrap_or_default();
        let knowledge_entry_id = match self
            .knowledge
            .record_resolution(&request.original_query, answer, Some(id.to_string()))
            .await
        {
            Ok(entry_id) => entry_id,
            Err(e) => {
                warn!(request_id = %id, error = %e, "Failed to add resolved request to knowledge base");
                None
            }
        };

        Ok(ResolutionReceipt {
            request_id: id,
            status: request.status,
            knowledge_entry_id,
        })
    }

    /// Knowledge base listing, newest first
    pub async fn knowledge_base(&self) -> Result<Vec<KnowledgeEntrySummary>, HelpDeskError> {
        let entries = self.knowledge.list_entries().await?;
        Ok(entries.iter().map(KnowledgeEntrySummary::from).collect())
    }

    /// Run the matcher for `query` and report its decision
    pub async fn match_query(&self, query: &str) -> Result<MatchDecision, HelpDeskError> {
        if query.trim().is_empty() {
            return Err(HelpDeskError::InvalidRequest("query is required".to_string()));
        }

        let Some(candidate) = self.matcher.evaluate(query).await? else {
            return Ok(MatchDecision::no_candidate());
        };

        Ok(MatchDecision {
            matched: candidate.accepted,
            score: Some(candidate.score),
            question: Some(candidate.entry.question.clone()),
            answer: candidate.accepted.then(|| candidate.entry.answer.clone()),
            accepted_by: candidate.accepted_by,
        })
    }
}

/// In-process escalation filing, used when the receptionist and the help
/// desk share one process.
#[async_trait]
impl EscalationBackend for HelpDeskService {
    async fn create(&self, request: NewEscalation) -> Result<EscalationId, EscalationError> {
        match HelpDeskService::create(self, request).await {
            Ok(created) => Ok(created.id),
            Err(HelpDeskError::InvalidRequest(message)) => Err(EscalationError::BackendRejected {
                status: Some(400),
                message,
            }),
            Err(e) => Err(EscalationError::BackendUnavailable(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::escalation::ChatMessage;
    use crate::infrastructure::event_bus::EventBus;
    use crate::infrastructure::repositories::InMemoryEscalationRepository;
    use frontdesk_cortex::{
        EmbeddingProvider, HashEmbeddingProvider, InMemoryKnowledgeStore, KnowledgeStore,
        StandardKnowledgeService,
    };

    struct Fixture {
        service: HelpDeskService,
        store: Arc<InMemoryKnowledgeStore>,
        event_bus: EventBus,
    }

    fn fixture() -> Fixture {
        let event_bus = EventBus::new(64);
        let store = Arc::new(InMemoryKnowledgeStore::new());
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashEmbeddingProvider::default());
        let bus: Arc<dyn frontdesk_cortex::EventBus> = Arc::new(event_bus.clone());
        let knowledge = Arc::new(StandardKnowledgeService::new(store.clone(), embedder.clone(), bus.clone()));
        let matcher = Arc::new(KnowledgeMatcher::new(store.clone(), embedder, bus));
        let repository = Arc::new(InMemoryEscalationRepository::new(event_bus.clone()));

        Fixture {
            service: HelpDeskService::new(repository, knowledge, matcher),
            store,
            event_bus,
        }
    }

    fn intake(query: &str) -> NewEscalation {
        NewEscalation {
            original_query: query.to_string(),
            conversation_history: vec![ChatMessage::new("user", query)],
            room_id: "room-1".to_string(),
            participant_id: Some("caller-1".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_resolve_grows_knowledge_base() {
        let f = fixture();
        let request = f.service.create(intake("Are you open on Sundays?")).await.unwrap();
        assert!(request.is_pending());

        let receipt = f.service.resolve(request.id, "Yes, from 10 to 4").await.unwrap();
        assert_eq!(receipt.status, EscalationStatus::Resolved);
        assert!(receipt.knowledge_entry_id.is_some());

        let entries = f.store.list_all().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].answer, "Yes, from 10 to 4");
        assert_eq!(entries[0].source_escalation_id, Some(request.id.to_string()));
        assert!(entries[0].question_embedding.is_some());
        assert!(entries[0].content_embedding.is_some());

        let stored = f.service.get(request.id).await.unwrap();
        assert_eq!(stored.answer(), Some("Yes, from 10 to 4"));
    }

    #[tokio::test]
    async fn test_resolve_errors() {
        let f = fixture();
        let unknown = EscalationId::new();
        assert!(matches!(
            f.service.resolve(unknown, "anything").await,
            Err(HelpDeskError::NotFound(id)) if id == unknown
        ));

        let request = f.service.create(intake("Do you validate parking?")).await.unwrap();
        assert!(matches!(
            f.service.resolve(request.id, "  ").await,
            Err(HelpDeskError::InvalidRequest(_))
        ));

        f.service.resolve(request.id, "Yes, for two hours").await.unwrap();
        assert!(matches!(
            f.service.resolve(request.id, "No").await,
            Err(HelpDeskError::AlreadyResolved(_))
        ));
        assert_eq!(f.store.len().await, 1);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_query() {
        let f = fixture();
        assert!(matches!(
            f.service.create(intake("   ")).await,
            Err(HelpDeskError::InvalidRequest(_))
        ));

        let err = EscalationBackend::create(&f.service, intake("")).await.unwrap_err();
        assert!(matches!(err, EscalationError::BackendRejected { status: Some(400), .. }));
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let f = fixture();
        let first = f.service.create(intake("Do you sell gift cards?")).await.unwrap();
        f.service.create(intake("Do you take walk-ins?")).await.unwrap();
        f.service.resolve(first.id, "Yes, at the front desk").await.unwrap();

        assert_eq!(f.service.list(None).await.unwrap().len(), 2);
        let pending = f.service.list(Some(EscalationStatus::Pending)).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].original_query, "Do you take walk-ins?");
    }

    #[tokio::test]
    async fn test_match_query_after_learning() {
        let f = fixture();
        assert_eq!(
            f.service.match_query("Do you sell gift cards?").await.unwrap(),
            MatchDecision::no_candidate()
        );

        let request = f.service.create(intake("Do you sell gift cards?")).await.unwrap();
        f.service.resolve(request.id, "Yes, at the front desk").await.unwrap();

        let decision = f.service.match_query("do you sell gift cards").await.unwrap();
        assert!(decision.matched);
        assert_eq!(decision.answer.as_deref(), Some("Yes, at the front desk"));
        assert_eq!(decision.question.as_deref(), Some("Do you sell gift cards?"));

        let summaries = f.service.knowledge_base().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert!(summaries[0].has_question_embedding);
        assert_eq!(summaries[0].source_request_id, Some(request.id.to_string()));
    }

    #[tokio::test]
    async fn test_resolve_publishes_change() {
        let f = fixture();
        let request = f.service.create(intake("Is there a student discount?")).await.unwrap();
        let mut receiver = f.event_bus.subscribe_escalation(request.id);

        f.service.resolve(request.id, "Ten percent with ID").await.unwrap();

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event_type(), "help_request_resolved");
    }
}

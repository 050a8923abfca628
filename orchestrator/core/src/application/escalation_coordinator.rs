// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Escalation Coordinator
//!
//! Files questions the receptionist could not answer and waits, detached from
//! the conversation turn, for a supervisor's answer.
//!
//! ## Wait lifecycle
//!
//! 1. Subscribe to the request's change feed, then re-read the request so an
//!    answer that landed before the subscription is not missed.
//! 2. Wait for a `resolved` change, bounded by `max_wait` and the coordinator's
//!    shutdown token.
//! 3. On resolution: append the supervisor context, speak the update, and drop
//!    the id from the conversation's pending set.
//! 4. The subscription is released on every exit path.
//!
//! A timed-out wait is a terminal state, not an error. It is logged and the
//! conversation is left untouched.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Escalation filing and resolution delivery

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::conversation::{supervisor_update_speech, ContextMessage, Conversation, ConversationError};
use crate::domain::escalation::{ChatMessage, EscalationBackend, EscalationError, EscalationId, NewEscalation};
use crate::domain::events::EscalationEvent;
use crate::domain::repository::{EscalationRepository, EscalationSubscription, SubscriptionError};

pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(3600);

/// How a resolution wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// Answer injected and spoken; id removed from the pending set
    Delivered,
    TimedOut,
    Shutdown,
    /// Change feed closed before a resolution arrived
    Closed,
    /// The conversation rejected the answer; id kept pending
    DeliveryFailed,
}

impl ResolutionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionOutcome::Delivered => "delivered",
            ResolutionOutcome::TimedOut => "timed_out",
            ResolutionOutcome::Shutdown => "shutdown",
            ResolutionOutcome::Closed => "closed",
            ResolutionOutcome::DeliveryFailed => "delivery_failed",
        }
    }
}

pub struct EscalationCoordinator {
    backend: Arc<dyn EscalationBackend>,
    repository: Arc<dyn EscalationRepository>,
    max_wait: Duration,
    shutdown: CancellationToken,
}

impl EscalationCoordinator {
    pub fn new(backend: Arc<dyn EscalationBackend>, repository: Arc<dyn EscalationRepository>) -> Self {
        Self {
            backend,
            repository,
            max_wait: DEFAULT_MAX_WAIT,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn with_shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    /// Cancel every outstanding wait
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// File a question for a human supervisor
    pub async fn create(
        &self,
        query: &str,
        history: Vec<ChatMessage>,
        room_id: &str,
        participant_id: Option<String>,
    ) -> Result<EscalationId, EscalationError> {
        let intake = NewEscalation {
            original_query: query.to_string(),
            conversation_history: history,
            room_id: room_id.to_string(),
            participant_id,
        };

        match self.backend.create(intake).await {
            Ok(id) => {
                info!(request_id = %id, room_id = %room_id, "Escalated question to supervisor");
                Ok(id)
            }
            Err(e) => {
                metrics::counter!("frontdesk_escalation_failures_total").increment(1);
                warn!(room_id = %room_id, error = %e, "Failed to escalate question to supervisor");
                Err(e)
            }
        }
    }

    /// Run [`await_resolution`](Self::await_resolution) as a detached task
    pub fn spawn_resolution_wait(
        self: &Arc<Self>,
        id: EscalationId,
        conversation: Conversation,
    ) -> tokio::task::JoinHandle<ResolutionOutcome> {
        let coordinator = self.clone();
        let max_wait = self.max_wait;
        tokio::spawn(async move { coordinator.await_resolution(id, &conversation, max_wait).await })
    }

    /// Wait for the supervisor's answer and deliver it to `conversation`
    pub async fn await_resolution(
        &self,
        id: EscalationId,
        conversation: &Conversation,
        max_wait: Duration,
    ) -> ResolutionOutcome {
        let mut subscription = match self.repository.subscribe(id).await {
            Ok(subscription) => subscription,
            Err(e) => {
                warn!(request_id = %id, error = %e, "Failed to subscribe to help request changes");
                return self.finish(id, ResolutionOutcome::Closed);
            }
        };

        let outcome = tokio::select! {
            _ = self.shutdown.cancelled() => {
                debug!(request_id = %id, "Resolution wait cancelled by shutdown");
                ResolutionOutcome::Shutdown
            }
            answer = tokio::time::timeout(
                max_wait,
                next_answer(self.repository.as_ref(), subscription.as_mut(), id),
            ) => match answer {
                Ok(Some(answer)) => deliver(id, conversation, &answer).await,
                Ok(None) => ResolutionOutcome::Closed,
                Err(_) => {
                    warn!(
                        request_id = %id,
                        max_wait_seconds = max_wait.as_secs(),
                        "Timed out waiting for supervisor answer"
                    );
                    ResolutionOutcome::TimedOut
                }
            },
        };

        subscription.unsubscribe();
        self.finish(id, outcome)
    }

    fn finish(&self, id: EscalationId, outcome: ResolutionOutcome) -> ResolutionOutcome {
        metrics::counter!("frontdesk_escalation_waits_total", "outcome" => outcome.as_str()).increment(1);
        debug!(request_id = %id, outcome = outcome.as_str(), "Resolution wait finished");
        outcome
    }
}

/// The request's answer if it is already resolved
async fn current_answer(repository: &dyn EscalationRepository, id: EscalationId) -> Option<String> {
    match repository.find_by_id(id).await {
        Ok(Some(request)) => request.answer().map(str::to_string),
        Ok(None) => None,
        Err(e) => {
            warn!(request_id = %id, error = %e, "Failed to read help request");
            None
        }
    }
}

/// Next supervisor answer for `id`, or `None` once the feed closes
async fn next_answer(
    repository: &dyn EscalationRepository,
    subscription: &mut dyn EscalationSubscription,
    id: EscalationId,
) -> Option<String> {
    if let Some(answer) = current_answer(repository, id).await {
        return Some(answer);
    }

    loop {
        match subscription.next_change().await {
            Ok(EscalationEvent::Resolved { answer, .. }) => return Some(answer),
            Ok(EscalationEvent::Created { .. }) => continue,
            Err(SubscriptionError::Lagged(missed)) => {
                debug!(request_id = %id, missed, "Change feed lagged, re-reading help request");
                if let Some(answer) = current_answer(repository, id).await {
                    return Some(answer);
                }
            }
            Err(SubscriptionError::Closed) => return None,
        }
    }
}

async fn deliver(id: EscalationId, conversation: &Conversation, answer: &str) -> ResolutionOutcome {
    let delivered: Result<(), ConversationError> = async {
        conversation
            .sink
            .append_context(ContextMessage::supervisor_answer(answer))
            .await?;
        conversation.sink.say(&supervisor_update_speech(answer)).await
    }
    .await;

    match delivered {
        Ok(()) => {
            conversation.pending.remove(&id);
            info!(request_id = %id, room_id = %conversation.room_id, "Delivered supervisor answer");
            ResolutionOutcome::Delivered
        }
        Err(e) => {
            warn!(request_id = %id, error = %e, "Failed to deliver supervisor answer");
            ResolutionOutcome::DeliveryFailed
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::conversation::ConversationContextSink;
    use crate::domain::escalation::EscalationRequest;
    use crate::infrastructure::event_bus::EventBus;
    use crate::infrastructure::repositories::InMemoryEscalationRepository;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Records everything a conversation receives, in order
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub(crate) log: Mutex<Vec<String>>,
        pub(crate) closed: bool,
    }

    impl RecordingSink {
        pub(crate) fn closed() -> Self {
            Self {
                log: Mutex::new(Vec::new()),
                closed: true,
            }
        }

        pub(crate) fn entries(&self) -> Vec<String> {
            self.log.lock().clone()
        }
    }

    #[async_trait]
    impl ConversationContextSink for RecordingSink {
        async fn append_context(&self, message: ContextMessage) -> Result<(), ConversationError> {
            if self.closed {
                return Err(ConversationError::Closed);
            }
            self.log.lock().push(format!("context:{}", message.content));
            Ok(())
        }

        async fn say(&self, text: &str) -> Result<(), ConversationError> {
            if self.closed {
                return Err(ConversationError::Closed);
            }
            self.log.lock().push(format!("say:{}", text));
            Ok(())
        }
    }

    pub(crate) struct FailingBackend(pub(crate) EscalationError);

    #[async_trait]
    impl EscalationBackend for FailingBackend {
        async fn create(&self, _request: NewEscalation) -> Result<EscalationId, EscalationError> {
            Err(self.0.clone())
        }
    }

    struct Fixture {
        coordinator: Arc<EscalationCoordinator>,
        repository: Arc<InMemoryEscalationRepository>,
        event_bus: EventBus,
    }

    fn fixture(max_wait: Duration) -> Fixture {
        let event_bus = EventBus::new(64);
        let repository = Arc::new(InMemoryEscalationRepository::new(event_bus.clone()));
        let backend = Arc::new(FailingBackend(EscalationError::BackendUnavailable("unused".into())));
        let coordinator = Arc::new(EscalationCoordinator::new(backend, repository.clone()).with_max_wait(max_wait));
        Fixture {
            coordinator,
            repository,
            event_bus,
        }
    }

    async fn pending_request(repository: &InMemoryEscalationRepository, query: &str) -> EscalationRequest {
        let request = EscalationRequest::new(NewEscalation {
            original_query: query.to_string(),
            conversation_history: Vec::new(),
            room_id: "room-1".to_string(),
            participant_id: None,
        });
        repository.save(&request).await.unwrap();
        request
    }

    async fn resolve(repository: &InMemoryEscalationRepository, mut request: EscalationRequest, answer: &str) {
        request.resolve(answer).unwrap();
        repository.save(&request).await.unwrap();
    }

    async fn wait_for_subscriber(event_bus: &EventBus) {
        while event_bus.subscriber_count() == 0 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_delivers_answer_in_order() {
        let f = fixture(Duration::from_secs(5));
        let request = pending_request(&f.repository, "Are you open late on Fridays?").await;
        let sink = Arc::new(RecordingSink::default());
        let conversation = Conversation::new("room-1", None, sink.clone());
        conversation.pending.track(request.id, &request.original_query);

        let handle = f.coordinator.spawn_resolution_wait(request.id, conversation.clone());
        wait_for_subscriber(&f.event_bus).await;
        resolve(&f.repository, request.clone(), "We close at 9 PM on Fridays").await;

        assert_eq!(handle.await.unwrap(), ResolutionOutcome::Delivered);
        assert_eq!(
            sink.entries(),
            vec![
                format!("context:{}", ContextMessage::supervisor_answer("We close at 9 PM on Fridays").content),
                "say:I have an update from my supervisor. We close at 9 PM on Fridays".to_string(),
            ]
        );
        assert!(!conversation.pending.contains(&request.id));
        assert_eq!(f.event_bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_answer_resolved_before_wait_is_delivered() {
        let f = fixture(Duration::from_secs(5));
        let request = pending_request(&f.repository, "Do you do balayage?").await;
        resolve(&f.repository, request.clone(), "Yes, book 3 hours").await;

        let sink = Arc::new(RecordingSink::default());
        let conversation = Conversation::new("room-1", None, sink.clone());
        conversation.pending.track(request.id, &request.original_query);

        let outcome = f
            .coordinator
            .await_resolution(request.id, &conversation, Duration::from_secs(5))
            .await;
        assert_eq!(outcome, ResolutionOutcome::Delivered);
        assert_eq!(sink.entries().len(), 2);
        assert!(conversation.pending.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_unsubscribes_and_keeps_pending() {
        let f = fixture(Duration::from_millis(50));
        let request = pending_request(&f.repository, "Can I bring my dog?").await;
        let sink = Arc::new(RecordingSink::default());
        let conversation = Conversation::new("room-1", None, sink.clone());
        conversation.pending.track(request.id, &request.original_query);

        let outcome = f
            .coordinator
            .await_resolution(request.id, &conversation, Duration::from_millis(50))
            .await;

        assert_eq!(outcome, ResolutionOutcome::TimedOut);
        assert_eq!(f.event_bus.subscriber_count(), 0);
        assert!(conversation.pending.contains(&request.id));
        assert!(sink.entries().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_cancels_wait() {
        let f = fixture(Duration::from_secs(60));
        let request = pending_request(&f.repository, "Is there a student discount?").await;
        let conversation = Conversation::new("room-1", None, Arc::new(RecordingSink::default()));

        let handle = f.coordinator.spawn_resolution_wait(request.id, conversation);
        wait_for_subscriber(&f.event_bus).await;
        f.coordinator.shutdown();

        assert_eq!(handle.await.unwrap(), ResolutionOutcome::Shutdown);
        assert_eq!(f.event_bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_delivery_keeps_pending() {
        let f = fixture(Duration::from_secs(5));
        let request = pending_request(&f.repository, "Do you sell gift cards?").await;
        resolve(&f.repository, request.clone(), "Yes").await;

        let conversation = Conversation::new("room-1", None, Arc::new(RecordingSink::closed()));
        conversation.pending.track(request.id, &request.original_query);

        let outcome = f
            .coordinator
            .await_resolution(request.id, &conversation, Duration::from_secs(5))
            .await;
        assert_eq!(outcome, ResolutionOutcome::DeliveryFailed);
        assert!(conversation.pending.contains(&request.id));
    }

    #[tokio::test]
    async fn test_other_requests_do_not_wake_the_wait() {
        let f = fixture(Duration::from_millis(100));
        let watched = pending_request(&f.repository, "Do you take walk-ins?").await;
        let other = pending_request(&f.repository, "Is parking free?").await;
        let sink = Arc::new(RecordingSink::default());
        let conversation = Conversation::new("room-1", None, sink.clone());

        let handle = f.coordinator.spawn_resolution_wait(watched.id, conversation);
        wait_for_subscriber(&f.event_bus).await;
        resolve(&f.repository, other, "Yes, after 6 PM").await;

        assert_eq!(handle.await.unwrap(), ResolutionOutcome::TimedOut);
        assert!(sink.entries().is_empty());
    }

    #[tokio::test]
    async fn test_create_passes_backend_error_through() {
        let repository = Arc::new(InMemoryEscalationRepository::new(EventBus::new(8)));
        let coordinator = EscalationCoordinator::new(
            Arc::new(FailingBackend(EscalationError::BackendTimeout(10))),
            repository,
        );

        let err = coordinator
            .create("Do you sell gift cards?", Vec::new(), "room-1", None)
            .await
            .unwrap_err();
        assert_eq!(err, EscalationError::BackendTimeout(10));
        assert_eq!(err.user_message(), "My supervisor didn't respond in time. Please try again.");
    }
}

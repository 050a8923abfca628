// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use frontdesk_core::application::{
    create_stores, EscalationCoordinator, HelpDeskService, KnowledgeLookup, Receptionist, ResolutionOutcome,
};
use frontdesk_core::domain::conversation::{ContextMessage, Conversation, ConversationContextSink, ConversationError};
use frontdesk_core::domain::escalation::{ChatMessage, ESCALATION_ACKNOWLEDGMENT};
use frontdesk_core::domain::repository::{SledConfig, StorageBackend};
use frontdesk_core::infrastructure::event_bus::EventBus;
use frontdesk_core::infrastructure::help_desk_client::HelpDeskClient;
use frontdesk_core::presentation::api::{app, AppState};
use frontdesk_cortex::{EmbeddingProvider, HashEmbeddingProvider, KnowledgeMatcher, StandardKnowledgeService};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::timeout;

#[derive(Default)]
struct TranscriptSink {
    lines: Mutex<Vec<String>>,
}

#[async_trait]
impl ConversationContextSink for TranscriptSink {
    async fn append_context(&self, message: ContextMessage) -> Result<(), ConversationError> {
        self.lines.lock().push(format!("{}: {}", message.role, message.content));
        Ok(())
    }

    async fn say(&self, text: &str) -> Result<(), ConversationError> {
        self.lines.lock().push(format!("agent: {}", text));
        Ok(())
    }
}

struct Harness {
    help_desk: Arc<HelpDeskService>,
    matcher: Arc<KnowledgeMatcher>,
    event_bus: EventBus,
    stores: frontdesk_core::application::Stores,
}

fn harness(backend: &StorageBackend) -> Harness {
    let event_bus = EventBus::new(256);
    let stores = create_stores(backend, event_bus.clone()).unwrap();
    let bus: Arc<dyn frontdesk_cortex::EventBus> = Arc::new(event_bus.clone());
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashEmbeddingProvider::default());
    let knowledge = Arc::new(StandardKnowledgeService::new(stores.knowledge.clone(), embedder.clone(), bus.clone()));
    let matcher = Arc::new(KnowledgeMatcher::new(stores.knowledge.clone(), embedder, bus));
    let help_desk = Arc::new(HelpDeskService::new(stores.escalations.clone(), knowledge, matcher.clone()));

    Harness {
        help_desk,
        matcher,
        event_bus,
        stores,
    }
}

async fn serve(harness: &Harness) -> String {
    let state = Arc::new(AppState::new(harness.help_desk.clone(), harness.event_bus.clone()));
    let router = app(state, &["*".to_string()]).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn wait_until<F: Fn() -> bool>(condition: F) {
    timeout(Duration::from_secs(10), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn test_escalation_over_http_is_delivered_and_learned() {
    let harness = harness(&StorageBackend::InMemory);
    let base_url = serve(&harness).await;
    let client = Arc::new(HelpDeskClient::new(&base_url).unwrap());

    let coordinator = Arc::new(EscalationCoordinator::new(client.clone(), harness.stores.escalations.clone()));
    let sink = Arc::new(TranscriptSink::default());
    let conversation = Conversation::new("room-7", Some("caller-3".to_string()), sink.clone());
    let receptionist = Receptionist::new(harness.matcher.clone(), coordinator, conversation.clone());

    let question = "Do you offer keratin treatments?";
    assert!(matches!(receptionist.on_user_turn(question).await, KnowledgeLookup::NoMatch));

    let reply = receptionist
        .request_human_supervisor(question, vec![ChatMessage::new("user", question)])
        .await;
    assert_eq!(reply, ESCALATION_ACKNOWLEDGMENT);
    assert_eq!(conversation.pending.len(), 1);

    let pending = client.list_requests(None).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].room_id, "room-7");

    let receipt = client.resolve_request(pending[0].id, "Yes, on Tuesdays and Thursdays").await.unwrap();
    assert!(receipt.knowledge_entry_id.is_some());

    wait_until(|| conversation.pending.is_empty()).await;
    let transcript = sink.lines.lock().clone();
    assert_eq!(
        transcript,
        vec![
            format!(
                "system: {}",
                ContextMessage::supervisor_answer("Yes, on Tuesdays and Thursdays").content
            ),
            "agent: I have an update from my supervisor. Yes, on Tuesdays and Thursdays".to_string(),
        ]
    );

    let entries = client.knowledge_base().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].answer, "Yes, on Tuesdays and Thursdays");
    assert_eq!(entries[0].source_request_id, Some(pending[0].id.to_string()));
    assert!(entries[0].has_question_embedding && entries[0].has_content_embedding);

    let decision = client.match_query("do you offer keratin treatments").await.unwrap();
    assert!(decision.matched);
    assert!(receptionist.on_user_turn(question).await.is_answered());
}

#[tokio::test]
async fn test_timed_out_wait_releases_subscription() {
    let harness = harness(&StorageBackend::InMemory);
    let coordinator = Arc::new(
        EscalationCoordinator::new(harness.help_desk.clone(), harness.stores.escalations.clone())
            .with_max_wait(Duration::from_millis(100)),
    );
    let conversation = Conversation::new("room-1", None, Arc::new(TranscriptSink::default()));

    let id = coordinator
        .create("Can I pay with crypto?", Vec::new(), "room-1", None)
        .await
        .unwrap();
    conversation.pending.track(id, "Can I pay with crypto?");

    let outcome = coordinator.spawn_resolution_wait(id, conversation.clone()).await.unwrap();
    assert_eq!(outcome, ResolutionOutcome::TimedOut);
    assert_eq!(harness.event_bus.subscriber_count(), 0);
    assert!(conversation.pending.contains(&id));

    // A late answer still grows the knowledge base
    harness.help_desk.resolve(id, "Not yet").await.unwrap();
    assert_eq!(harness.help_desk.knowledge_base().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_sled_storage_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let backend = StorageBackend::Sled(SledConfig {
        path: dir.path().join("frontdesk.db"),
    });

    let id = {
        let harness = harness(&backend);
        let request = harness
            .help_desk
            .create(frontdesk_core::NewEscalation {
                original_query: "Do you sell gift cards?".to_string(),
                conversation_history: Vec::new(),
                room_id: "room-1".to_string(),
                participant_id: None,
            })
            .await
            .unwrap();
        harness.help_desk.resolve(request.id, "Yes, at the front desk").await.unwrap();
        request.id
    };

    let harness = harness(&backend);
    let request = harness.help_desk.get(id).await.unwrap();
    assert_eq!(request.answer(), Some("Yes, at the front desk"));

    let entries = harness.help_desk.knowledge_base().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].source_request_id, Some(id.to_string()));
}

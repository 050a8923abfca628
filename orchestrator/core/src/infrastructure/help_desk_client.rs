// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP client for the help desk API
//!
//! Files escalations for a receptionist running apart from the help desk, and
//! backs the `requests` / `kb` CLI commands.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::application::help_desk::{KnowledgeEntrySummary, MatchDecision, ResolutionReceipt};
use crate::domain::escalation::{
    EscalationBackend, EscalationError, EscalationId, EscalationReceipt, EscalationRequest, EscalationStatus,
    NewEscalation,
};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct HelpDeskClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HelpDeskClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn list_requests(&self, status: Option<EscalationStatus>) -> Result<Vec<EscalationRequest>> {
        let mut url = format!("{}/api/help-requests", self.base_url);
        if let Some(status) = status {
            url.push_str(&format!("?status={}", status));
        }

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to list help requests")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to list help requests: {}", error_text);
        }

        response
            .json()
            .await
            .context("Failed to parse help requests response")
    }

    pub async fn get_request(&self, id: EscalationId) -> Result<EscalationRequest> {
        let response = self
            .client
            .get(&format!("{}/api/help-requests/{}", self.base_url, id))
            .send()
            .await
            .context("Failed to get help request")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to get help request {}: {}", id, error_text);
        }

        response
            .json()
            .await
            .context("Failed to parse help request response")
    }

    pub async fn resolve_request(&self, id: EscalationId, answer: &str) -> Result<ResolutionReceipt> {
        #[derive(Serialize)]
        struct ResolveRequest<'a> {
            answer: &'a str,
        }

        let response = self
            .client
            .put(&format!("{}/api/help-requests/{}/resolve", self.base_url, id))
            .json(&ResolveRequest { answer })
            .send()
            .await
            .context("Failed to resolve help request")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to resolve help request {}: {}", id, error_text);
        }

        response
            .json()
            .await
            .context("Failed to parse resolve response")
    }

    pub async fn knowledge_base(&self) -> Result<Vec<KnowledgeEntrySummary>> {
        let response = self
            .client
            .get(&format!("{}/api/knowledge-base", self.base_url))
            .send()
            .await
            .context("Failed to list knowledge base")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to list knowledge base: {}", error_text);
        }

        response
            .json()
            .await
            .context("Failed to parse knowledge base response")
    }

    pub async fn match_query(&self, query: &str) -> Result<MatchDecision> {
        #[derive(Serialize)]
        struct MatchRequest<'a> {
            query: &'a str,
        }

        let response = self
            .client
            .post(&format!("{}/api/knowledge-base/match", self.base_url))
            .json(&MatchRequest { query })
            .send()
            .await
            .context("Failed to query knowledge base")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to query knowledge base: {}", error_text);
        }

        response
            .json()
            .await
            .context("Failed to parse match response")
    }

    pub async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(&format!("{}/health", self.base_url))
            .send()
            .await;

        match response {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn map_send_error(&self, err: reqwest::Error) -> EscalationError {
        if err.is_timeout() {
            EscalationError::BackendTimeout(self.timeout.as_secs())
        } else {
            EscalationError::BackendUnavailable(err.to_string())
        }
    }
}

#[async_trait]
impl EscalationBackend for HelpDeskClient {
    async fn create(&self, request: NewEscalation) -> Result<EscalationId, EscalationError> {
        let response = self
            .client
            .post(&format!("{}/api/help-requests", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EscalationError::BackendRejected {
                status: Some(status.as_u16()),
                message,
            });
        }

        let body = response.text().await.map_err(|e| self.map_send_error(e))?;
        let receipt: EscalationReceipt =
            serde_json::from_str(&body).map_err(|e| EscalationError::BackendRejected {
                status: None,
                message: format!("response without a valid requestId: {}", e),
            })?;

        debug!(request_id = %receipt.request_id, "Help desk accepted escalation");
        Ok(receipt.request_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intake() -> NewEscalation {
        NewEscalation {
            original_query: "Do you sell gift cards?".to_string(),
            conversation_history: Vec::new(),
            room_id: "room-1".to_string(),
            participant_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_returns_request_id() {
        let mut server = mockito::Server::new_async().await;
        let id = EscalationId::new();
        let mock = server
            .mock("POST", "/api/help-requests")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "originalQuery": "Do you sell gift cards?",
                "livekitRoomId": "room-1"
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(format!(r#"{{"requestId":"{}"}}"#, id))
            .create_async()
            .await;

        let client = HelpDeskClient::new(server.url()).unwrap();
        assert_eq!(client.create(intake()).await.unwrap(), id);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/help-requests")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = HelpDeskClient::new(server.url()).unwrap();
        let err = client.create(intake()).await.unwrap_err();
        assert_eq!(
            err,
            EscalationError::BackendRejected {
                status: Some(500),
                message: "boom".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_create_missing_request_id() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/help-requests")
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let client = HelpDeskClient::new(server.url()).unwrap();
        let err = client.create(intake()).await.unwrap_err();
        assert!(matches!(err, EscalationError::BackendRejected { status: None, .. }));
        assert_eq!(
            err.user_message(),
            "I've tried to reach my supervisor but didn't get a confirmation. Please try again."
        );
    }

    #[tokio::test]
    async fn test_create_unreachable_backend() {
        let client = HelpDeskClient::with_timeout("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = client.create(intake()).await.unwrap_err();
        assert!(matches!(
            err,
            EscalationError::BackendUnavailable(_) | EscalationError::BackendTimeout(_)
        ));
    }

    #[tokio::test]
    async fn test_list_requests_with_status_filter() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/help-requests?status=pending")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let client = HelpDeskClient::new(format!("{}/", server.url())).unwrap();
        let requests = client.list_requests(Some(EscalationStatus::Pending)).await.unwrap();
        assert!(requests.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_surfaces_error_body() {
        let mut server = mockito::Server::new_async().await;
        let id = EscalationId::new();
        server
            .mock("PUT", format!("/api/help-requests/{}/resolve", id).as_str())
            .with_status(404)
            .with_body(r#"{"error":"Help request not found"}"#)
            .create_async()
            .await;

        let client = HelpDeskClient::new(server.url()).unwrap();
        let err = client.resolve_request(id, "Yes").await.unwrap_err();
        assert!(err.to_string().contains("Help request not found"));
    }
}

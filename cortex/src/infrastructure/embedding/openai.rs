// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// OpenAI Embedding Adapter
//
// Anti-Corruption Layer for the OpenAI `/embeddings` endpoint
// Also works with OpenAI-compatible servers (LM Studio, vLLM, Ollama, etc.)

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use super::{build_client, extract_embedding, map_send_error, status_error, DEFAULT_EMBEDDING_TIMEOUT};
use crate::domain::{EmbeddingError, EmbeddingProvider};

pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
}

impl OpenAIEmbeddingProvider {
    pub fn new(endpoint: String, api_key: Option<String>, model: String) -> Result<Self, EmbeddingError> {
        Self::with_timeout(endpoint, api_key, model, DEFAULT_EMBEDDING_TIMEOUT)
    }

    pub fn with_timeout(
        endpoint: String,
        api_key: Option<String>,
        model: String,
        timeout: Duration,
    ) -> Result<Self, EmbeddingError> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint,
            api_key,
            model,
            timeout,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput("cannot embed empty text".into()));
        }

        let url = format!("{}/embeddings", self.endpoint.trim_end_matches('/'));
        let mut request = self.client.post(&url).json(&EmbeddingsRequest {
            model: &self.model,
            input: text,
        });
        // Local OpenAI-compatible servers usually run without a key
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout))?;

        if !response.status().is_success() {
            return Err(status_error(response, &self.model).await);
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| EmbeddingError::MalformedResponse(e.to_string()))?;

        extract_embedding(body)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

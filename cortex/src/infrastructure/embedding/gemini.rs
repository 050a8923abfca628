// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Gemini Embedding Adapter
//
// Anti-Corruption Layer for the Generative Language API `embedContent` method

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use super::{build_client, extract_embedding, map_send_error, status_error, DEFAULT_EMBEDDING_TIMEOUT};
use crate::domain::{EmbeddingError, EmbeddingProvider};

pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "models/text-embedding-004";

pub struct GeminiEmbeddingProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

impl GeminiEmbeddingProvider {
    pub fn new(endpoint: String, api_key: String, model: String) -> Result<Self, EmbeddingError> {
        Self::with_timeout(endpoint, api_key, model, DEFAULT_EMBEDDING_TIMEOUT)
    }

    pub fn with_timeout(
        endpoint: String,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, EmbeddingError> {
        // Accept both "text-embedding-004" and "models/text-embedding-004"
        let model = if model.starts_with("models/") {
            model
        } else {
            format!("models/{}", model)
        };

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
impl EmbeddingProvider for GeminiEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput("cannot embed empty text".into()));
        }

        let request = EmbedContentRequest {
            model: &self.model,
            content: Content {
                parts: [Part { text }],
            },
        };
        let url = format!(
            "{}/{}:embedContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
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
        "gemini"
    }
}

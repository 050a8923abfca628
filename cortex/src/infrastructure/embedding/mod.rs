// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Embedding Provider Adapters
//!
//! Anti-corruption layer between hosted embedding APIs and the
//! [`EmbeddingProvider`](crate::domain::EmbeddingProvider) port.
//!
//! Providers disagree on response shape, so every HTTP adapter funnels its
//! body through [`extract_embedding`], which accepts:
//!
//! - `{"embedding": {"values": [...]}}` (Gemini `embedContent`)
//! - `{"embedding": [{"values": [...]}]}`
//! - `{"embeddings": [{"values": [...]}]}` (Gemini batch)
//! - `{"embedding": [...]}`
//! - `{"data": [{"embedding": [...]}]}` (OpenAI-compatible)
//! - a bare `[...]`
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** HTTP embedding adapters and shared response handling

pub mod gemini;
pub mod hash;
pub mod openai;

pub use gemini::GeminiEmbeddingProvider;
pub use hash::HashEmbeddingProvider;
pub use openai::OpenAIEmbeddingProvider;

use serde::Deserialize;
use std::time::Duration;

use crate::domain::EmbeddingError;

/// Request timeout applied by every HTTP adapter
pub const DEFAULT_EMBEDDING_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
#[serde(untagged)]
enum EmbeddingPayload {
    Single { embedding: EmbeddingField },
    Batch { embeddings: Vec<ValuesObject> },
    Data { data: Vec<DataItem> },
    Bare(Vec<f32>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EmbeddingField {
    Values(ValuesObject),
    ValuesList(Vec<ValuesObject>),
    Raw(Vec<f32>),
}

#[derive(Deserialize)]
struct ValuesObject {
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct DataItem {
    embedding: Vec<f32>,
}

/// Pull a vector out of any supported response body
pub fn extract_embedding(body: serde_json::Value) -> Result<Vec<f32>, EmbeddingError> {
    let payload: EmbeddingPayload = serde_json::from_value(body)
        .map_err(|e| EmbeddingError::MalformedResponse(e.to_string()))?;

    let vector = match payload {
        EmbeddingPayload::Single { embedding } => match embedding {
            EmbeddingField::Values(v) => Some(v.values),
            EmbeddingField::ValuesList(list) => list.into_iter().next().map(|v| v.values),
            EmbeddingField::Raw(values) => Some(values),
        },
        EmbeddingPayload::Batch { embeddings } => embeddings.into_iter().next().map(|v| v.values),
        EmbeddingPayload::Data { data } => data.into_iter().next().map(|d| d.embedding),
        EmbeddingPayload::Bare(values) => Some(values),
    };

    match vector {
        Some(values) if !values.is_empty() => Ok(values),
        _ => Err(EmbeddingError::MalformedResponse("no embedding values".into())),
    }
}

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, EmbeddingError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| EmbeddingError::Provider(format!("Failed to build HTTP client: {}", e)))
}

pub(crate) fn map_send_error(err: reqwest::Error, timeout: Duration) -> EmbeddingError {
    if err.is_timeout() {
        EmbeddingError::Timeout(timeout.as_secs())
    } else {
        EmbeddingError::Network(err.to_string())
    }
}

/// Map a non-2xx response onto the error taxonomy
pub(crate) async fn status_error(response: reqwest::Response, model: &str) -> EmbeddingError {
    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();

    if status == 401 || status == 403 {
        EmbeddingError::Authentication(error_text)
    } else if status == 429 {
        EmbeddingError::RateLimit
    } else if status == 404 {
        EmbeddingError::Provider(format!("Model not found: {}", model))
    } else if status == 400 {
        EmbeddingError::InvalidInput(error_text)
    } else {
        EmbeddingError::Provider(format!("HTTP {}: {}", status, error_text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_supported_shapes() {
        let shapes = [
            json!({"embedding": {"values": [0.1, 0.2]}}),
            json!({"embedding": [{"values": [0.1, 0.2]}]}),
            json!({"embeddings": [{"values": [0.1, 0.2]}]}),
            json!({"embedding": [0.1, 0.2]}),
            json!({"data": [{"embedding": [0.1, 0.2], "index": 0}]}),
            json!([0.1, 0.2]),
        ];
        for shape in shapes {
            assert_eq!(extract_embedding(shape).unwrap(), vec![0.1, 0.2]);
        }
    }

    #[test]
    fn test_extract_rejects_unknown_or_empty() {
        for body in [
            json!({"result": "ok"}),
            json!({"embedding": []}),
            json!({"embedding": {"values": []}}),
            json!({"embedding": ["a", "b"]}),
            json!(null),
        ] {
            assert!(matches!(
                extract_embedding(body),
                Err(EmbeddingError::MalformedResponse(_))
            ));
        }
    }
}

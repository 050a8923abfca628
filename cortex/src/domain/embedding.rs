// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Embedding Provider Domain Interface
//!
//! Anti-corruption layer between the knowledge base and hosted embedding
//! APIs. Adapters live in `crate::infrastructure::embedding`.
//!
//! Callers treat every [`EmbeddingError`] as "no vector available": a failed
//! embedding never takes down the enclosing request.

use async_trait::async_trait;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Turn text into a fixed-dimension vector
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Short provider label for logs (e.g. "gemini", "openai", "hash")
    fn name(&self) -> &str;
}

#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Embedding request timed out after {0}s")]
    Timeout(u64),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Malformed embedding response: {0}")]
    MalformedResponse(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

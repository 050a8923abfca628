// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Hash Embedding Provider
//!
//! Deterministic, offline embeddings for development and tests.
//!
//! Each whitespace token of the normalized text is hashed into one of
//! `dimensions` buckets (signed), so texts sharing words land near each other
//! and identical texts produce identical vectors. Carries no real semantics.

use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::domain::{normalize, EmbeddingError, EmbeddingProvider};

/// Matches all-MiniLM-L6-v2
pub const DEFAULT_HASH_DIMENSIONS: usize = 384;

pub struct HashEmbeddingProvider {
    dimensions: usize,
}

impl HashEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }
}

impl Default for HashEmbeddingProvider {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_DIMENSIONS)
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return Err(EmbeddingError::InvalidInput("cannot embed empty text".into()));
        }

        let mut vector = vec![0.0_f32; self.dimensions];
        for token in normalized.split_whitespace() {
            let token = token.trim_matches(|c: char| !c.is_alphanumeric());
            if token.is_empty() {
                continue;
            }
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let hash = hasher.finish();

            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if (hash >> 63) & 1 == 1 { -1.0 } else { 1.0 };
            vector[bucket] += sign;
        }

        Ok(vector)
    }

    fn name(&self) -> &str {
        "hash"
    }
}

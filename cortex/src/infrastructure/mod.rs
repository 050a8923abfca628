// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Infrastructure layer for Cortex bounded context

pub mod repository;
pub mod memory_store;
pub mod sled_store;
pub mod embedding;

pub use repository::{KnowledgeStore, StoreError};
pub use memory_store::InMemoryKnowledgeStore;
pub use sled_store::SledKnowledgeStore;
pub use embedding::{GeminiEmbeddingProvider, HashEmbeddingProvider, OpenAIEmbeddingProvider};

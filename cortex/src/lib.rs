// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Frontdesk Cortex
//!
//! The receptionist's memory: knowledge base entries, similarity scoring,
//! embedding adapters and the matcher that decides when a stored answer
//! can be reused instead of escalating to a human.
//!
//! # Architecture
//!
//! - **Layer:** Learning & Memory Layer
//! - **Purpose:** Knowledge retrieval and knowledge base growth

pub mod domain;
pub mod application;
pub mod infrastructure;

#[cfg(test)]
mod test_support;

pub use domain::{
    combined_text, cosine, lexical, normalize, AcceptanceReason, CortexEvent, EmbeddingError,
    EmbeddingProvider, KnowledgeEntry, KnowledgeEntryId, KnowledgeEntryPatch, SimilarityError,
};
pub use application::{
    BackfillReport, BackfillSweeper, BackfillSweeperConfig, EventBus, KnowledgeMatcher,
    KnowledgeService, MatchResult, MatchThresholds, MatcherError, StandardKnowledgeService,
};
pub use infrastructure::{
    GeminiEmbeddingProvider, HashEmbeddingProvider, InMemoryKnowledgeStore, KnowledgeStore,
    OpenAIEmbeddingProvider, SledKnowledgeStore, StoreError,
};

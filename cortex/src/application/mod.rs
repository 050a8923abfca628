// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Application layer for Cortex bounded context

pub mod knowledge_service;
pub mod knowledge_matcher;
pub mod backfill_sweeper;

pub use knowledge_service::{BackfillReport, EventBus, KnowledgeService, StandardKnowledgeService};
pub use knowledge_matcher::{KnowledgeMatcher, MatchResult, MatchThresholds, MatcherError};
pub use backfill_sweeper::{BackfillSweeper, BackfillSweeperConfig};

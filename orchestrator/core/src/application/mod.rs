// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod help_desk;
pub mod escalation_coordinator;
pub mod receptionist;
pub mod repository_factory;

// Re-export use cases for convenience
pub use help_desk::{HelpDeskError, HelpDeskService, KnowledgeEntrySummary, MatchDecision, ResolutionReceipt};
pub use escalation_coordinator::{EscalationCoordinator, ResolutionOutcome, DEFAULT_MAX_WAIT};
pub use receptionist::{KnowledgeLookup, Receptionist};
pub use repository_factory::{create_stores, storage_backend_from_config, Stores};

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod repositories;
pub mod event_bus;
pub mod embedding_registry;
pub mod help_desk_client;

pub use event_bus::{DomainEvent, EventBus, EventBusError};
pub use help_desk_client::HelpDeskClient;

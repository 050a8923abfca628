// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Frontdesk Core
//!
//! Human escalation for the receptionist: the escalation aggregate and its
//! repositories, the coordinator that waits for supervisor answers, the help
//! desk service and its HTTP API.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Escalation workflow and help desk surface

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;

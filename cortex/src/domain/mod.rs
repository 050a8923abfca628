// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Domain layer for Cortex bounded context

pub mod knowledge;
pub mod similarity;
pub mod embedding;
pub mod events;

pub use knowledge::*;
pub use similarity::{cosine, lexical, normalize, SimilarityError};
pub use embedding::*;
pub use events::*;

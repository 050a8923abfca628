// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KnowledgeEntryId(pub Uuid);

impl KnowledgeEntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for KnowledgeEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for KnowledgeEntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for KnowledgeEntryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A question/answer pair the receptionist may reuse.
///
/// Entries are append-only from the core's point of view: they are created
/// when an escalation is resolved and only ever mutated to backfill a
/// missing embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: KnowledgeEntryId,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub question_embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub content_embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub source_escalation_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl KnowledgeEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            id: KnowledgeEntryId::new(),
            question: question.into(),
            answer: answer.into(),
            question_embedding: None,
            content_embedding: None,
            source_escalation_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_source_escalation(mut self, escalation_id: impl Into<String>) -> Self {
        self.source_escalation_id = Some(escalation_id.into());
        self
    }

    pub fn with_embeddings(
        mut self,
        question_embedding: Option<Vec<f32>>,
        content_embedding: Option<Vec<f32>>,
    ) -> Self {
        self.question_embedding = question_embedding;
        self.content_embedding = content_embedding;
        self
    }

    /// Vector used for matching: the content embedding first, then the
    /// question embedding. Empty vectors count as missing.
    pub fn search_vector(&self) -> Option<&[f32]> {
        self.content_embedding
            .as_deref()
            .filter(|v| !v.is_empty())
            .or_else(|| self.question_embedding.as_deref().filter(|v| !v.is_empty()))
    }

    /// Text embedded when an entry has no usable vector.
    pub fn fallback_text(&self) -> Option<String> {
        let question = self.question.trim();
        let answer = self.answer.trim();
        match (question.is_empty(), answer.is_empty()) {
            (false, false) => Some(combined_text(question, answer)),
            (false, true) => Some(question.to_string()),
            (true, false) => Some(answer.to_string()),
            (true, true) => None,
        }
    }

    pub fn has_embedding(&self) -> bool {
        self.search_vector().is_some()
    }
}

/// Partial update applied to a stored entry. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_embedding: Option<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_embedding: Option<Vec<f32>>,
}

impl KnowledgeEntryPatch {
    pub fn content_embedding(vector: Vec<f32>) -> Self {
        Self {
            question_embedding: None,
            content_embedding: Some(vector),
        }
    }

    pub fn apply(self, entry: &mut KnowledgeEntry) {
        if let Some(vector) = self.question_embedding {
            entry.question_embedding = Some(vector);
        }
        if let Some(vector) = self.content_embedding {
            entry.content_embedding = Some(vector);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.question_embedding.is_none() && self.content_embedding.is_none()
    }
}

/// The "Question: ...\nAnswer: ..." document embedded as an entry's content.
pub fn combined_text(question: &str, answer: &str) -> String {
    format!("Question: {}\nAnswer: {}", question, answer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_vector_prefers_content() {
        let entry = KnowledgeEntry::new("q", "a")
            .with_embeddings(Some(vec![1.0, 0.0]), Some(vec![0.0, 1.0]));
        assert_eq!(entry.search_vector(), Some(&[0.0, 1.0][..]));
    }

    #[test]
    fn test_empty_vectors_count_as_missing() {
        let entry = KnowledgeEntry::new("q", "a").with_embeddings(Some(vec![0.5]), Some(vec![]));
        assert_eq!(entry.search_vector(), Some(&[0.5][..]));

        let bare = KnowledgeEntry::new("q", "a").with_embeddings(Some(vec![]), None);
        assert!(bare.search_vector().is_none());
    }

    #[test]
    fn test_fallback_text() {
        let both = KnowledgeEntry::new("Do you sell gift cards?", "Yes, any amount.");
        assert_eq!(
            both.fallback_text().as_deref(),
            Some("Question: Do you sell gift cards?\nAnswer: Yes, any amount.")
        );

        assert_eq!(
            KnowledgeEntry::new("Only a question", "").fallback_text().as_deref(),
            Some("Only a question")
        );
        assert_eq!(
            KnowledgeEntry::new("  ", "Only an answer").fallback_text().as_deref(),
            Some("Only an answer")
        );
        assert!(KnowledgeEntry::new("", "").fallback_text().is_none());
    }

    #[test]
    fn test_patch_leaves_other_fields() {
        let mut entry = KnowledgeEntry::new("q", "a").with_embeddings(Some(vec![1.0]), None);
        KnowledgeEntryPatch::content_embedding(vec![0.25, 0.75]).apply(&mut entry);

        assert_eq!(entry.question_embedding, Some(vec![1.0]));
        assert_eq!(entry.content_embedding, Some(vec![0.25, 0.75]));
    }

    #[test]
    fn test_missing_embedding_fields_deserialize() {
        let json = r#"{
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "question": "Are you open Mondays?",
            "answer": "No, we are closed on Mondays.",
            "created_at": "2026-01-01T00:00:00Z"
        }"#;
        let entry: KnowledgeEntry = serde_json::from_str(json).unwrap();
        assert!(entry.question_embedding.is_none());
        assert!(entry.content_embedding.is_none());
        assert!(entry.source_escalation_id.is_none());
    }
}

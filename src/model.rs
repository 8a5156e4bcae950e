//! Flashcard entities and generation results.
//!
//! Field names serialise in camelCase (`lastReviewed`, `reviewCount`, …) so the
//! JSON matches what study front-ends and earlier exports already consume.

use crate::error::FallbackReason;
use crate::pipeline::fallback::PLACEHOLDER_QUESTION_PREFIX;
use crate::pipeline::parse::{CardDraft, ParseStrategy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Highest allowed difficulty rating. `0` means unrated.
pub const MAX_DIFFICULTY: u8 = 4;

/// `source` value for sets generated from pasted text rather than a file.
pub const MANUAL_TEXT_SOURCE: &str = "manual text";

/// A single question/answer study unit with review metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub difficulty: u8,
    #[serde(default)]
    pub last_reviewed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_review: Option<DateTime<Utc>>,
    #[serde(default)]
    pub review_count: u32,
}

impl Flashcard {
    /// Create a fresh, unrated, never-reviewed card with a new id.
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            question: question.into(),
            answer: answer.into(),
            tags: None,
            difficulty: 0,
            last_reviewed: None,
            next_review: None,
            review_count: 0,
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// True for the padding cards the fallback generator adds when the
    /// source text has too few usable sentences.
    pub fn is_placeholder(&self) -> bool {
        self.question
            .strip_prefix(PLACEHOLDER_QUESTION_PREFIX)
            .and_then(|rest| rest.strip_prefix(' '))
            .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
    }
}

impl From<CardDraft> for Flashcard {
    fn from(draft: CardDraft) -> Self {
        Self {
            tags: draft.tags,
            ..Flashcard::new(draft.question, draft.answer)
        }
    }
}

/// A named, ordered collection of flashcards from one source.
///
/// The set owns its cards: deleting the set from a store deletes them too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardSet {
    pub id: Uuid,
    pub title: String,
    pub source: String,
    pub creation_date: DateTime<Utc>,
    pub flashcards: Vec<Flashcard>,
}

impl FlashcardSet {
    pub fn new(
        title: impl Into<String>,
        source: impl Into<String>,
        flashcards: Vec<Flashcard>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            source: source.into(),
            creation_date: Utc::now(),
            flashcards,
        }
    }

    pub fn summary(&self) -> FlashcardSetSummary {
        FlashcardSetSummary {
            id: self.id,
            title: self.title.clone(),
            count: self.flashcards.len(),
        }
    }
}

/// List-view projection of a [`FlashcardSet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardSetSummary {
    pub id: Uuid,
    pub title: String,
    pub count: usize,
}

/// Where the cards of a [`GenerationOutput`] came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CardOrigin {
    /// Parsed from the AI response by the given strategy.
    Ai { strategy: ParseStrategy },
    /// Produced by the deterministic fallback generator.
    Fallback { reason: FallbackReason },
}

/// The result of one generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutput {
    /// Cards in generation order.
    pub flashcards: Vec<Flashcard>,
    /// The card count that was requested.
    pub count: usize,
    pub origin: CardOrigin,
}

impl GenerationOutput {
    pub fn is_fallback(&self) -> bool {
        matches!(self.origin, CardOrigin::Fallback { .. })
    }

    /// Wrap the generated cards into a new set ready for a store.
    pub fn into_set(self, title: impl Into<String>, source: impl Into<String>) -> FlashcardSet {
        FlashcardSet::new(title, source, self.flashcards)
    }
}

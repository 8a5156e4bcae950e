//! Flashcard set persistence.
//!
//! Stores are injected behind the [`FlashcardStore`] trait rather than held
//! as process-wide state, so a caller can run against [`MemoryStore`] in tests
//! and [`JsonFileStore`] on disk without code changes.
//!
//! Both implementations share [`SetCollection`], which owns the validation
//! rules and the set/card bookkeeping. A store only adds locking (and, for the
//! file store, persistence) around it.

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::FlashcardError;
use crate::model::{Flashcard, FlashcardSet, FlashcardSetSummary, MAX_DIFFICULTY};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// CRUD over flashcard sets. Deleting a set deletes its cards.
#[async_trait]
pub trait FlashcardStore: Send + Sync {
    /// Insert a new set. Fails with `DuplicateSet` if its id is taken.
    async fn create_set(&self, set: FlashcardSet) -> Result<FlashcardSet, FlashcardError>;

    /// Summaries of every set, in insertion order.
    async fn list_sets(&self) -> Result<Vec<FlashcardSetSummary>, FlashcardError>;

    async fn get_set(&self, id: Uuid) -> Result<FlashcardSet, FlashcardError>;

    /// Replace the title and/or the whole card list of a set.
    async fn update_set(&self, id: Uuid, update: SetUpdate) -> Result<FlashcardSet, FlashcardError>;

    /// Replace one card (matched by `card.id`) inside a set.
    async fn update_card(&self, set_id: Uuid, card: Flashcard) -> Result<Flashcard, FlashcardError>;

    async fn delete_set(&self, id: Uuid) -> Result<(), FlashcardError>;
}

/// Partial update of a set. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub flashcards: Option<Vec<Flashcard>>,
}

impl SetUpdate {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            flashcards: None,
        }
    }

    pub fn flashcards(flashcards: Vec<Flashcard>) -> Self {
        Self {
            title: None,
            flashcards: Some(flashcards),
        }
    }
}

// ── Validation ───────────────────────────────────────────────────────────

/// Check a card's content fields.
pub fn validate_card(card: &Flashcard) -> Result<(), FlashcardError> {
    if card.question.trim().is_empty() {
        return Err(FlashcardError::InvalidCard(format!(
            "card {}: question is empty",
            card.id
        )));
    }
    if card.answer.trim().is_empty() {
        return Err(FlashcardError::InvalidCard(format!(
            "card {}: answer is empty",
            card.id
        )));
    }
    if card.difficulty > MAX_DIFFICULTY {
        return Err(FlashcardError::InvalidCard(format!(
            "card {}: difficulty {} is above {}",
            card.id, card.difficulty, MAX_DIFFICULTY
        )));
    }
    Ok(())
}

/// Check a whole set: title, every card, and card id uniqueness.
pub fn validate_set(set: &FlashcardSet) -> Result<(), FlashcardError> {
    if set.title.trim().is_empty() {
        return Err(FlashcardError::InvalidCard(format!(
            "set {}: title is empty",
            set.id
        )));
    }

    let mut seen = HashSet::with_capacity(set.flashcards.len());
    for card in &set.flashcards {
        validate_card(card)?;
        if !seen.insert(card.id) {
            return Err(FlashcardError::InvalidCard(format!(
                "set {}: duplicate card id {}",
                set.id, card.id
            )));
        }
    }
    Ok(())
}

// ── Shared collection ────────────────────────────────────────────────────

/// Sets in insertion order, with the operations both stores expose.
///
/// Every mutation validates its result before committing, so a rejected
/// write leaves the collection untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SetCollection {
    sets: Vec<FlashcardSet>,
}

impl SetCollection {
    pub fn new(sets: Vec<FlashcardSet>) -> Self {
        Self { sets }
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Check every set and that set ids are unique.
    pub fn validate(&self) -> Result<(), FlashcardError> {
        let mut seen = HashSet::with_capacity(self.sets.len());
        for set in &self.sets {
            if !seen.insert(set.id) {
                return Err(FlashcardError::DuplicateSet { id: set.id });
            }
            validate_set(set)?;
        }
        Ok(())
    }

    fn position(&self, id: Uuid) -> Result<usize, FlashcardError> {
        self.sets
            .iter()
            .position(|s| s.id == id)
            .ok_or(FlashcardError::SetNotFound { id })
    }

    pub fn create(&mut self, set: FlashcardSet) -> Result<FlashcardSet, FlashcardError> {
        if self.sets.iter().any(|s| s.id == set.id) {
            return Err(FlashcardError::DuplicateSet { id: set.id });
        }
        validate_set(&set)?;
        self.sets.push(set.clone());
        Ok(set)
    }

    pub fn list(&self) -> Vec<FlashcardSetSummary> {
        self.sets.iter().map(FlashcardSet::summary).collect()
    }

    pub fn get(&self, id: Uuid) -> Result<FlashcardSet, FlashcardError> {
        self.position(id).map(|i| self.sets[i].clone())
    }

    pub fn update(&mut self, id: Uuid, update: SetUpdate) -> Result<FlashcardSet, FlashcardError> {
        let index = self.position(id)?;
        let mut staged = self.sets[index].clone();
        if let Some(title) = update.title {
            staged.title = title;
        }
        if let Some(flashcards) = update.flashcards {
            staged.flashcards = flashcards;
        }
        validate_set(&staged)?;
        self.sets[index] = staged.clone();
        Ok(staged)
    }

    pub fn update_card(
        &mut self,
        set_id: Uuid,
        card: Flashcard,
    ) -> Result<Flashcard, FlashcardError> {
        let index = self.position(set_id)?;
        validate_card(&card)?;
        let slot = self.sets[index]
            .flashcards
            .iter_mut()
            .find(|c| c.id == card.id)
            .ok_or(FlashcardError::CardNotFound {
                set_id,
                card_id: card.id,
            })?;
        *slot = card.clone();
        Ok(card)
    }

    pub fn delete(&mut self, id: Uuid) -> Result<(), FlashcardError> {
        let index = self.position(id)?;
        self.sets.remove(index);
        Ok(())
    }
}

//! In-process store. Contents are lost when the store is dropped.

use super::{FlashcardStore, SetCollection, SetUpdate};
use crate::error::FlashcardError;
use crate::model::{Flashcard, FlashcardSet, FlashcardSetSummary};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// [`FlashcardStore`] over a lock-guarded in-memory collection.
///
/// Reads run concurrently; writes are serialized by the lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sets: RwLock<SetCollection>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-filled with `sets`. Sets are not validated.
    pub fn with_sets(sets: Vec<FlashcardSet>) -> Self {
        Self {
            sets: RwLock::new(SetCollection::new(sets)),
        }
    }
}

#[async_trait]
impl FlashcardStore for MemoryStore {
    async fn create_set(&self, set: FlashcardSet) -> Result<FlashcardSet, FlashcardError> {
        let created = self.sets.write().await.create(set)?;
        debug!("Created set {} ({} cards)", created.id, created.flashcards.len());
        Ok(created)
    }

    async fn list_sets(&self) -> Result<Vec<FlashcardSetSummary>, FlashcardError> {
        Ok(self.sets.read().await.list())
    }

    async fn get_set(&self, id: Uuid) -> Result<FlashcardSet, FlashcardError> {
        self.sets.read().await.get(id)
    }

    async fn update_set(
        &self,
        id: Uuid,
        update: SetUpdate,
    ) -> Result<FlashcardSet, FlashcardError> {
        self.sets.write().await.update(id, update)
    }

    async fn update_card(
        &self,
        set_id: Uuid,
        card: Flashcard,
    ) -> Result<Flashcard, FlashcardError> {
        self.sets.write().await.update_card(set_id, card)
    }

    async fn delete_set(&self, id: Uuid) -> Result<(), FlashcardError> {
        self.sets.write().await.delete(id)?;
        debug!("Deleted set {}", id);
        Ok(())
    }
}

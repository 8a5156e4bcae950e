//! Single-file JSON store.
//!
//! ## File layout
//!
//! ```json
//! { "sets": [ { "id": "…", "title": "…", "source": "…",
//!               "creationDate": "…", "flashcards": [ … ] } ] }
//! ```
//!
//! ## Legacy layout
//!
//! Earlier versions of the app kept one object keyed by set id, with
//! snake_case set fields and camelCase card fields:
//!
//! ```json
//! { "<set id>": { "title": "…", "source": "…", "creation_date": "…",
//!                 "flashcards": [ { "id": "…", "question": "…", … } ] } }
//! ```
//!
//! Such a file is migrated on open: the original is copied to `<path>.bak`
//! and the file is rewritten in the current layout.

use super::{validate_card, FlashcardStore, SetCollection, SetUpdate};
use crate::error::FlashcardError;
use crate::model::{Flashcard, FlashcardSet, FlashcardSetSummary, MAX_DIFFICULTY};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Title given to migrated sets that had none.
const UNTITLED: &str = "Untitled set";

/// [`FlashcardStore`] persisted to one JSON file.
///
/// Every successful mutation rewrites the file atomically (temp file +
/// rename). The in-memory state only changes after the write succeeds, so a
/// failed write leaves both the file and the store as they were.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    sets: Mutex<SetCollection>,
}

#[derive(Deserialize)]
struct StoreFile {
    sets: SetCollection,
}

#[derive(Serialize)]
struct StoreFileRef<'a> {
    sets: &'a SetCollection,
}

impl JsonFileStore {
    /// Open the store at `path`, creating nothing until the first write.
    ///
    /// # Errors
    /// `StoreIo` if the file exists but cannot be read or migrated;
    /// `StoreCorrupt` if it is neither the current nor the legacy layout.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, FlashcardError> {
        let path = path.into();
        let sets = match tokio::fs::read(&path).await {
            Ok(bytes) => load(&path, &bytes).await?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No store at {}, starting empty", path.display());
                SetCollection::default()
            }
            Err(e) => return Err(FlashcardError::StoreIo { path, source: e }),
        };

        info!("Opened store {} ({} sets)", path.display(), sets.len());
        Ok(Self {
            path,
            sets: Mutex::new(sets),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `op` to a copy of the collection, persist the copy, then commit.
    async fn mutate<T, F>(&self, op: F) -> Result<T, FlashcardError>
    where
        F: FnOnce(&mut SetCollection) -> Result<T, FlashcardError> + Send,
        T: Send,
    {
        let mut guard = self.sets.lock().await;
        let mut staged = guard.clone();
        let out = op(&mut staged)?;
        persist(&self.path, &staged).await?;
        *guard = staged;
        Ok(out)
    }
}

#[async_trait]
impl FlashcardStore for JsonFileStore {
    async fn create_set(&self, set: FlashcardSet) -> Result<FlashcardSet, FlashcardError> {
        self.mutate(move |sets| sets.create(set)).await
    }

    async fn list_sets(&self) -> Result<Vec<FlashcardSetSummary>, FlashcardError> {
        Ok(self.sets.lock().await.list())
    }

    async fn get_set(&self, id: Uuid) -> Result<FlashcardSet, FlashcardError> {
        self.sets.lock().await.get(id)
    }

    async fn update_set(
        &self,
        id: Uuid,
        update: SetUpdate,
    ) -> Result<FlashcardSet, FlashcardError> {
        self.mutate(move |sets| sets.update(id, update)).await
    }

    async fn update_card(
        &self,
        set_id: Uuid,
        card: Flashcard,
    ) -> Result<Flashcard, FlashcardError> {
        self.mutate(move |sets| sets.update_card(set_id, card)).await
    }

    async fn delete_set(&self, id: Uuid) -> Result<(), FlashcardError> {
        self.mutate(move |sets| sets.delete(id)).await
    }
}

// ── Load / persist ───────────────────────────────────────────────────────

async fn load(path: &Path, bytes: &[u8]) -> Result<SetCollection, FlashcardError> {
    let corrupt = |detail: String| FlashcardError::StoreCorrupt {
        path: path.to_path_buf(),
        detail,
    };

    let value: Value = serde_json::from_slice(bytes).map_err(|e| corrupt(e.to_string()))?;
    let is_current = value.as_object().is_some_and(|o| o.contains_key("sets"));
    if is_current {
        let file: StoreFile = serde_json::from_value(value).map_err(|e| corrupt(e.to_string()))?;
        file.sets.validate().map_err(|e| corrupt(e.to_string()))?;
        return Ok(file.sets);
    }

    let legacy: BTreeMap<String, LegacySet> =
        serde_json::from_value(value).map_err(|e| corrupt(format!("unrecognised layout: {e}")))?;
    let sets = migrate_legacy(legacy);

    let backup = backup_path(path);
    tokio::fs::copy(path, &backup)
        .await
        .map_err(|e| FlashcardError::StoreIo {
            path: backup.clone(),
            source: e,
        })?;
    persist(path, &sets).await?;
    info!(
        "Migrated {} legacy sets in {} (original kept at {})",
        sets.len(),
        path.display(),
        backup.display()
    );
    Ok(sets)
}

/// Atomic write: serialize to `<path>.tmp`, then rename over `path`.
async fn persist(path: &Path, sets: &SetCollection) -> Result<(), FlashcardError> {
    let io_err = |e: std::io::Error| FlashcardError::StoreIo {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let json = serde_json::to_vec_pretty(&StoreFileRef { sets })
        .map_err(|e| FlashcardError::Internal(format!("store serialisation: {e}")))?;

    let tmp_path = sibling_with_suffix(path, "tmp");
    tokio::fs::write(&tmp_path, &json).await.map_err(io_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(io_err)?;
    debug!("Persisted {} sets to {}", sets.len(), path.display());
    Ok(())
}

fn backup_path(path: &Path) -> PathBuf {
    sibling_with_suffix(path, "bak")
}

/// `path` with `.suffix` appended to the full file name.
fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

// ── Legacy migration ─────────────────────────────────────────────────────

#[derive(Deserialize)]
struct LegacySet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    creation_date: Option<String>,
    #[serde(default)]
    flashcards: Vec<LegacyCard>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyCard {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    question: String,
    #[serde(default)]
    answer: String,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    difficulty: Option<i64>,
    #[serde(default)]
    last_reviewed: Option<String>,
    #[serde(default)]
    next_review: Option<String>,
    #[serde(default)]
    review_count: Option<u32>,
}

/// Convert keyed legacy sets, oldest first.
///
/// Unparseable ids are replaced, out-of-range difficulties clamped, and
/// cards with a blank question or answer dropped, each with a warning.
fn migrate_legacy(legacy: BTreeMap<String, LegacySet>) -> SetCollection {
    let mut sets: Vec<FlashcardSet> = legacy
        .into_iter()
        .map(|(key, set)| migrate_set(&key, set))
        .collect();
    sets.sort_by_key(|s| s.creation_date);
    SetCollection::new(sets)
}

fn migrate_set(key: &str, legacy: LegacySet) -> FlashcardSet {
    let id = Uuid::parse_str(key).unwrap_or_else(|_| {
        warn!("Legacy set id '{}' is not a UUID, assigning a new one", key);
        Uuid::new_v4()
    });
    let title = if legacy.title.trim().is_empty() {
        UNTITLED.to_string()
    } else {
        legacy.title
    };
    let creation_date = legacy
        .creation_date
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or_else(Utc::now);

    let mut seen = HashSet::new();
    let flashcards = legacy
        .flashcards
        .into_iter()
        .filter_map(|card| migrate_card(card, &mut seen))
        .collect();

    FlashcardSet {
        id,
        title,
        source: legacy.source.unwrap_or_default(),
        creation_date,
        flashcards,
    }
}

fn migrate_card(legacy: LegacyCard, seen: &mut HashSet<Uuid>) -> Option<Flashcard> {
    let mut id = legacy
        .id
        .as_deref()
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);
    if !seen.insert(id) {
        id = Uuid::new_v4();
        seen.insert(id);
    }

    let card = Flashcard {
        id,
        question: legacy.question,
        answer: legacy.answer,
        tags: legacy.tags.filter(|t| !t.is_empty()),
        difficulty: legacy.difficulty.unwrap_or(0).clamp(0, MAX_DIFFICULTY as i64) as u8,
        last_reviewed: legacy.last_reviewed.as_deref().and_then(parse_timestamp),
        next_review: legacy.next_review.as_deref().and_then(parse_timestamp),
        review_count: legacy.review_count.unwrap_or(0),
    };

    match validate_card(&card) {
        Ok(()) => Some(card),
        Err(e) => {
            warn!("Dropping legacy card: {}", e);
            None
        }
    }
}

/// RFC 3339, or a naive ISO-8601 timestamp taken as UTC.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

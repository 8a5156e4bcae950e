//! Error types for the edgequake-flashcards library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`FlashcardError`] (**fatal**): the request itself is wrong (a zero card
//!   count, a missing input file, an unknown set id). Returned as
//!   `Err(FlashcardError)` from the public entry points.
//!
//! * [`FallbackReason`] (**non-fatal**): the AI stage could not produce cards
//!   (no credential, timeout, unparseable reply). The pipeline answers with
//!   deterministic fallback cards and records the reason in
//!   [`crate::model::CardOrigin::Fallback`].
//!
//! * [`ExtractionError`] (**absorbed**): a page or a whole document yielded
//!   no text. Logged and turned into empty text so generation can still run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// All fatal errors returned by the edgequake-flashcards library.
#[derive(Debug, Error)]
pub enum FlashcardError {
    // ── Request errors ────────────────────────────────────────────────────
    /// A generation call asked for zero cards.
    #[error("Card count must be at least 1, got {count}")]
    InvalidCount { count: usize },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// The file extension is not one of the supported source kinds.
    #[error("File type not allowed: '{name}'\nSupported: pdf, png, jpg, jpeg, txt, md")]
    UnsupportedFileType { name: String },

    /// The input exceeds the configured size cap.
    #[error("Input '{name}' is {size} bytes, above the {limit}-byte limit")]
    InputTooLarge {
        name: String,
        size: usize,
        limit: usize,
    },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Store errors ──────────────────────────────────────────────────────
    /// No flashcard set with this id exists.
    #[error("Flashcard set not found: {id}")]
    SetNotFound { id: Uuid },

    /// The set exists but holds no card with this id.
    #[error("Flashcard {card_id} not found in set {set_id}")]
    CardNotFound { set_id: Uuid, card_id: Uuid },

    /// A set with this id is already stored.
    #[error("Flashcard set {id} already exists")]
    DuplicateSet { id: Uuid },

    /// A card or set failed write-time validation.
    #[error("Invalid flashcard data: {0}")]
    InvalidCard(String),

    /// The backing file of a persistent store could not be read or written.
    #[error("Store I/O failed for '{path}': {source}")]
    StoreIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file exists but does not hold flashcard sets.
    #[error("Store file '{path}' is corrupt: {detail}")]
    StoreCorrupt { path: PathBuf, detail: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why a generation call answered with fallback cards instead of AI cards.
///
/// None of these reach the caller as an `Err`; they are reported through
/// [`crate::model::GenerationOutput::origin`].
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FallbackReason {
    /// No AI credential or provider is configured.
    #[error("no AI provider configured: {hint}")]
    NotConfigured { hint: String },

    /// The source text was empty, so there was nothing to send.
    #[error("source text is empty")]
    EmptySource,

    /// The AI call failed (transport, auth, rate limit, provider error).
    #[error("AI call failed: {detail}")]
    Unavailable { detail: String },

    /// The AI call did not answer within the configured timeout.
    #[error("AI call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The AI answered but no parse strategy could recover valid cards.
    #[error("AI output could not be parsed: {detail} (response: {excerpt:?})")]
    MalformedOutput { detail: String, excerpt: String },
}

/// A document- or page-level extraction failure.
///
/// Never returned from [`crate::pipeline::extract::extract`]; it exists so the
/// page loop can log precisely what went wrong before substituting empty text.
#[derive(Debug, Clone, Error)]
pub enum ExtractionError {
    /// The pdfium shared library could not be loaded.
    #[error("pdfium library unavailable: {0}")]
    PdfiumUnavailable(String),

    /// The bytes are not a readable PDF.
    #[error("document could not be opened: {0}")]
    UnreadableDocument(String),

    /// One page could not be read; other pages are unaffected.
    #[error("page {page}: {detail}")]
    Page { page: usize, detail: String },
}

//! Pipeline stages for source-to-flashcard generation.
//!
//! Each submodule implements exactly one step. Only [`input`] and [`llm`]
//! touch the outside world; the remaining stages are pure and unit-tested in
//! place.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ llm ──▶ parse ──┬──▶ cards
//! (path/URL)  (text)    (AI)   (JSON)   │
//!                                        └──▶ fallback (sentences)
//! ```
//!
//! 1. [`input`]: resolve a path or URL to bytes plus a [`extract::SourceKind`]
//! 2. [`extract`]: bytes to plain text; runs in `spawn_blocking` because
//!    pdfium is not async-safe, and never fails
//! 3. [`llm`]: the single AI call behind the [`llm::TextGenerator`] seam
//! 4. [`parse`]: ordered strategies that pull a card array out of free-form
//!    model output
//! 5. [`fallback`]: deterministic sentence-based cards whenever 3 or 4 cannot
//!    deliver

pub mod extract;
pub mod fallback;
pub mod input;
pub mod llm;
pub mod parse;

//! # edgequake-flashcards
//!
//! Turn study material (PDFs, images, plain text) into question/answer
//! flashcards with a Large Language Model, and keep them in a store.
//!
//! ## Why this crate?
//!
//! Asking a model for "10 flashcards as JSON" works most of the time. The
//! rest of the time the reply is fenced, wrapped in chatter, truncated, or
//! the service is down. This crate treats the model as an unreliable
//! collaborator: it digs the card array out of whatever comes back, and when
//! nothing usable arrives it answers with deterministic sentence-based cards
//! instead of an error. A valid request always yields cards.
//!
//! ## Pipeline Overview
//!
//! ```text
//! source
//!  │
//!  ├─ 1. Input     resolve local file or download from URL
//!  ├─ 2. Extract   PDF text via pdfium (spawn_blocking), image stub, UTF-8 text
//!  ├─ 3. Generate  one LLM call, bounded by a timeout
//!  ├─ 4. Parse     whole reply → ```json fence → any fence → bare [ … ]
//!  ├─ 5. Fallback  sentence cards + numbered placeholders when 3/4 fail
//!  └─ 6. Store     optional: memory or JSON-file set store
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_flashcards::{FlashcardGenerator, GenerationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let generator = FlashcardGenerator::new(GenerationConfig::default());
//!     let (source, output) = generator.generate_from_input("notes.pdf", 10).await?;
//!     for card in &output.flashcards {
//!         println!("Q: {}\nA: {}\n", card.question, card.answer);
//!     }
//!     let set = output.into_set(source.title(), source.name);
//!     eprintln!("{} cards in '{}'", set.flashcards.len(), set.title);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `flashcards` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-flashcards = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod model;
pub mod pipeline;
pub mod prompts;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{GenerationConfig, GenerationConfigBuilder};
pub use error::{ExtractionError, FallbackReason, FlashcardError};
pub use generate::{fallback_cards, FlashcardGenerator};
pub use model::{CardOrigin, Flashcard, FlashcardSet, FlashcardSetSummary, GenerationOutput};
pub use pipeline::extract::{extract, SourceKind};
pub use pipeline::input::{resolve_input, SourceDocument};
pub use pipeline::llm::{LlmTextGenerator, TextGenerator};
pub use pipeline::parse::{parse_cards, ParseStrategy};
pub use store::{FlashcardStore, JsonFileStore, MemoryStore, SetUpdate};

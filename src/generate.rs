//! Generation entry points: text, source documents and inputs to flashcards.
//!
//! ## Why does generation almost never fail?
//!
//! A learner who uploads a document expects cards back. Every AI-side problem
//! (no credential, network error, timeout, unparseable reply) is therefore
//! absorbed: [`FlashcardGenerator::generate`] answers with deterministic
//! fallback cards and records the cause in [`CardOrigin::Fallback`]. Only
//! caller mistakes (a zero count, a missing file) come back as `Err`.

use crate::config::GenerationConfig;
use crate::error::{FallbackReason, FlashcardError};
use crate::model::{CardOrigin, Flashcard, GenerationOutput};
use crate::pipeline::extract;
use crate::pipeline::fallback::fallback_drafts;
use crate::pipeline::input::{self, SourceDocument};
use crate::pipeline::llm::{self, TextGenerator};
use crate::pipeline::parse::{self, ParseStrategy};
use crate::prompts::flashcard_prompt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Characters of a bad AI response kept for logs and diagnostics.
const EXCERPT_CHARS: usize = 200;

/// Turns text into flashcards, preferring the AI service and falling back to
/// sentence-based cards.
///
/// The text generator is resolved once at construction. The generator holds
/// no per-call state, so one instance can serve concurrent requests behind an
/// `Arc`.
///
/// # Example
/// ```rust,no_run
/// use edgequake_flashcards::{FlashcardGenerator, GenerationConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let generator = FlashcardGenerator::new(GenerationConfig::default());
/// let output = generator
///     .generate("Paris is the capital of France. It lies on the Seine.", 2)
///     .await?;
/// for card in &output.flashcards {
///     println!("{} -> {}", card.question, card.answer);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FlashcardGenerator {
    config: GenerationConfig,
    generator: Result<Arc<dyn TextGenerator>, FallbackReason>,
}

impl FlashcardGenerator {
    pub fn new(config: GenerationConfig) -> Self {
        let generator = llm::resolve_generator(&config);
        if let Err(ref reason) = generator {
            info!("AI generation disabled, fallback cards only: {}", reason);
        }
        Self { config, generator }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// True when an AI text generator was resolved.
    pub fn has_ai(&self) -> bool {
        self.generator.is_ok()
    }

    /// Generate `count` flashcards from `text`.
    ///
    /// # Errors
    /// Only [`FlashcardError::InvalidCount`] when `count == 0`.
    pub async fn generate(
        &self,
        text: &str,
        count: usize,
    ) -> Result<GenerationOutput, FlashcardError> {
        if count == 0 {
            return Err(FlashcardError::InvalidCount { count });
        }

        let start = Instant::now();
        info!(
            "Generating {} flashcards from {} chars",
            count,
            text.chars().count()
        );

        let output = match self.generate_with_ai(text, count).await {
            Ok((strategy, flashcards)) => GenerationOutput {
                flashcards,
                count,
                origin: CardOrigin::Ai { strategy },
            },
            Err(reason) => {
                warn!("Using fallback flashcards: {}", reason);
                GenerationOutput {
                    flashcards: fallback_cards(text, count),
                    count,
                    origin: CardOrigin::Fallback { reason },
                }
            }
        };

        info!(
            "Generated {} flashcards in {:?} ({})",
            output.flashcards.len(),
            start.elapsed(),
            if output.is_fallback() { "fallback" } else { "ai" }
        );
        Ok(output)
    }

    /// Extract text from `source`, then [`generate`](Self::generate).
    pub async fn generate_from_source(
        &self,
        source: &SourceDocument,
        count: usize,
    ) -> Result<GenerationOutput, FlashcardError> {
        if count == 0 {
            return Err(FlashcardError::InvalidCount { count });
        }
        debug!("Extracting {} ({:?})", source.name, source.kind);
        let text = extract::extract_async(source.bytes.clone(), source.kind).await;
        self.generate(&text, count).await
    }

    /// Resolve a path or URL, extract, and generate.
    ///
    /// Returns the resolved source too, so callers can title and store the
    /// resulting set.
    pub async fn generate_from_input(
        &self,
        input: &str,
        count: usize,
    ) -> Result<(SourceDocument, GenerationOutput), FlashcardError> {
        if count == 0 {
            return Err(FlashcardError::InvalidCount { count });
        }
        let source = input::resolve_input(input, &self.config).await?;
        let output = self.generate_from_source(&source, count).await?;
        Ok((source, output))
    }

    /// Blocking wrapper around [`generate`](Self::generate).
    ///
    /// Creates a temporary tokio runtime internally, so it must not be called
    /// from inside an async context.
    pub fn generate_sync(
        &self,
        text: &str,
        count: usize,
    ) -> Result<GenerationOutput, FlashcardError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| {
                FlashcardError::Internal(format!("Failed to create tokio runtime: {}", e))
            })?
            .block_on(self.generate(text, count))
    }

    /// The AI path. Any `Err` sends the caller to the fallback generator.
    async fn generate_with_ai(
        &self,
        text: &str,
        count: usize,
    ) -> Result<(ParseStrategy, Vec<Flashcard>), FallbackReason> {
        let generator = self.generator.as_ref().map_err(|reason| reason.clone())?;

        if text.trim().is_empty() {
            return Err(FallbackReason::EmptySource);
        }

        let excerpt = truncate_chars(text, self.config.max_input_chars);
        if excerpt.len() < text.len() {
            debug!(
                "Truncated source to {} chars for the AI call",
                self.config.max_input_chars
            );
        }
        let prompt = flashcard_prompt(excerpt, count);

        let secs = self.config.api_timeout_secs;
        let raw = match tokio::time::timeout(
            Duration::from_secs(secs),
            generator.generate_text(&prompt),
        )
        .await
        {
            Ok(Ok(raw)) => raw,
            Ok(Err(detail)) => return Err(FallbackReason::Unavailable { detail }),
            Err(_) => return Err(FallbackReason::Timeout { secs }),
        };

        match parse::parse_cards(&raw) {
            Ok((strategy, drafts)) => {
                debug!("Parsed {} cards via {}", drafts.len(), strategy);
                if drafts.len() != count {
                    debug!("Model returned {} cards, {} requested", drafts.len(), count);
                }
                Ok((strategy, drafts.into_iter().map(Flashcard::from).collect()))
            }
            Err(failures) => {
                let detail = failures
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                Err(FallbackReason::MalformedOutput {
                    detail,
                    excerpt: truncate_chars(&raw, EXCERPT_CHARS).to_string(),
                })
            }
        }
    }
}

/// Exactly `count` deterministic cards built from `text`.
pub fn fallback_cards(text: &str, count: usize) -> Vec<Flashcard> {
    fallback_drafts(text, count)
        .into_iter()
        .map(Flashcard::from)
        .collect()
}

/// The first `max_chars` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo");
        assert_eq!(truncate_chars("short", 100), "short");
        assert_eq!(truncate_chars("", 3), "");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn fallback_cards_have_fresh_ids() {
        let cards = fallback_cards("", 3);
        assert_eq!(cards.len(), 3);
        assert_ne!(cards[0].id, cards[1].id);
        assert_ne!(cards[1].id, cards[2].id);
        assert!(cards.iter().all(Flashcard::is_placeholder));
    }

    #[test]
    fn sync_wrapper_rejects_zero_count() {
        let generator = FlashcardGenerator::new(GenerationConfig::default());
        let err = generator.generate_sync("text", 0).unwrap_err();
        assert!(matches!(err, FlashcardError::InvalidCount { count: 0 }));
    }
}

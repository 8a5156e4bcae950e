//! Configuration types for flashcard generation.
//!
//! All generation behaviour is controlled through [`GenerationConfig`], built
//! via its [`GenerationConfigBuilder`]. The pipeline itself is stateless, so a
//! single config can be shared across any number of concurrent requests.

use crate::error::FlashcardError;
use crate::pipeline::llm::TextGenerator;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Configuration for flashcard generation.
///
/// Built via [`GenerationConfig::builder()`] or using
/// [`GenerationConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_flashcards::GenerationConfig;
///
/// let config = GenerationConfig::builder()
///     .default_count(12)
///     .model("gpt-4.1-nano")
///     .api_timeout_secs(30)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// Cards requested when the caller does not say. Default: 10.
    pub default_count: usize,

    /// Head-truncation limit, in characters, for text sent to the model. Default: 4000.
    ///
    /// Bounds request cost and latency and keeps prompts below provider
    /// payload limits. The fallback generator always sees the full text.
    pub max_input_chars: usize,

    /// Largest accepted input file or download, in bytes. Default: 16 MiB.
    pub max_input_bytes: usize,

    /// LLM model identifier, e.g. "gpt-4.1-nano", "claude-sonnet-4-20250514".
    /// If None, uses provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the environment is probed.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed text generator. Takes precedence over every provider
    /// setting; mostly useful for tests and custom backends.
    pub text_generator: Option<Arc<dyn TextGenerator>>,

    /// Sampling temperature for the completion. Default: 0.3.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 2048.
    pub max_tokens: usize,

    /// Timeout for the single AI call, in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Custom system prompt. If None, uses built-in default.
    pub system_prompt: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            default_count: 10,
            max_input_chars: 4000,
            max_input_bytes: 16 * 1024 * 1024,
            model: None,
            provider_name: None,
            provider: None,
            text_generator: None,
            temperature: 0.3,
            max_tokens: 2048,
            api_timeout_secs: 60,
            download_timeout_secs: 120,
            system_prompt: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("default_count", &self.default_count)
            .field("max_input_chars", &self.max_input_chars)
            .field("max_input_bytes", &self.max_input_bytes)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field(
                "text_generator",
                &self.text_generator.as_ref().map(|_| "<dyn TextGenerator>"),
            )
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn default_count(mut self, n: usize) -> Self {
        self.config.default_count = n;
        self
    }

    pub fn max_input_chars(mut self, n: usize) -> Self {
        self.config.max_input_chars = n;
        self
    }

    pub fn max_input_bytes(mut self, n: usize) -> Self {
        self.config.max_input_bytes = n;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn text_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.config.text_generator = Some(generator);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, FlashcardError> {
        let c = &self.config;
        if c.default_count == 0 {
            return Err(FlashcardError::InvalidConfig(
                "Default card count must be ≥ 1".into(),
            ));
        }
        if c.max_input_chars == 0 {
            return Err(FlashcardError::InvalidConfig(
                "max_input_chars must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(FlashcardError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = GenerationConfig::default();
        assert_eq!(c.default_count, 10);
        assert_eq!(c.max_input_chars, 4000);
        assert_eq!(c.max_input_bytes, 16 * 1024 * 1024);
        assert_eq!(c.api_timeout_secs, 60);
        assert!(c.provider.is_none());
        assert!(c.text_generator.is_none());
    }

    #[test]
    fn temperature_is_clamped() {
        let c = GenerationConfig::builder().temperature(9.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn zero_default_count_rejected() {
        let err = GenerationConfig::builder().default_count(0).build().unwrap_err();
        assert!(matches!(err, FlashcardError::InvalidConfig(_)));
    }

    #[test]
    fn zero_timeout_rejected() {
        assert!(GenerationConfig::builder().api_timeout_secs(0).build().is_err());
    }

    #[test]
    fn debug_hides_provider_internals() {
        let dbg = format!("{:?}", GenerationConfig::default());
        assert!(dbg.contains("max_input_chars: 4000"));
    }
}

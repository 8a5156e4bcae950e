//! AI interaction: the single text-generation call of a pipeline run.
//!
//! The pipeline only needs one capability from an AI service: prompt in, raw
//! text out. [`TextGenerator`] is that seam. [`LlmTextGenerator`] implements it
//! on top of any `edgequake_llm` provider; tests and custom backends implement
//! it directly.
//!
//! A generator is called at most once per pipeline run; there is no retry
//! loop. The timeout is applied by the caller.

use crate::config::GenerationConfig;
use crate::error::FallbackReason;
use crate::prompts::DEFAULT_SYSTEM_PROMPT;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Model used when a provider is named without a model.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// A service that turns a prompt into free-form text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for `prompt`.
    ///
    /// The error string is only used for logging and for
    /// [`crate::error::FallbackReason::Unavailable`].
    async fn generate_text(&self, prompt: &str) -> Result<String, String>;
}

/// [`TextGenerator`] backed by an `edgequake_llm` chat provider.
///
/// Sends the system prompt and the user prompt as two chat messages.
pub struct LlmTextGenerator {
    provider: Arc<dyn LLMProvider>,
    system_prompt: String,
    options: CompletionOptions,
}

impl LlmTextGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &GenerationConfig) -> Self {
        Self {
            provider,
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            options: build_options(config),
        }
    }
}

#[async_trait]
impl TextGenerator for LlmTextGenerator {
    async fn generate_text(&self, prompt: &str) -> Result<String, String> {
        let start = Instant::now();
        let messages = vec![
            ChatMessage::system(self.system_prompt.as_str()),
            ChatMessage::user(prompt),
        ];

        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| e.to_string())?;

        debug!(
            "LLM: {} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        Ok(response.content)
    }
}

/// Build `CompletionOptions` from the generation config.
fn build_options(config: &GenerationConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Resolve the text generator, from most-specific to least-specific.
///
/// 1. **Pre-built generator** (`config.text_generator`).
/// 2. **Pre-built provider** (`config.provider`).
/// 3. **Named provider + model** (`config.provider_name`); the factory reads
///    the matching API key from the environment.
/// 4. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 5. **OpenAI key** (`OPENAI_API_KEY`), preferred when several keys exist.
/// 6. **Full auto-detection** (`ProviderFactory::from_env`).
///
/// `Err` means "no AI available": the pipeline falls back, it does not fail.
pub fn resolve_generator(
    config: &GenerationConfig,
) -> Result<Arc<dyn TextGenerator>, FallbackReason> {
    if let Some(ref generator) = config.text_generator {
        return Ok(Arc::clone(generator));
    }

    let provider = resolve_provider(config)?;
    Ok(Arc::new(LlmTextGenerator::new(provider, config)))
}

fn resolve_provider(config: &GenerationConfig) -> Result<Arc<dyn LLMProvider>, FallbackReason> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| FallbackReason::NotConfigured {
            hint: format!(
                "no LLM provider auto-detected from environment; \
                 set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider ({e})"
            ),
        })?;

    Ok(llm_provider)
}

fn create_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, FallbackReason> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        FallbackReason::NotConfigured {
            hint: format!("provider '{provider_name}': {e}"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl TextGenerator for Echo {
        async fn generate_text(&self, prompt: &str) -> Result<String, String> {
            Ok(prompt.to_uppercase())
        }
    }

    #[test]
    fn build_options_defaults() {
        let config = GenerationConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.3));
        assert_eq!(opts.max_tokens, Some(2048));
    }

    #[test]
    fn explicit_generator_wins() {
        let config = GenerationConfig::builder()
            .text_generator(Arc::new(Echo))
            .provider_name("definitely-not-a-provider")
            .build()
            .unwrap();
        assert!(resolve_generator(&config).is_ok());
    }

    #[tokio::test]
    async fn generator_trait_object_is_callable() {
        let generator: Arc<dyn TextGenerator> = Arc::new(Echo);
        assert_eq!(generator.generate_text("abc").await.unwrap(), "ABC");
    }
}

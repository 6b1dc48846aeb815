//! Shared edgequake-llm plumbing for the chat-based adapters.
//!
//! Both vision and text adapters follow the same shape: build a message
//! list, call [`LLMProvider::chat`] under a per-call timeout, and map the
//! outcome into `Result<Option<String>, ProviderError>`. Retry lives one
//! level up in [`crate::retry`], so this module makes exactly one call.

use crate::config::TranslatorConfig;
use crate::error::ProviderError;
use crate::pipeline::normalize::normalize_translation;
use crate::provider::ProviderId;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// A connected edgequake-llm provider plus the call options for it.
pub struct LlmClient {
    id: ProviderId,
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
    timeout_secs: u64,
}

impl LlmClient {
    /// Wrap an already-built provider. Used by tests and callers with custom
    /// provider wiring.
    pub fn new(id: ProviderId, provider: Arc<dyn LLMProvider>, config: &TranslatorConfig) -> Self {
        Self {
            id,
            provider,
            options: build_options(config),
            timeout_secs: config.api_timeout_secs,
        }
    }

    /// Build through [`ProviderFactory`] when `api_key` is present.
    ///
    /// The factory reads the provider's key variable from the environment on
    /// its own; the explicit key here only gates whether we try.
    pub fn connect(
        id: ProviderId,
        factory_name: &str,
        model: &str,
        api_key: Option<&str>,
        config: &TranslatorConfig,
    ) -> Option<Self> {
        api_key?;
        match ProviderFactory::create_llm_provider(factory_name, model) {
            Ok(provider) => {
                debug!("{}: using {} model {}", id, factory_name, model);
                Some(Self::new(id, provider, config))
            }
            Err(e) => {
                warn!("{}: could not create {} provider: {}", id, factory_name, e);
                None
            }
        }
    }

    /// One chat round-trip. Empty answers come back as `Ok(None)`.
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<Option<String>, ProviderError> {
        let start = Instant::now();
        let call = self.provider.chat(messages, Some(&self.options));
        let response = match timeout(Duration::from_secs(self.timeout_secs), call).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(ProviderError::from_message(self.id.as_str(), e.to_string())),
            Err(_) => {
                return Err(ProviderError::Timeout {
                    provider: self.id.to_string(),
                    secs: self.timeout_secs,
                })
            }
        };

        debug!(
            "{}: {} input tokens, {} output tokens, {:?}",
            self.id,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        let text = normalize_translation(&response.content);
        Ok((!text.is_empty()).then_some(text))
    }
}

fn build_options(config: &TranslatorConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_follow_config() {
        let config = TranslatorConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.1));
        assert_eq!(opts.max_tokens, Some(8192));
    }

    #[test]
    fn connect_without_key_is_none() {
        let config = TranslatorConfig::default();
        assert!(LlmClient::connect(
            ProviderId::OpenAiText,
            "openai",
            "gpt-4o-mini",
            None,
            &config
        )
        .is_none());
    }
}

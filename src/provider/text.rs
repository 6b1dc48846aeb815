//! Text adapters: a chat model translates the extracted text.

use crate::acceptance::ProviderTier;
use crate::config::{Credentials, TranslatorConfig};
use crate::error::ProviderError;
use crate::pipeline::input::MediaKind;
use crate::prompts::{text_prompt, TRANSLATOR_SYSTEM_PROMPT};
use crate::provider::llm::LlmClient;
use crate::provider::{has_extracted_text, ProviderId, ProviderRequest, TranslationProvider};
use async_trait::async_trait;
use edgequake_llm::ChatMessage;
use tracing::debug;

pub struct ChatTextProvider {
    id: ProviderId,
    client: Option<LlmClient>,
}

impl ChatTextProvider {
    pub fn openai(credentials: &Credentials, config: &TranslatorConfig) -> Self {
        let id = ProviderId::OpenAiText;
        Self {
            id,
            client: LlmClient::connect(
                id,
                "openai",
                &config.models.openai_text,
                credentials.openai.as_deref(),
                config,
            ),
        }
    }

    pub fn openrouter(credentials: &Credentials, config: &TranslatorConfig) -> Self {
        let id = ProviderId::OpenRouterText;
        Self {
            id,
            client: LlmClient::connect(
                id,
                "openrouter",
                &config.models.openrouter_text,
                credentials.openrouter.as_deref(),
                config,
            ),
        }
    }

    pub fn with_client(id: ProviderId, client: LlmClient) -> Self {
        Self {
            id,
            client: Some(client),
        }
    }
}

#[async_trait]
impl TranslationProvider for ChatTextProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn tier(&self) -> ProviderTier {
        ProviderTier::Text
    }

    fn supports(&self, kind: MediaKind) -> bool {
        has_extracted_text(kind)
    }

    fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    async fn translate(&self, request: &ProviderRequest) -> Result<Option<String>, ProviderError> {
        let Some(client) = &self.client else {
            return Ok(None);
        };
        if request.text.trim().is_empty() {
            debug!("{}: no extracted text, declining", self.id);
            return Ok(None);
        }

        let prompt = text_prompt(request.source, request.target, &request.text);
        let messages = vec![
            ChatMessage::system(TRANSLATOR_SYSTEM_PROMPT),
            ChatMessage::user(&prompt),
        ];
        client.chat(&messages).await
    }
}

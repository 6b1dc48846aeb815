//! Vision adapters: a multimodal chat model reads the image directly.
//!
//! Used first for image uploads because OCR and translation happen in one
//! step, which keeps tables and layout intact far better than OCR text fed
//! to a text model.

use crate::acceptance::ProviderTier;
use crate::config::{Credentials, TranslatorConfig};
use crate::error::ProviderError;
use crate::pipeline::encode::image_data;
use crate::pipeline::input::MediaKind;
use crate::prompts::{document_prompt, TRANSLATOR_SYSTEM_PROMPT};
use crate::provider::llm::LlmClient;
use crate::provider::{ProviderId, ProviderRequest, TranslationProvider};
use async_trait::async_trait;
use edgequake_llm::ChatMessage;
use tracing::debug;

/// A vision model reached through edgequake-llm.
pub struct VisionProvider {
    id: ProviderId,
    client: Option<LlmClient>,
}

impl VisionProvider {
    pub fn gemini(credentials: &Credentials, config: &TranslatorConfig) -> Self {
        let id = ProviderId::GeminiVision;
        Self {
            id,
            client: LlmClient::connect(
                id,
                "gemini",
                &config.models.gemini_vision,
                credentials.gemini.as_deref(),
                config,
            ),
        }
    }

    pub fn openai(credentials: &Credentials, config: &TranslatorConfig) -> Self {
        let id = ProviderId::OpenAiVision;
        Self {
            id,
            client: LlmClient::connect(
                id,
                "openai",
                &config.models.openai_vision,
                credentials.openai.as_deref(),
                config,
            ),
        }
    }

    /// Use a pre-built client, e.g. a mock provider in tests.
    pub fn with_client(id: ProviderId, client: LlmClient) -> Self {
        Self {
            id,
            client: Some(client),
        }
    }
}

#[async_trait]
impl TranslationProvider for VisionProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn tier(&self) -> ProviderTier {
        ProviderTier::Vision
    }

    fn supports(&self, kind: MediaKind) -> bool {
        kind == MediaKind::Image
    }

    fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    async fn translate(&self, request: &ProviderRequest) -> Result<Option<String>, ProviderError> {
        let Some(client) = &self.client else {
            return Ok(None);
        };
        if !self.supports(request.kind) || request.bytes.is_empty() {
            debug!("{}: declining {} input", self.id, request.kind);
            return Ok(None);
        }

        let prompt = document_prompt(request.source, request.target);
        let messages = vec![
            ChatMessage::system(TRANSLATOR_SYSTEM_PROMPT),
            ChatMessage::user_with_images(
                &prompt,
                vec![image_data(&request.media_type, &request.bytes)],
            ),
        ];
        client.chat(&messages).await
    }
}

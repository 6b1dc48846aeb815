//! Translation provider adapters.
//!
//! Every external service sits behind [`TranslationProvider`], a single
//! capability trait with a uniform call shape. The orchestrator only ever
//! sees `Arc<dyn TranslationProvider>`, so tests substitute fakes without
//! any network access.
//!
//! ## Adapters
//!
//! | id                | tier     | backing                        |
//! |-------------------|----------|--------------------------------|
//! | `gemini-vision`   | vision   | edgequake-llm `gemini`         |
//! | `openai-vision`   | vision   | edgequake-llm `openai`         |
//! | `claude-document` | document | Anthropic Messages API         |
//! | `openai-text`     | text     | edgequake-llm `openai`         |
//! | `openrouter-text` | text     | edgequake-llm `openrouter`     |
//! | `free-fallback`   | free     | Google gtx, MyMemory, Libre    |

pub mod anthropic;
pub mod free;
pub mod llm;
pub mod text;
pub mod vision;

use crate::acceptance::ProviderTier;
use crate::config::{Credentials, TranslatorConfig};
use crate::error::ProviderError;
use crate::language::Language;
use crate::pipeline::input::{FilePayload, MediaKind};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Stable identifier for each adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProviderId {
    #[serde(rename = "gemini-vision")]
    GeminiVision,
    #[serde(rename = "openai-vision")]
    OpenAiVision,
    #[serde(rename = "claude-document")]
    ClaudeDocument,
    #[serde(rename = "openai-text")]
    OpenAiText,
    #[serde(rename = "openrouter-text")]
    OpenRouterText,
    #[serde(rename = "free-fallback")]
    FreeFallback,
}

impl ProviderId {
    pub const ALL: [ProviderId; 6] = [
        ProviderId::GeminiVision,
        ProviderId::OpenAiVision,
        ProviderId::ClaudeDocument,
        ProviderId::OpenAiText,
        ProviderId::OpenRouterText,
        ProviderId::FreeFallback,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderId::GeminiVision => "gemini-vision",
            ProviderId::OpenAiVision => "openai-vision",
            ProviderId::ClaudeDocument => "claude-document",
            ProviderId::OpenAiText => "openai-text",
            ProviderId::OpenRouterText => "openrouter-text",
            ProviderId::FreeFallback => "free-fallback",
        }
    }

    /// Label shown as the `model` field of a result.
    pub fn model_label(self, config: &TranslatorConfig) -> String {
        let m = &config.models;
        match self {
            ProviderId::GeminiVision => format!("Google {}", m.gemini_vision),
            ProviderId::OpenAiVision => format!("OpenAI {}", m.openai_vision),
            ProviderId::ClaudeDocument => format!("Anthropic {}", m.anthropic_document),
            ProviderId::OpenAiText => format!("OpenAI {}", m.openai_text),
            ProviderId::OpenRouterText => format!("OpenRouter {}", m.openrouter_text),
            ProviderId::FreeFallback => "Free translation services".to_string(),
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything an adapter may need for one call.
///
/// Built once per request; vision adapters read `bytes`, text adapters read
/// `text`.
#[derive(Clone)]
pub struct ProviderRequest {
    pub text: String,
    pub bytes: Arc<[u8]>,
    pub media_type: String,
    pub filename: String,
    pub kind: MediaKind,
    pub source: Language,
    pub target: Language,
}

impl ProviderRequest {
    pub fn from_payload(
        payload: &FilePayload,
        text: String,
        source: Language,
        target: Language,
    ) -> Self {
        Self {
            text,
            bytes: Arc::from(payload.bytes.as_slice()),
            media_type: payload.media_type.clone(),
            filename: payload.filename.clone(),
            kind: payload.kind,
            source,
            target,
        }
    }

    /// A request carrying only text, as for `/api/translate-text`.
    pub fn text_only(text: impl Into<String>, source: Language, target: Language) -> Self {
        Self {
            text: text.into(),
            bytes: Arc::from(Vec::<u8>::new()),
            media_type: crate::pipeline::input::MIME_TEXT.to_string(),
            filename: "text.txt".to_string(),
            kind: MediaKind::Text,
            source,
            target,
        }
    }

    /// Character count of the extracted source text.
    pub fn source_len(&self) -> usize {
        self.text.chars().count()
    }
}

impl fmt::Debug for ProviderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRequest")
            .field("filename", &self.filename)
            .field("kind", &self.kind)
            .field("text_chars", &self.source_len())
            .field("bytes", &self.bytes.len())
            .field("source", &self.source)
            .field("target", &self.target)
            .finish()
    }
}

/// One external translation service.
///
/// `translate` returns `Ok(None)` when the adapter declines (media type it
/// cannot read, missing credentials, empty text) or when the service answers
/// without any text. Failures are always a [`ProviderError`].
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Which acceptance policy governs this adapter's output.
    fn tier(&self) -> ProviderTier;

    fn supports(&self, kind: MediaKind) -> bool;

    fn is_configured(&self) -> bool;

    async fn translate(&self, request: &ProviderRequest) -> Result<Option<String>, ProviderError>;
}

/// Text-tier adapters read extracted text, which every non-image kind has.
pub(crate) fn has_extracted_text(kind: MediaKind) -> bool {
    !matches!(kind, MediaKind::Image)
}

/// Build every adapter from credentials, in no particular order.
///
/// Adapters whose credential is absent are still returned; they report
/// `is_configured() == false` and the orchestrator skips them.
pub fn default_providers(
    credentials: &Credentials,
    config: &TranslatorConfig,
) -> Vec<Arc<dyn TranslationProvider>> {
    vec![
        Arc::new(vision::VisionProvider::gemini(credentials, config)) as Arc<dyn TranslationProvider>,
        Arc::new(vision::VisionProvider::openai(credentials, config)),
        Arc::new(anthropic::ClaudeDocumentProvider::new(credentials, config)),
        Arc::new(text::ChatTextProvider::openai(credentials, config)),
        Arc::new(text::ChatTextProvider::openrouter(credentials, config)),
        Arc::new(free::FreeFallbackProvider::new(credentials, config)),
    ]
}

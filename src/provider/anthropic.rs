//! `claude-document`: Anthropic Messages API with the whole file attached.
//!
//! ## Why not edgequake-llm here?
//!
//! The chat abstraction only carries images. Claude can read a PDF natively
//! through a `document` content block, which preserves tables and reading
//! order far better than text pulled out by a PDF parser, so this adapter
//! speaks the Messages API directly over `reqwest`.

use crate::acceptance::ProviderTier;
use crate::config::{Credentials, TranslatorConfig};
use crate::error::ProviderError;
use crate::pipeline::encode::to_base64;
use crate::pipeline::input::{MediaKind, MIME_PDF};
use crate::pipeline::normalize::normalize_translation;
use crate::prompts::document_prompt;
use crate::provider::{ProviderId, ProviderRequest, TranslationProvider};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

pub struct ClaudeDocumentProvider {
    api_key: Option<String>,
    model: String,
    max_tokens: usize,
    temperature: f32,
    timeout_secs: u64,
    base_url: String,
    client: reqwest::Client,
}

impl ClaudeDocumentProvider {
    pub fn new(credentials: &Credentials, config: &TranslatorConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            api_key: credentials.anthropic.clone(),
            model: config.models.anthropic_document.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout_secs: config.api_timeout_secs,
            base_url: DEFAULT_BASE_URL.to_string(),
            client,
        }
    }

    /// Point at a different host (a proxy, or a stub server in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn build_body<'a>(&'a self, request: &ProviderRequest, prompt: &'a str) -> MessagesRequest<'a> {
        let source = Base64Source {
            kind: "base64",
            media_type: request.media_type.clone(),
            data: to_base64(&request.bytes),
        };
        let attachment = if request.kind == MediaKind::Pdf {
            ContentBlock::Document {
                source: Base64Source {
                    media_type: MIME_PDF.to_string(),
                    ..source
                },
            }
        } else {
            ContentBlock::Image { source }
        };

        MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: vec![UserMessage {
                role: "user",
                content: vec![attachment, ContentBlock::Text { text: prompt }],
            }],
        }
    }
}

#[async_trait]
impl TranslationProvider for ClaudeDocumentProvider {
    fn id(&self) -> ProviderId {
        ProviderId::ClaudeDocument
    }

    fn tier(&self) -> ProviderTier {
        ProviderTier::Document
    }

    fn supports(&self, kind: MediaKind) -> bool {
        matches!(kind, MediaKind::Image | MediaKind::Pdf)
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn translate(&self, request: &ProviderRequest) -> Result<Option<String>, ProviderError> {
        let Some(api_key) = &self.api_key else {
            return Ok(None);
        };
        if !self.supports(request.kind) || request.bytes.is_empty() {
            debug!("claude-document: declining {} input", request.kind);
            return Ok(None);
        }

        let id = self.id();
        let prompt = document_prompt(request.source, request.target);
        let body = self.build_body(request, &prompt);
        let url = format!("{}/v1/messages", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(id.as_str(), &e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!("claude-document: HTTP {}", status);
            return Err(ProviderError::from_status(id.as_str(), status.as_u16(), detail));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::from_reqwest(id.as_str(), &e, self.timeout_secs))?;

        let text = parsed
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("\n");
        let text = normalize_translation(&text);
        debug!(
            "claude-document: {} chars, stop_reason {:?}",
            text.chars().count(),
            parsed.stop_reason
        );
        Ok((!text.is_empty()).then_some(text))
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    temperature: f32,
    messages: Vec<UserMessage<'a>>,
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentBlock<'a> {
    Document { source: Base64Source },
    Image { source: Base64Source },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct Base64Source {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: String,
    data: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResponseBlock {
    #[serde(default)]
    text: Option<String>,
}

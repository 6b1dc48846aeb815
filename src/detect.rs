//! Source-language verification.
//!
//! Off by default ([`crate::config::TranslatorConfig::verify_language`]).
//! When enabled, the first `detection_sample_chars` characters of the
//! extracted text go to a [`LanguageDetector`]. A detector that cannot
//! answer lets the request through; only a confident disagreement stops it.

use crate::config::{Credentials, TranslatorConfig};
use crate::error::TranslateError;
use crate::language::Language;
use crate::prompts::detection_prompt;
use crate::provider::llm::LlmClient;
use crate::provider::ProviderId;
use async_trait::async_trait;
use edgequake_llm::ChatMessage;
use tracing::{debug, info, warn};

/// What a detector concluded about a sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// One of the supported languages.
    Supported(Language),
    /// The detector named a language outside the supported set.
    Unsupported(String),
}

/// Names the language of a text sample.
#[async_trait]
pub trait LanguageDetector: Send + Sync {
    /// `None` when the detector is unconfigured or its backing call failed.
    async fn detect(&self, sample: &str) -> Option<Detection>;
}

/// Compare a detection with the declared source language.
///
/// `None` (no detection) passes. An unsupported language or a different
/// supported language is an input error.
pub fn verify_source_language(
    declared: Language,
    detected: Option<&Detection>,
) -> Result<(), TranslateError> {
    match detected {
        None => Ok(()),
        Some(Detection::Supported(lang)) if *lang == declared => Ok(()),
        Some(Detection::Supported(lang)) => Err(TranslateError::LanguageMismatch {
            declared: declared.to_string(),
            detected: lang.to_string(),
        }),
        Some(Detection::Unsupported(name)) => Err(TranslateError::UnsupportedLanguage(name.clone())),
    }
}

/// First `max_chars` characters of `text`, on a char boundary.
pub fn sample(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Interpret a model's one-word answer.
pub fn parse_detection(answer: &str) -> Option<Detection> {
    let word = answer
        .split_whitespace()
        .next()?
        .trim_matches(|c: char| !c.is_alphanumeric());
    if word.is_empty() || word.eq_ignore_ascii_case("unknown") {
        return None;
    }
    Some(match Language::from_name(answer).or_else(|| Language::from_name(word)) {
        Some(lang) => Detection::Supported(lang),
        None => Detection::Unsupported(word.to_lowercase()),
    })
}

/// Detector backed by a chat model through edgequake-llm (Gemini).
pub struct LlmLanguageDetector {
    client: Option<LlmClient>,
}

impl LlmLanguageDetector {
    pub fn new(credentials: &Credentials, config: &TranslatorConfig) -> Self {
        Self {
            client: LlmClient::connect(
                ProviderId::GeminiVision,
                "gemini",
                &config.models.detection,
                credentials.gemini.as_deref(),
                config,
            ),
        }
    }

    pub fn with_client(client: LlmClient) -> Self {
        Self {
            client: Some(client),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }
}

#[async_trait]
impl LanguageDetector for LlmLanguageDetector {
    async fn detect(&self, sample: &str) -> Option<Detection> {
        let client = self.client.as_ref()?;
        if sample.trim().is_empty() {
            return None;
        }
        let messages = vec![ChatMessage::user(&detection_prompt(sample))];
        match client.chat(&messages).await {
            Ok(Some(answer)) => {
                let detection = parse_detection(&answer);
                info!("Detected language: {:?}", detection);
                detection
            }
            Ok(None) => {
                debug!("Language detector returned nothing");
                None
            }
            Err(e) => {
                warn!("Language detection failed: {}", e);
                None
            }
        }
    }
}

//! Error types for the translatrix library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`TranslateError`]: **Fatal**: the request cannot produce a
//!   translation (bad upload, unsupported language, every provider failed,
//!   request timed out). Returned as `Err(TranslateError)` from the
//!   top-level `translate*` functions and mapped to an HTTP status by the
//!   server.
//!
//! * [`ProviderError`]: **Non-fatal**: a single provider call failed
//!   (bad key, quota, timeout, garbage response). It never leaves the
//!   orchestrator; the failure is logged and the next provider in priority
//!   order is tried.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the translatrix library.
#[derive(Debug, Error)]
pub enum TranslateError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The request carried no file (or an empty one).
    #[error("No file uploaded")]
    MissingFile,

    /// The upload exceeds the configured size cap.
    #[error("File '{filename}' is {size} bytes; the limit is {limit} bytes")]
    FileTooLarge {
        filename: String,
        size: usize,
        limit: usize,
    },

    /// The media type is not one of image/*, PDF, DOCX, text or JSON.
    #[error("Unsupported file type '{media_type}' for '{filename}'")]
    UnsupportedMediaType {
        filename: String,
        media_type: String,
    },

    /// The language name is not in the supported set.
    #[error("Unsupported language '{0}'\nSupported: spanish, french, german, mandarin, hindi, english")]
    UnsupportedLanguage(String),

    /// Only English is accepted as the translation target.
    #[error("Unsupported target language '{0}': documents are translated to English only")]
    UnsupportedTargetLanguage(String),

    /// The detected language disagrees with the one the caller declared.
    #[error("Document appears to be {detected}, but {declared} was selected as the source language")]
    LanguageMismatch { declared: String, detected: String },

    /// No text was supplied to a text-only translation.
    #[error("No text provided")]
    EmptyText,

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The file could not be read or parsed.
    #[error("Text extraction failed for '{path}': {detail}")]
    ExtractionFailed { path: PathBuf, detail: String },

    // ── Orchestration errors ──────────────────────────────────────────────
    /// Every provider declined, failed, or returned unusable output.
    #[error("All translation methods failed (tried: {})", attempted.join(", "))]
    AllProvidersFailed { attempted: Vec<String> },

    /// The whole request exceeded its wall-clock budget.
    #[error("Translation timed out after {secs}s")]
    Timeout { secs: u64 },

    // ── Report errors ─────────────────────────────────────────────────────
    /// PDF report rendering failed.
    #[error("PDF generation failed: {0}")]
    ReportFailed(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TranslateError {
    /// True for errors caused by the caller's input rather than by a
    /// provider or by the server itself.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            TranslateError::MissingFile
                | TranslateError::FileTooLarge { .. }
                | TranslateError::UnsupportedMediaType { .. }
                | TranslateError::UnsupportedLanguage(_)
                | TranslateError::UnsupportedTargetLanguage(_)
                | TranslateError::LanguageMismatch { .. }
                | TranslateError::EmptyText
        )
    }

    /// Report extraction failures against the uploaded file name instead
    /// of the staging path on this host.
    pub fn for_upload(self, filename: &str) -> Self {
        match self {
            TranslateError::ExtractionFailed { detail, .. } => TranslateError::ExtractionFailed {
                path: PathBuf::from(filename),
                detail,
            },
            other => other,
        }
    }
}

/// A non-fatal error from a single provider call.
///
/// Adapters convert every SDK or HTTP failure into one of these variants so
/// the orchestrator can treat them uniformly.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Missing, invalid or revoked credentials (HTTP 401/403).
    #[error("{provider}: authentication failed: {detail}")]
    Auth { provider: String, detail: String },

    /// Quota exhausted or rate limited (HTTP 429).
    #[error("{provider}: quota or rate limit exceeded")]
    RateLimited { provider: String },

    /// The call exceeded the per-call timeout.
    #[error("{provider}: timed out after {secs}s")]
    Timeout { provider: String, secs: u64 },

    /// The response could not be decoded or had no text in it.
    #[error("{provider}: malformed response: {detail}")]
    Malformed { provider: String, detail: String },

    /// Connection-level failure.
    #[error("{provider}: transport error: {detail}")]
    Transport { provider: String, detail: String },

    /// Any other non-success answer from the provider.
    #[error("{provider}: API error {status}: {detail}")]
    Api {
        provider: String,
        status: u16,
        detail: String,
    },
}

impl ProviderError {
    /// Classify a non-success HTTP status into the matching variant.
    pub fn from_status(provider: &str, status: u16, body: impl Into<String>) -> Self {
        let detail = body.into();
        match status {
            401 | 403 => ProviderError::Auth {
                provider: provider.to_string(),
                detail,
            },
            429 => ProviderError::RateLimited {
                provider: provider.to_string(),
            },
            _ => ProviderError::Api {
                provider: provider.to_string(),
                status,
                detail,
            },
        }
    }

    /// Classify a `reqwest` failure.
    pub fn from_reqwest(provider: &str, err: &reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout {
                provider: provider.to_string(),
                secs: timeout_secs,
            }
        } else if err.is_decode() {
            ProviderError::Malformed {
                provider: provider.to_string(),
                detail: err.to_string(),
            }
        } else {
            ProviderError::Transport {
                provider: provider.to_string(),
                detail: err.to_string(),
            }
        }
    }

    /// Classify an error message from an SDK that only exposes `Display`.
    pub fn from_message(provider: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains("api key") || lower.contains("unauthorized") || lower.contains("401") {
            ProviderError::Auth {
                provider: provider.to_string(),
                detail: message,
            }
        } else if lower.contains("quota") || lower.contains("rate limit") || lower.contains("429") {
            ProviderError::RateLimited {
                provider: provider.to_string(),
            }
        } else if lower.contains("timeout") || lower.contains("timed out") {
            ProviderError::Timeout {
                provider: provider.to_string(),
                secs: 0,
            }
        } else {
            ProviderError::Transport {
                provider: provider.to_string(),
                detail: message,
            }
        }
    }
}

//! Configuration types for document translation.
//!
//! All orchestration behaviour is controlled through [`TranslatorConfig`],
//! built via its [`TranslatorConfigBuilder`]. Provider credentials live in a
//! separate [`Credentials`] value that is snapshotted once (normally from the
//! environment) and handed to the provider constructors, so nothing below the
//! entry point reads environment variables.

use crate::acceptance::{AcceptancePolicy, ProviderTier};
use crate::error::TranslateError;
use crate::progress::OrchestrationObserver;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Configuration for a translation run.
///
/// # Example
/// ```rust
/// use translatrix::TranslatorConfig;
///
/// let config = TranslatorConfig::builder()
///     .max_attempts(2)
///     .retry_backoff_ms(1000)
///     .request_timeout_secs(120)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct TranslatorConfig {
    /// Attempts per provider, including the first. Default: 2.
    ///
    /// The chain already has several providers behind each one, so a
    /// single retry is enough to ride out a transient 5xx without making a
    /// dead provider cost minutes.
    pub max_attempts: u32,

    /// Base delay before the first retry, doubled on each further retry.
    /// Default: 2000 ms.
    pub retry_backoff_ms: u64,

    /// Per-call timeout for a single provider request. Default: 60 s.
    pub api_timeout_secs: u64,

    /// Wall-clock budget for the whole request. Default: 300 s.
    pub request_timeout_secs: u64,

    /// Acceptance policy for vision models reading images. Default: ≥ 100 chars.
    pub vision_policy: AcceptancePolicy,

    /// Acceptance policy for native document readers. Default: ≥ 30 % of source.
    pub document_policy: AcceptancePolicy,

    /// Acceptance policy for chat models on extracted text. Default: ≥ 30 % of source.
    pub text_policy: AcceptancePolicy,

    /// Acceptance policy for the free fallback chain. Default: ≥ 10 chars.
    pub free_policy: AcceptancePolicy,

    /// Free fallback chain tuning.
    pub free_chain: FreeChainConfig,

    /// Run the language detector and reject mismatching uploads. Default: false.
    pub verify_language: bool,

    /// Number of leading characters sent to the language detector. Default: 500.
    pub detection_sample_chars: usize,

    /// Model identifiers per provider.
    pub models: ModelConfig,

    /// Sampling temperature for LLM providers. Default: 0.1.
    pub temperature: f32,

    /// Maximum output tokens for LLM providers. Default: 8192.
    pub max_tokens: usize,

    /// Upload size cap in bytes. Default: 50 MiB.
    pub max_upload_bytes: usize,

    /// Optional orchestration event sink.
    pub observer: Option<Arc<dyn OrchestrationObserver>>,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            retry_backoff_ms: 2000,
            api_timeout_secs: 60,
            request_timeout_secs: 300,
            vision_policy: AcceptancePolicy::min_chars(100),
            document_policy: AcceptancePolicy::with_ratio(1, 0.3),
            text_policy: AcceptancePolicy::with_ratio(1, 0.3),
            free_policy: AcceptancePolicy::min_chars(10),
            free_chain: FreeChainConfig::default(),
            verify_language: false,
            detection_sample_chars: 500,
            models: ModelConfig::default(),
            temperature: 0.1,
            max_tokens: 8192,
            max_upload_bytes: 50 * 1024 * 1024,
            observer: None,
        }
    }
}

impl fmt::Debug for TranslatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslatorConfig")
            .field("max_attempts", &self.max_attempts)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("vision_policy", &self.vision_policy)
            .field("document_policy", &self.document_policy)
            .field("text_policy", &self.text_policy)
            .field("free_policy", &self.free_policy)
            .field("free_chain", &self.free_chain)
            .field("verify_language", &self.verify_language)
            .field("models", &self.models)
            .field("observer", &self.observer.as_ref().map(|_| "<dyn OrchestrationObserver>"))
            .finish()
    }
}

impl TranslatorConfig {
    /// Create a new builder for `TranslatorConfig`.
    pub fn builder() -> TranslatorConfigBuilder {
        TranslatorConfigBuilder {
            config: Self::default(),
        }
    }

    /// The acceptance policy for a provider tier.
    pub fn policy_for(&self, tier: ProviderTier) -> AcceptancePolicy {
        match tier {
            ProviderTier::Vision => self.vision_policy,
            ProviderTier::Document => self.document_policy,
            ProviderTier::Text => self.text_policy,
            ProviderTier::Free => self.free_policy,
        }
    }
}

/// Builder for [`TranslatorConfig`].
#[derive(Debug)]
pub struct TranslatorConfigBuilder {
    config: TranslatorConfig,
}

impl TranslatorConfigBuilder {
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.max_attempts = n.max(1);
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn policy(mut self, tier: ProviderTier, policy: AcceptancePolicy) -> Self {
        match tier {
            ProviderTier::Vision => self.config.vision_policy = policy,
            ProviderTier::Document => self.config.document_policy = policy,
            ProviderTier::Text => self.config.text_policy = policy,
            ProviderTier::Free => self.config.free_policy = policy,
        }
        self
    }

    pub fn free_chain(mut self, free_chain: FreeChainConfig) -> Self {
        self.config.free_chain = free_chain;
        self
    }

    pub fn verify_language(mut self, v: bool) -> Self {
        self.config.verify_language = v;
        self
    }

    pub fn detection_sample_chars(mut self, n: usize) -> Self {
        self.config.detection_sample_chars = n.max(1);
        self
    }

    pub fn models(mut self, models: ModelConfig) -> Self {
        self.config.models = models;
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

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn OrchestrationObserver>) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<TranslatorConfig, TranslateError> {
        let c = &self.config;
        if c.free_chain.max_chunk_chars == 0 {
            return Err(TranslateError::InvalidConfig(
                "Chunk size must be ≥ 1".into(),
            ));
        }
        if c.free_chain.chunk_concurrency == 0 {
            return Err(TranslateError::InvalidConfig(
                "Chunk concurrency must be ≥ 1".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(TranslateError::InvalidConfig(
                "Upload limit must be ≥ 1 byte".into(),
            ));
        }
        for (name, p) in [
            ("vision", c.vision_policy),
            ("document", c.document_policy),
            ("text", c.text_policy),
            ("free", c.free_policy),
        ] {
            if let Some(r) = p.min_source_ratio {
                if !(0.0..=1.0).contains(&r) {
                    return Err(TranslateError::InvalidConfig(format!(
                        "{name} acceptance ratio must be 0.0–1.0, got {r}"
                    )));
                }
            }
        }
        Ok(self.config)
    }
}

/// Tuning for the keyless fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FreeChainConfig {
    /// Texts shorter than this are sent whole, racing all services. Default: 3000.
    pub single_call_threshold: usize,
    /// Upper bound for a sentence-bounded chunk. Default: 1500.
    pub max_chunk_chars: usize,
    /// Chunks translated at once. Default: 8.
    pub chunk_concurrency: usize,
    /// Per-request timeout for a free service. Default: 30 s.
    pub service_timeout_secs: u64,
}

impl Default for FreeChainConfig {
    fn default() -> Self {
        Self {
            single_call_threshold: 3000,
            max_chunk_chars: 1500,
            chunk_concurrency: 8,
            service_timeout_secs: 30,
        }
    }
}

/// Model identifiers for each LLM-backed provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelConfig {
    pub gemini_vision: String,
    pub openai_vision: String,
    pub anthropic_document: String,
    pub openai_text: String,
    pub openrouter_text: String,
    pub detection: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            gemini_vision: "gemini-1.5-flash".into(),
            openai_vision: "gpt-4o-mini".into(),
            anthropic_document: "claude-sonnet-4-20250514".into(),
            openai_text: "gpt-4o-mini".into(),
            openrouter_text: "google/gemini-1.5-flash-exp:free".into(),
            detection: "gemini-1.5-flash".into(),
        }
    }
}

// ── Credentials ──────────────────────────────────────────────────────────

/// Environment variable names for each credential.
pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const OPENROUTER_API_KEY: &str = "OPENROUTER_API_KEY";
pub const LIBRETRANSLATE_API_KEY: &str = "LIBRETRANSLATE_API_KEY";

/// Provider API keys, captured once at startup.
///
/// Presence of a key is what makes an adapter eligible; empty strings count
/// as absent.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub gemini: Option<String>,
    pub anthropic: Option<String>,
    pub openai: Option<String>,
    pub openrouter: Option<String>,
    pub libretranslate: Option<String>,
}

impl Credentials {
    /// Snapshot the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any name → value lookup (tests pass a closure over a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            gemini: get(GEMINI_API_KEY),
            anthropic: get(ANTHROPIC_API_KEY),
            openai: get(OPENAI_API_KEY),
            openrouter: get(OPENROUTER_API_KEY),
            libretranslate: get(LIBRETRANSLATE_API_KEY),
        }
    }

    /// Which credentialed services are configured.
    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            gemini: self.gemini.is_some(),
            claude: self.anthropic.is_some(),
            openai: self.openai.is_some(),
            openrouter: self.openrouter.is_some(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |k: &Option<String>| k.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("gemini", &mask(&self.gemini))
            .field("anthropic", &mask(&self.anthropic))
            .field("openai", &mask(&self.openai))
            .field("openrouter", &mask(&self.openrouter))
            .field("libretranslate", &mask(&self.libretranslate))
            .finish()
    }
}

/// Credential presence, as reported by the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub gemini: bool,
    pub claude: bool,
    pub openai: bool,
    pub openrouter: bool,
}

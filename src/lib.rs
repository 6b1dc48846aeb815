//! # translatrix
//!
//! Translate uploaded documents (images, PDF, DOCX, plain text, JSON) from
//! Spanish, French, German, Mandarin or Hindi into English through an ordered
//! chain of translation providers.
//!
//! ## Why a provider chain?
//!
//! No single service handles every input well or is always available.
//! Vision models read scanned images, Claude reads PDFs natively, chat models
//! translate extracted text, and free public translators keep the service
//! useful with no API keys at all. Each media kind walks its own priority
//! list; the first output that passes the acceptance gate wins.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload
//!  │
//!  ├─ 1. Input     size cap, media kind, temp file staging
//!  ├─ 2. Extract   pdf-extract / DOCX XML / UTF-8 text
//!  ├─ 3. Detect    optional source-language check
//!  ├─ 4. Route     vision → document → text LLM → free services
//!  │               (retry with exponential backoff per provider)
//!  ├─ 5. Accept    per-tier minimum length and source ratio
//!  └─ 6. Assemble  TranslationResult + counts and display metrics
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use translatrix::{Credentials, Language, Translator, TranslatorConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Keys are read from GEMINI_API_KEY / ANTHROPIC_API_KEY / OPENAI_API_KEY / OPENROUTER_API_KEY
//!     let credentials = Credentials::from_env();
//!     let translator = Translator::new(TranslatorConfig::default(), &credentials);
//!     let result = translator
//!         .translate_text("Buenos días a todos.", Language::Spanish, Language::English)
//!         .await?;
//!     println!("{} (via {})", result.translated_text, result.metadata.provider_used);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `translatrix` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when embedding only the library:
//! ```toml
//! translatrix = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod acceptance;
pub mod config;
pub mod detect;
pub mod error;
pub mod language;
pub mod orchestrator;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod provider;
pub mod report;
pub mod retry;
pub mod server;
pub mod translate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use acceptance::{AcceptancePolicy, ProviderTier, Verdict};
pub use config::{Credentials, FreeChainConfig, ModelConfig, TranslatorConfig, TranslatorConfigBuilder};
pub use detect::{Detection, LanguageDetector};
pub use error::{ProviderError, TranslateError};
pub use language::Language;
pub use orchestrator::{AttemptOutcome, OrchestrationOutcome, Orchestrator, Route};
pub use output::TranslationResult;
pub use pipeline::input::{FilePayload, MediaKind};
pub use progress::{NoopObserver, OrchestrationObserver};
pub use provider::{ProviderId, ProviderRequest, TranslationProvider};
pub use report::{render_pdf, ReportRequest};
pub use retry::RetryPolicy;
pub use translate::Translator;

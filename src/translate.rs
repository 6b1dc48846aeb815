//! Top-level translation entry points.
//!
//! A [`Translator`] owns the orchestrator, the optional language detector,
//! and the upload directory. It is cheap to share behind an `Arc` and is what
//! both the HTTP server and the CLI drive.
//!
//! ```text
//! FilePayload
//!  │
//!  ├─ 1. Stage     write bytes to a temp file (removed on drop)
//!  ├─ 2. Extract   PDF / DOCX / text → plain text (images: none)
//!  ├─ 3. Verify    optional source-language detection
//!  ├─ 4. Route     ordered providers, retry, acceptance gate
//!  └─ 5. Assemble  TranslationResult with counts and display metrics
//! ```
//!
//! The whole sequence runs under `request_timeout_secs`.

use crate::config::{Credentials, TranslatorConfig};
use crate::detect::{self, LanguageDetector, LlmLanguageDetector};
use crate::error::TranslateError;
use crate::language::Language;
use crate::orchestrator::{OrchestrationOutcome, Orchestrator, Route};
use crate::output::{self, Assembly, FileSummary, TranslationResult};
use crate::pipeline::encode::data_url;
use crate::pipeline::extract::extract_text;
use crate::pipeline::input::{FilePayload, MediaKind, StagedUpload, MIME_TEXT};
use crate::provider::{default_providers, ProviderRequest, TranslationProvider};
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub struct Translator {
    config: TranslatorConfig,
    orchestrator: Orchestrator,
    detector: Option<Arc<dyn LanguageDetector>>,
    upload_dir: Option<PathBuf>,
}

impl fmt::Debug for Translator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Translator")
            .field("config", &self.config)
            .field("configured", &self.orchestrator.configured())
            .field("detector", &self.detector.is_some())
            .field("upload_dir", &self.upload_dir)
            .finish()
    }
}

impl Translator {
    /// Build every provider from `credentials`. The language detector is
    /// only attached when `config.verify_language` is set.
    pub fn new(config: TranslatorConfig, credentials: &Credentials) -> Self {
        let providers = default_providers(credentials, &config);
        let mut translator = Self::with_providers(providers, config);
        if translator.config.verify_language {
            let detector = LlmLanguageDetector::new(credentials, &translator.config);
            if detector.is_configured() {
                translator.detector = Some(Arc::new(detector));
            } else {
                info!("Language verification requested but no detector credentials are set");
            }
        }
        translator
    }

    /// Use an explicit provider set (tests, embedding).
    pub fn with_providers(
        providers: Vec<Arc<dyn TranslationProvider>>,
        config: TranslatorConfig,
    ) -> Self {
        Self {
            orchestrator: Orchestrator::new(providers, &config),
            config,
            detector: None,
            upload_dir: None,
        }
    }

    pub fn with_detector(mut self, detector: Arc<dyn LanguageDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Stage uploads in `dir` instead of the system temp dir.
    pub fn with_upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = Some(dir.into());
        self
    }

    pub fn with_route(mut self, route: Route) -> Self {
        self.orchestrator = self.orchestrator.with_route(route);
        self
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Translate an uploaded document.
    pub async fn translate_file(
        &self,
        payload: FilePayload,
        source: Language,
        target: Language,
    ) -> Result<TranslationResult, TranslateError> {
        self.within_deadline(self.translate_file_inner(payload, source, target))
            .await
    }

    /// Translate a raw string along the text route.
    pub async fn translate_text(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<TranslationResult, TranslateError> {
        if text.trim().is_empty() {
            return Err(TranslateError::EmptyText);
        }
        self.within_deadline(self.translate_text_inner(text, source, target))
            .await
    }

    async fn translate_file_inner(
        &self,
        payload: FilePayload,
        source: Language,
        target: Language,
    ) -> Result<TranslationResult, TranslateError> {
        let start = Instant::now();
        info!(
            "Translating '{}' ({}, {:.2} KB) from {} to {}",
            payload.filename,
            payload.kind,
            payload.size_kib(),
            source,
            target
        );

        // ── Step 1: Stage ────────────────────────────────────────────────
        let staged = StagedUpload::stage(&payload, self.upload_dir.as_deref())?;

        // ── Step 2: Extract ──────────────────────────────────────────────
        let text = match extract_text(staged.path(), payload.kind).await {
            Ok(text) => text,
            // Document-tier providers read the raw PDF bytes themselves.
            Err(e) if payload.kind == MediaKind::Pdf => {
                warn!(
                    "Could not extract text from '{}', continuing with document providers only: {}",
                    payload.filename, e
                );
                String::new()
            }
            Err(e) => return Err(e.for_upload(&payload.filename)),
        };
        debug!("Extracted {} chars from '{}'", text.chars().count(), payload.filename);

        // ── Step 3: Verify source language ───────────────────────────────
        self.verify_language(&text, source).await?;

        // ── Step 4: Route ────────────────────────────────────────────────
        let request = ProviderRequest::from_payload(&payload, text, source, target);
        let outcome = self.orchestrator.run(&request).await?;
        drop(staged);

        // ── Step 5: Assemble ─────────────────────────────────────────────
        let file = FileSummary {
            preview: Some(data_url(&payload.media_type, &payload.bytes)),
            name: payload.filename,
            media_type: payload.media_type,
            size_bytes: payload.bytes.len(),
        };
        Ok(self.finish(&request.text, outcome, file, source, target, start))
    }

    async fn translate_text_inner(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<TranslationResult, TranslateError> {
        let start = Instant::now();
        info!(
            "Translating {} chars of text from {} to {}",
            text.chars().count(),
            source,
            target
        );

        self.verify_language(text, source).await?;

        let request = ProviderRequest::text_only(text, source, target);
        let outcome = self.orchestrator.run(&request).await?;

        let file = FileSummary {
            name: request.filename.clone(),
            media_type: MIME_TEXT.to_string(),
            size_bytes: text.len(),
            preview: None,
        };
        Ok(self.finish(text, outcome, file, source, target, start))
    }

    async fn verify_language(&self, text: &str, declared: Language) -> Result<(), TranslateError> {
        let Some(detector) = &self.detector else {
            return Ok(());
        };
        let sample = detect::sample(text, self.config.detection_sample_chars);
        if sample.trim().is_empty() {
            debug!("No text to sample for language detection");
            return Ok(());
        }
        let detection = detector.detect(sample).await;
        detect::verify_source_language(declared, detection.as_ref())
    }

    fn finish(
        &self,
        original_text: &str,
        outcome: OrchestrationOutcome,
        file: FileSummary,
        source: Language,
        target: Language,
        start: Instant,
    ) -> TranslationResult {
        let elapsed = start.elapsed();
        info!(
            "Translated with {} in {:.2}s ({} chars)",
            outcome.provider_used,
            elapsed.as_secs_f64(),
            outcome.translated_text.chars().count()
        );
        let assembly = Assembly {
            original_text,
            translated_text: &outcome.translated_text,
            file,
            provider: outcome.provider_used,
            model: outcome.provider_used.model_label(&self.config),
            source,
            target,
            elapsed,
        };
        output::assemble(assembly, &mut rand::thread_rng())
    }

    async fn within_deadline<T>(
        &self,
        work: impl Future<Output = Result<T, TranslateError>>,
    ) -> Result<T, TranslateError> {
        let secs = self.config.request_timeout_secs;
        tokio::time::timeout(Duration::from_secs(secs), work)
            .await
            .map_err(|_| TranslateError::Timeout { secs })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acceptance::ProviderTier;
    use crate::error::ProviderError;
    use crate::pipeline::input::MIME_DOCX;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use crate::provider::ProviderId;
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl TranslationProvider for Echo {
        fn id(&self) -> ProviderId {
            ProviderId::OpenAiText
        }
        fn tier(&self) -> ProviderTier {
            ProviderTier::Text
        }
        fn supports(&self, kind: MediaKind) -> bool {
            kind != MediaKind::Image
        }
        fn is_configured(&self) -> bool {
            true
        }
        async fn translate(&self, r: &ProviderRequest) -> Result<Option<String>, ProviderError> {
            Ok(Some(format!("EN: {}", r.text)))
        }
    }

    struct Stalls;

    #[async_trait]
    impl TranslationProvider for Stalls {
        fn id(&self) -> ProviderId {
            ProviderId::OpenAiText
        }
        fn tier(&self) -> ProviderTier {
            ProviderTier::Text
        }
        fn supports(&self, _: MediaKind) -> bool {
            true
        }
        fn is_configured(&self) -> bool {
            true
        }
        async fn translate(&self, _: &ProviderRequest) -> Result<Option<String>, ProviderError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(None)
        }
    }

    /// Reads the raw PDF bytes, like a native-document model.
    #[derive(Default)]
    struct ReadsPdfBytes {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TranslationProvider for ReadsPdfBytes {
        fn id(&self) -> ProviderId {
            ProviderId::ClaudeDocument
        }
        fn tier(&self) -> ProviderTier {
            ProviderTier::Document
        }
        fn supports(&self, kind: MediaKind) -> bool {
            matches!(kind, MediaKind::Pdf | MediaKind::Image)
        }
        fn is_configured(&self) -> bool {
            true
        }
        async fn translate(&self, r: &ProviderRequest) -> Result<Option<String>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(r.text.is_empty());
            Ok(Some(format!("Translated {} bytes of PDF", r.bytes.len())))
        }
    }

    #[tokio::test]
    async fn text_translation_uses_first_accepting_provider() {
        let t = Translator::with_providers(
            vec![Arc::new(Echo) as Arc<dyn TranslationProvider>],
            TranslatorConfig::default(),
        );
        let r = t
            .translate_text("Hola mundo", Language::Spanish, Language::English)
            .await
            .unwrap();
        assert_eq!(r.translated_text, "EN: Hola mundo");
        assert_eq!(r.original_text, "Hola mundo");
        assert_eq!(r.metadata.provider_used, ProviderId::OpenAiText);
        assert!(r.original_file_preview.is_none());
    }

    #[tokio::test]
    async fn empty_text_is_rejected_before_routing() {
        let t = Translator::with_providers(vec![], TranslatorConfig::default());
        let err = t
            .translate_text("   ", Language::French, Language::English)
            .await
            .unwrap_err();
        assert!(matches!(err, TranslateError::EmptyText));
    }

    #[tokio::test]
    async fn file_translation_extracts_and_previews() {
        let dir = tempfile::tempdir().unwrap();
        let t = Translator::with_providers(
            vec![Arc::new(Echo) as Arc<dyn TranslationProvider>],
            TranslatorConfig::default(),
        )
        .with_upload_dir(dir.path());
        let payload = FilePayload::new(
            "nota.txt",
            Some("text/plain"),
            b"Guten Morgen".to_vec(),
            1024,
        )
        .unwrap();
        let r = t
            .translate_file(payload, Language::German, Language::English)
            .await
            .unwrap();
        assert_eq!(r.translated_text, "EN: Guten Morgen");
        assert_eq!(r.file_name, "nota.txt");
        assert!(r
            .original_file_preview
            .as_deref()
            .unwrap()
            .starts_with("data:text/plain;base64,"));
        // staged file is gone after the request
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn unparseable_pdf_still_reaches_document_provider() {
        let reader = Arc::new(ReadsPdfBytes::default());
        let t = Translator::with_providers(
            vec![
                reader.clone() as Arc<dyn TranslationProvider>,
                Arc::new(Echo) as Arc<dyn TranslationProvider>,
            ],
            TranslatorConfig::default(),
        );
        let payload = FilePayload::new(
            "escaneo.pdf",
            Some("application/pdf"),
            b"%PDF-1.7\n garbage without xref".to_vec(),
            1024,
        )
        .unwrap();
        let r = t
            .translate_file(payload, Language::Spanish, Language::English)
            .await
            .unwrap();
        assert_eq!(reader.calls.load(Ordering::SeqCst), 1);
        assert_eq!(r.metadata.provider_used, ProviderId::ClaudeDocument);
        assert!(r.translated_text.starts_with("Translated "));
        assert_eq!(r.original_text, "");
    }

    #[tokio::test]
    async fn unparseable_pdf_without_document_provider_is_exhaustion() {
        let t = Translator::with_providers(
            vec![Arc::new(Echo) as Arc<dyn TranslationProvider>],
            TranslatorConfig::default(),
        );
        let payload = FilePayload::new(
            "escaneo.pdf",
            Some("application/pdf"),
            b"%PDF-1.7\n garbage without xref".to_vec(),
            1024,
        )
        .unwrap();
        let err = t
            .translate_file(payload, Language::Spanish, Language::English)
            .await
            .unwrap_err();
        assert!(matches!(err, TranslateError::AllProvidersFailed { .. }));
    }

    #[tokio::test]
    async fn extraction_error_names_the_upload_not_the_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        let t = Translator::with_providers(
            vec![Arc::new(Echo) as Arc<dyn TranslationProvider>],
            TranslatorConfig::default(),
        )
        .with_upload_dir(dir.path());
        let payload = FilePayload::new(
            "informe.docx",
            Some(MIME_DOCX),
            b"PK not really".to_vec(),
            1024,
        )
        .unwrap();
        let err = t
            .translate_file(payload, Language::German, Language::English)
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("'informe.docx'"), "{message}");
        assert!(!message.contains(&*dir.path().to_string_lossy()), "{message}");
    }

    #[tokio::test(start_paused = true)]
    async fn request_deadline_surfaces_timeout() {
        let config = TranslatorConfig::builder()
            .request_timeout_secs(5)
            .build()
            .unwrap();
        let t =
            Translator::with_providers(vec![Arc::new(Stalls) as Arc<dyn TranslationProvider>], config);
        let err = t
            .translate_text("Hola", Language::Spanish, Language::English)
            .await
            .unwrap_err();
        assert!(matches!(err, TranslateError::Timeout { secs: 5 }));
    }
}

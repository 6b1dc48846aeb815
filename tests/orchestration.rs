//! Orchestration behaviour driven through fake providers.
//!
//! No network access: every adapter here is scripted, so these run in CI.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use translatrix::config::FreeChainConfig;
use translatrix::detect::{Detection, LanguageDetector};
use translatrix::provider::free::{FreeFallbackChain, FreeFallbackProvider, TextService};
use translatrix::{
    AttemptOutcome, FilePayload, Language, MediaKind, Orchestrator, ProviderError, ProviderId,
    ProviderRequest, ProviderTier, TranslateError, TranslationProvider, Translator,
    TranslatorConfig,
};

// ── Fakes ────────────────────────────────────────────────────────────────────

struct Scripted {
    id: ProviderId,
    tier: ProviderTier,
    reply: Option<String>,
    rate_limited: bool,
    calls: Arc<AtomicUsize>,
}

impl Scripted {
    fn new(
        id: ProviderId,
        tier: ProviderTier,
        reply: Option<&str>,
    ) -> (Arc<dyn TranslationProvider>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let p: Arc<dyn TranslationProvider> = Arc::new(Self {
            id,
            tier,
            reply: reply.map(str::to_string),
            rate_limited: false,
            calls: calls.clone(),
        });
        (p, calls)
    }

    /// Always answers HTTP 429.
    fn rate_limited(
        id: ProviderId,
        tier: ProviderTier,
    ) -> (Arc<dyn TranslationProvider>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let p: Arc<dyn TranslationProvider> = Arc::new(Self {
            id,
            tier,
            reply: None,
            rate_limited: true,
            calls: calls.clone(),
        });
        (p, calls)
    }
}

#[async_trait]
impl TranslationProvider for Scripted {
    fn id(&self) -> ProviderId {
        self.id
    }
    fn tier(&self) -> ProviderTier {
        self.tier
    }
    fn supports(&self, _kind: MediaKind) -> bool {
        true
    }
    fn is_configured(&self) -> bool {
        true
    }
    async fn translate(&self, _r: &ProviderRequest) -> Result<Option<String>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.rate_limited {
            return Err(ProviderError::RateLimited {
                provider: self.id.as_str().to_string(),
            });
        }
        Ok(self.reply.clone())
    }
}

/// Upper-cases its input after a delay chosen by the first word.
struct SlowUpper {
    delays: Vec<(&'static str, u64)>,
    calls: AtomicUsize,
    finished: Mutex<Vec<String>>,
}

#[async_trait]
impl TextService for SlowUpper {
    fn name(&self) -> &'static str {
        "slow-upper"
    }

    async fn translate(
        &self,
        text: &str,
        _source: Language,
        _target: Language,
    ) -> Result<Option<String>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self
            .delays
            .iter()
            .find(|(word, _)| text.starts_with(word))
            .map(|(_, ms)| *ms)
            .unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.finished.lock().unwrap().push(text.to_string());
        Ok(Some(text.to_uppercase()))
    }
}

struct FixedDetector(Option<Detection>);

#[async_trait]
impl LanguageDetector for FixedDetector {
    async fn detect(&self, _sample: &str) -> Option<Detection> {
        self.0.clone()
    }
}

fn single_attempt() -> TranslatorConfig {
    TranslatorConfig::builder()
        .max_attempts(1)
        .build()
        .unwrap()
}

fn image_request() -> ProviderRequest {
    ProviderRequest {
        text: String::new(),
        bytes: Arc::from(vec![0x89u8, b'P', b'N', b'G']),
        media_type: "image/png".into(),
        filename: "menu.png".into(),
        kind: MediaKind::Image,
        source: Language::Spanish,
        target: Language::English,
    }
}

// ── Priority order ───────────────────────────────────────────────────────────

#[tokio::test]
async fn second_provider_wins_and_third_is_never_called() {
    let (p1, c1) = Scripted::new(ProviderId::OpenAiText, ProviderTier::Text, None);
    let (p2, c2) = Scripted::new(
        ProviderId::OpenRouterText,
        ProviderTier::Text,
        Some("Good morning to everyone"),
    );
    let (p3, c3) = Scripted::new(ProviderId::FreeFallback, ProviderTier::Free, Some("unused output"));

    let orch = Orchestrator::new(vec![p1, p2, p3], &single_attempt());
    let req = ProviderRequest::text_only("Buenos días a todos", Language::Spanish, Language::English);
    let out = orch.run(&req).await.unwrap();

    assert_eq!(out.provider_used, ProviderId::OpenRouterText);
    assert_eq!(out.translated_text, "Good morning to everyone");
    assert_eq!(c1.load(Ordering::SeqCst), 1);
    assert_eq!(c2.load(Ordering::SeqCst), 1);
    assert_eq!(c3.load(Ordering::SeqCst), 0);
    assert_eq!(out.attempts.len(), 2);
    assert!(matches!(out.attempts[0].outcome, AttemptOutcome::Failed(_)));
    assert_eq!(out.attempts[1].outcome, AttemptOutcome::Accepted);
}

#[tokio::test]
async fn all_empty_results_exhaust_the_route() {
    let (p1, _) = Scripted::new(ProviderId::OpenAiText, ProviderTier::Text, None);
    let (p2, _) = Scripted::new(ProviderId::OpenRouterText, ProviderTier::Text, Some("   "));
    let (p3, _) = Scripted::new(ProviderId::FreeFallback, ProviderTier::Free, None);

    let orch = Orchestrator::new(vec![p1, p2, p3], &single_attempt());
    let req = ProviderRequest::text_only("Guten Tag", Language::German, Language::English);
    match orch.run(&req).await {
        Err(TranslateError::AllProvidersFailed { attempted }) => {
            assert_eq!(attempted.len(), 3);
            assert!(attempted[0].starts_with("openai-text"));
            assert!(attempted[2].starts_with("free-fallback"));
        }
        other => panic!("expected AllProvidersFailed, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn empty_result_is_retried_before_moving_on() {
    let (p1, c1) = Scripted::new(ProviderId::OpenAiText, ProviderTier::Text, None);
    let (p2, _) = Scripted::new(ProviderId::OpenRouterText, ProviderTier::Text, Some("Good day"));
    let config = TranslatorConfig::builder().max_attempts(3).build().unwrap();

    let orch = Orchestrator::new(vec![p1, p2], &config);
    let req = ProviderRequest::text_only("Guten Tag", Language::German, Language::English);
    let out = orch.run(&req).await.unwrap();
    assert_eq!(c1.load(Ordering::SeqCst), 3);
    assert_eq!(out.provider_used, ProviderId::OpenRouterText);
}

#[tokio::test(start_paused = true)]
async fn provider_errors_fall_through_after_retries() {
    let (p1, c1) = Scripted::rate_limited(ProviderId::OpenAiText, ProviderTier::Text);
    let (p2, c2) = Scripted::new(
        ProviderId::OpenRouterText,
        ProviderTier::Text,
        Some("Good afternoon, everyone"),
    );
    let config = TranslatorConfig::builder().max_attempts(3).build().unwrap();

    let orch = Orchestrator::new(vec![p1, p2], &config);
    let req = ProviderRequest::text_only("Buenas tardes a todos", Language::Spanish, Language::English);
    let out = orch.run(&req).await.unwrap();

    assert_eq!(out.provider_used, ProviderId::OpenRouterText);
    assert_eq!(out.translated_text, "Good afternoon, everyone");
    assert_eq!(c1.load(Ordering::SeqCst), 3);
    assert_eq!(c2.load(Ordering::SeqCst), 1);
    let first = out.attempts[0].outcome.to_string();
    assert!(first.starts_with("failed: "), "{first}");
    assert!(first.contains("rate limit"), "{first}");
}

// ── Acceptance gate ──────────────────────────────────────────────────────────

#[tokio::test]
async fn too_short_vision_result_falls_through() {
    let short = "x".repeat(50);
    let long = "y".repeat(120);
    let (gemini, _) = Scripted::new(ProviderId::GeminiVision, ProviderTier::Vision, Some(&short));
    let (openai, c_openai) =
        Scripted::new(ProviderId::OpenAiVision, ProviderTier::Vision, Some(&long));

    let orch = Orchestrator::new(vec![gemini, openai], &single_attempt());
    let out = orch.run(&image_request()).await.unwrap();

    assert_eq!(out.provider_used, ProviderId::OpenAiVision);
    assert_eq!(c_openai.load(Ordering::SeqCst), 1);
    assert!(matches!(out.attempts[0].outcome, AttemptOutcome::Rejected(_)));
}

#[tokio::test]
async fn image_first_vision_answer_wins_alone() {
    let text = "The menu offers grilled fish, rice with vegetables, fresh bread and a lemon tart. Drinks are served until eleven in the evening.";
    assert!(text.len() >= 120);
    let (gemini, c_gemini) = Scripted::new(ProviderId::GeminiVision, ProviderTier::Vision, Some(text));
    let (openai, c_openai) =
        Scripted::new(ProviderId::OpenAiVision, ProviderTier::Vision, Some(text));
    let (claude, c_claude) =
        Scripted::new(ProviderId::ClaudeDocument, ProviderTier::Document, Some(text));
    let (free, c_free) = Scripted::new(ProviderId::FreeFallback, ProviderTier::Free, Some(text));

    let orch = Orchestrator::new(vec![gemini, openai, claude, free], &single_attempt());
    let out = orch.run(&image_request()).await.unwrap();

    assert_eq!(out.provider_used, ProviderId::GeminiVision);
    assert_eq!(out.translated_text, text);
    assert_eq!(c_gemini.load(Ordering::SeqCst), 1);
    assert_eq!(c_openai.load(Ordering::SeqCst), 0);
    assert_eq!(c_claude.load(Ordering::SeqCst), 0);
    assert_eq!(c_free.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn text_tiers_decline_images_without_text() {
    let (free, c_free) = Scripted::new(ProviderId::FreeFallback, ProviderTier::Free, Some("anything"));
    let orch = Orchestrator::new(vec![free], &single_attempt());
    let err = orch.run(&image_request()).await.unwrap_err();
    assert!(matches!(err, TranslateError::AllProvidersFailed { .. }));
    assert_eq!(c_free.load(Ordering::SeqCst), 0);
}

// ── Free fallback chain ──────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn chunked_chain_keeps_input_order() {
    let service = Arc::new(SlowUpper {
        delays: vec![("Alpha", 30), ("Bravo", 50), ("Charlie", 10)],
        calls: AtomicUsize::new(0),
        finished: Mutex::new(Vec::new()),
    });
    let chain = FreeFallbackChain::new(
        vec![service.clone() as Arc<dyn TextService>],
        FreeChainConfig {
            single_call_threshold: 10,
            max_chunk_chars: 12,
            chunk_concurrency: 8,
            service_timeout_secs: 30,
        },
    );

    let out = chain
        .translate("Alpha one. Bravo two. Charlie three.", Language::French, Language::English)
        .await
        .unwrap();

    assert_eq!(out, "ALPHA ONE. BRAVO TWO. CHARLIE THREE.");
    assert_eq!(
        *service.finished.lock().unwrap(),
        vec!["Charlie three.", "Alpha one.", "Bravo two."]
    );
}

#[tokio::test]
async fn five_thousand_chars_make_three_chunks() {
    let sentence = format!("{}.", "a".repeat(98));
    let text = vec![sentence; 50].join(" ");
    assert!(text.chars().count() >= 4999);

    let service = Arc::new(SlowUpper {
        delays: vec![],
        calls: AtomicUsize::new(0),
        finished: Mutex::new(Vec::new()),
    });
    let chain = FreeFallbackChain::new(
        vec![service.clone() as Arc<dyn TextService>],
        FreeChainConfig {
            single_call_threshold: 3000,
            max_chunk_chars: 2000,
            chunk_concurrency: 8,
            service_timeout_secs: 30,
        },
    );
    // no primary providers: only the free chain is registered
    let translator = Translator::with_providers(
        vec![Arc::new(FreeFallbackProvider::with_chain(chain)) as Arc<dyn TranslationProvider>],
        single_attempt(),
    );

    let result = translator
        .translate_text(&text, Language::Hindi, Language::English)
        .await
        .unwrap();

    assert_eq!(service.calls.load(Ordering::SeqCst), 3);
    assert_eq!(result.translated_text, text.to_uppercase());
    assert_eq!(result.metadata.provider_used, ProviderId::FreeFallback);
}

// ── Translator ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn translates_a_text_file_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memo.txt");
    std::fs::write(&path, "Bonjour à tous. La réunion est à dix heures.").unwrap();

    let (p, _) = Scripted::new(
        ProviderId::OpenAiText,
        ProviderTier::Text,
        Some("Hello everyone. The meeting is at ten o'clock."),
    );
    let translator = Translator::with_providers(vec![p], single_attempt());
    let payload = FilePayload::from_path(&path, 1024 * 1024).await.unwrap();
    assert_eq!(payload.kind, MediaKind::Text);

    let result = translator
        .translate_file(payload, Language::French, Language::English)
        .await
        .unwrap();

    assert_eq!(result.file_name, "memo.txt");
    assert_eq!(result.original_text, "Bonjour à tous. La réunion est à dix heures.");
    assert_eq!(result.translated_text, "Hello everyone. The meeting is at ten o'clock.");
    assert_eq!(result.sentence_count, 2);
    assert_eq!(result.metadata.source_language, Language::French);
    assert!(result.segments.len() <= 20);
}

#[tokio::test]
async fn detected_language_mismatch_stops_before_providers() {
    let (p, calls) = Scripted::new(ProviderId::OpenAiText, ProviderTier::Text, Some("Hello there"));
    let translator = Translator::with_providers(vec![p], single_attempt()).with_detector(Arc::new(
        FixedDetector(Some(Detection::Supported(Language::German))),
    ));

    let err = translator
        .translate_text("Guten Morgen zusammen", Language::Spanish, Language::English)
        .await
        .unwrap_err();

    assert!(matches!(err, TranslateError::LanguageMismatch { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn undetermined_language_lets_request_through() {
    let (p, _) = Scripted::new(ProviderId::OpenAiText, ProviderTier::Text, Some("Hello there"));
    let translator = Translator::with_providers(vec![p], single_attempt())
        .with_detector(Arc::new(FixedDetector(None)));

    let result = translator
        .translate_text("Hola a todos", Language::Spanish, Language::English)
        .await
        .unwrap();
    assert_eq!(result.translated_text, "Hello there");
}

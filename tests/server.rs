//! HTTP handler tests through `axum-test`, with scripted providers.

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use serde_json::{json, Value};
use std::sync::Arc;
use translatrix::server::{router, AppState};
use translatrix::{
    Credentials, MediaKind, ProviderError, ProviderId, ProviderRequest, ProviderTier,
    TranslationProvider, Translator, TranslatorConfig,
};

/// Prefixes the source text so tests can see what was routed.
struct Prefixing;

#[async_trait]
impl TranslationProvider for Prefixing {
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
        Ok(Some(format!("[en] {}", r.text)))
    }
}

fn config(max_upload_bytes: usize) -> TranslatorConfig {
    TranslatorConfig::builder()
        .max_attempts(1)
        .max_upload_bytes(max_upload_bytes)
        .build()
        .unwrap()
}

fn server_with(providers: Vec<Arc<dyn TranslationProvider>>, max_upload_bytes: usize) -> TestServer {
    let credentials = Credentials::from_lookup(|name| {
        (name == translatrix::config::OPENAI_API_KEY).then(|| "sk-test".to_string())
    });
    let translator = Translator::with_providers(providers, config(max_upload_bytes));
    TestServer::new(router(AppState::new(translator, credentials))).unwrap()
}

fn server() -> TestServer {
    server_with(vec![Arc::new(Prefixing) as Arc<dyn TranslationProvider>], 1024 * 1024)
}

// ── Health ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_configured_credentials() {
    let response = server().get("/api/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["services"]["openai"], true);
    assert_eq!(body["services"]["gemini"], false);
    assert_eq!(body["services"]["claude"], false);
    assert!(body["timestamp"].as_str().is_some());
}

// ── Text translation ─────────────────────────────────────────────────────────

#[tokio::test]
async fn translate_text_returns_envelope() {
    let response = server()
        .post("/api/translate-text")
        .json(&json!({ "text": "Hola mundo", "sourceLang": "spanish", "targetLang": "english" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["translatedText"], "[en] Hola mundo");
    assert_eq!(body["data"]["metadata"]["providerUsed"], "openai-text");
    assert_eq!(body["data"]["metadata"]["languagePair"], "spanish → english");
}

#[tokio::test]
async fn translate_text_rejects_empty_text() {
    let response = server()
        .post("/api/translate-text")
        .json(&json!({ "text": "  ", "sourceLang": "spanish" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "No text provided");
}

#[tokio::test]
async fn translate_text_rejects_non_english_target() {
    let response = server()
        .post("/api/translate-text")
        .json(&json!({ "text": "Hola", "sourceLang": "spanish", "targetLang": "french" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn exhausted_providers_map_to_bad_gateway() {
    let response = server_with(vec![], 1024)
        .post("/api/translate-text")
        .json(&json!({ "text": "Hola", "sourceLang": "spanish" }))
        .await;
    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("All translation methods failed"));
    assert!(body["details"].as_str().unwrap().contains("API keys"));
}

// ── Upload ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_translates_text_file() {
    let form = MultipartForm::new()
        .add_text("sourceLang", "german")
        .add_text("targetLang", "english")
        .add_part(
            "file",
            Part::bytes(b"Guten Morgen.".to_vec())
                .file_name("gruss.txt")
                .mime_type("text/plain"),
        );
    let response = server().post("/api/translate").multipart(form).await;
    response.assert_status_ok();
    let body: Value = response.json();
    let data = &body["data"];
    assert_eq!(data["translatedText"], "[en] Guten Morgen.");
    assert_eq!(data["originalText"], "Guten Morgen.");
    assert_eq!(data["fileName"], "gruss.txt");
    assert_eq!(data["fileType"], "text/plain");
    assert!(data["originalFilePreview"]
        .as_str()
        .unwrap()
        .starts_with("data:text/plain;base64,"));
}

#[tokio::test]
async fn upload_without_file_is_bad_request() {
    let form = MultipartForm::new().add_text("sourceLang", "german");
    let response = server().post("/api/translate").multipart(form).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test]
async fn upload_of_unsupported_type_is_bad_request() {
    let form = MultipartForm::new().add_text("sourceLang", "german").add_part(
        "file",
        Part::bytes(vec![0x50, 0x4b, 0x03, 0x04])
            .file_name("archive.zip")
            .mime_type("application/zip"),
    );
    let response = server().post("/api/translate").multipart(form).await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_upload_is_payload_too_large() {
    let form = MultipartForm::new().add_text("sourceLang", "french").add_part(
        "file",
        Part::bytes(vec![b'a'; 64])
            .file_name("big.txt")
            .mime_type("text/plain"),
    );
    let response = server_with(vec![Arc::new(Prefixing) as Arc<dyn TranslationProvider>], 16)
        .post("/api/translate")
        .multipart(form)
        .await;
    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn upload_with_unknown_source_language_is_bad_request() {
    let form = MultipartForm::new().add_text("sourceLang", "klingon").add_part(
        "file",
        Part::bytes(b"nuqneH".to_vec())
            .file_name("hello.txt")
            .mime_type("text/plain"),
    );
    let response = server().post("/api/translate").multipart(form).await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

// ── Report ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn generate_pdf_returns_attachment() {
    let response = server()
        .post("/api/generate-pdf")
        .json(&json!({
            "translatedText": "# Invoice\n**Total due**\n| Item | Price |\nThank you for your order.",
            "fileName": "factura.pdf",
            "sourceLang": "spanish",
            "targetLang": "english",
            "metadata": { "model": "Anthropic claude", "wordCount": 12 }
        }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "application/pdf");
    let disposition = response.header("content-disposition");
    let disposition = disposition.to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"translation_report_"));
    assert!(response.as_bytes().starts_with(b"%PDF"));
}

#[tokio::test]
async fn generate_pdf_requires_text() {
    let response = server()
        .post("/api/generate-pdf")
        .json(&json!({ "translatedText": "" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "No translated text provided");
}

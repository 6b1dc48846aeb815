//! HTTP surface (axum).
//!
//! | Route | Body | Success |
//! |-------|------|---------|
//! | `POST /api/translate`      | multipart `file`, `sourceLang`, `targetLang` | `{ success, data }` |
//! | `POST /api/translate-text` | JSON `{ text, sourceLang, targetLang }`      | `{ success, data }` |
//! | `POST /api/generate-pdf`   | JSON [`ReportRequest`]                      | PDF attachment |
//! | `GET  /api/health`         | none                                        | credential status |
//!
//! Failures use `{ success: false, error, details }` with the status chosen
//! by [`ApiError`].

use crate::config::{Credentials, ServiceStatus};
use crate::error::TranslateError;
use crate::language::{parse_target, Language};
use crate::output::TranslationResult;
use crate::pipeline::input::FilePayload;
use crate::report::{render_pdf, report_filename, ReportRequest};
use crate::translate::Translator;
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Slack on top of the upload cap for multipart framing and form fields.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

const KEY_HINT: &str = "Translation failed. Please check that your provider API keys are configured and try again.";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub translator: Arc<Translator>,
    pub credentials: Arc<Credentials>,
}

impl AppState {
    pub fn new(translator: Translator, credentials: Credentials) -> Self {
        Self {
            translator: Arc::new(translator),
            credentials: Arc::new(credentials),
        }
    }
}

/// Build the router with tracing, CORS and the upload body limit.
pub fn router(state: AppState) -> Router {
    let body_limit = state.translator.config().max_upload_bytes + MULTIPART_OVERHEAD;
    Router::new()
        .route("/api/translate", post(translate_upload))
        .route("/api/translate-text", post(translate_text))
        .route("/api/generate-pdf", post(generate_pdf))
        .route("/api/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}

// ── Envelopes ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Success<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> Success<T> {
    fn new(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

#[derive(Debug, Serialize)]
struct Failure {
    success: bool,
    error: String,
    details: Option<String>,
}

/// A failed request: status plus the `{ error, details }` pair.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: message.into(),
            details: None,
        }
    }
}

impl From<TranslateError> for ApiError {
    fn from(err: TranslateError) -> Self {
        let (status, details) = match &err {
            TranslateError::FileTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, None),
            e if e.is_input_error() => (StatusCode::BAD_REQUEST, None),
            TranslateError::Timeout { .. } => {
                (StatusCode::GATEWAY_TIMEOUT, Some(KEY_HINT.to_string()))
            }
            TranslateError::AllProvidersFailed { .. } => {
                (StatusCode::BAD_GATEWAY, Some(KEY_HINT.to_string()))
            }
            TranslateError::ReportFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, Some(KEY_HINT.to_string())),
        };
        if status.is_server_error() {
            error!("Request failed: {}", err);
        } else {
            warn!("Rejected request: {}", err);
        }
        Self {
            status,
            error: err.to_string(),
            details,
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self {
            status: err.status(),
            error: "Invalid upload".to_string(),
            details: Some(err.body_text()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Failure {
            success: false,
            error: self.error,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ── Handlers ─────────────────────────────────────────────────────────────

fn parse_source(raw: Option<&str>) -> Result<Language, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(name) => Ok(name.parse::<Language>()?),
        None => Err(ApiError::bad_request("Source language is required")),
    }
}

async fn translate_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<Success<TranslationResult>>> {
    let mut upload: Option<(String, Option<String>, Vec<u8>)> = None;
    let mut source = None;
    let mut target = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                upload = Some((filename, content_type, bytes.to_vec()));
            }
            "sourceLang" => source = Some(field.text().await?),
            "targetLang" => target = Some(field.text().await?),
            _ => {}
        }
    }

    let (filename, content_type, bytes) = upload.ok_or(TranslateError::MissingFile)?;
    let source = parse_source(source.as_deref())?;
    let target = parse_target(target.as_deref())?;
    let payload = FilePayload::new(
        filename,
        content_type.as_deref(),
        bytes,
        state.translator.config().max_upload_bytes,
    )?;

    let result = state.translator.translate_file(payload, source, target).await?;
    Ok(Success::new(result))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRequest {
    #[serde(default)]
    pub text: String,
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
}

async fn translate_text(
    State(state): State<AppState>,
    Json(body): Json<TextRequest>,
) -> ApiResult<Json<Success<TranslationResult>>> {
    if body.text.trim().is_empty() {
        return Err(TranslateError::EmptyText.into());
    }
    let source = parse_source(body.source_lang.as_deref())?;
    let target = parse_target(body.target_lang.as_deref())?;
    let result = state.translator.translate_text(&body.text, source, target).await?;
    Ok(Success::new(result))
}

async fn generate_pdf(Json(request): Json<ReportRequest>) -> ApiResult<Response> {
    if request.translated_text.trim().is_empty() {
        return Err(ApiError::bad_request("No translated text provided"));
    }
    let bytes = tokio::task::spawn_blocking(move || render_pdf(&request))
        .await
        .map_err(|e| TranslateError::Internal(format!("report task panicked: {e}")))??;

    let disposition = format!("attachment; filename=\"{}\"", report_filename());
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub timestamp: String,
    pub services: ServiceStatus,
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        timestamp: Utc::now().to_rfc3339(),
        services: state.credentials.status(),
    })
}

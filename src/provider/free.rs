//! `free-fallback`: keyless public translation services as the last resort.
//!
//! ## Strategy
//!
//! - **Short text** (under `single_call_threshold` chars): every service is
//!   asked at once and the first non-empty answer wins. The losers are
//!   dropped, which cancels their in-flight requests.
//! - **Long text**: split into sentence-bounded chunks of at most
//!   `max_chunk_chars`, translate up to `chunk_concurrency` chunks at a time,
//!   and join the results with single spaces **in input order**. Each chunk
//!   tries the services in order and keeps its source text if all fail, so
//!   one bad chunk never sinks the document.
//!
//! Public endpoints reject long query strings, which is why chunks stay well
//! below the 5000-char limits these services advertise.

use crate::acceptance::ProviderTier;
use crate::config::{Credentials, FreeChainConfig, TranslatorConfig};
use crate::error::ProviderError;
use crate::language::Language;
use crate::pipeline::input::MediaKind;
use crate::provider::{has_extracted_text, ProviderId, ProviderRequest, TranslationProvider};
use async_trait::async_trait;
use futures::stream::{self, FuturesUnordered, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One keyless translation endpoint.
#[async_trait]
pub trait TextService: Send + Sync {
    fn name(&self) -> &'static str;

    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<Option<String>, ProviderError>;
}

// ── Chunking ─────────────────────────────────────────────────────────────

static RE_SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").unwrap());

/// Split after `.`, `!` or `?` followed by whitespace. The whitespace is
/// dropped; terminators stay with their sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    for m in RE_SENTENCE_END.find_iter(text) {
        let end = m.start() + 1;
        let sentence = text[start..end].trim();
        if !sentence.is_empty() {
            out.push(sentence);
        }
        start = m.end();
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

/// Greedily pack sentences into chunks of at most `max_chars` characters,
/// joined by single spaces.
///
/// A sentence longer than `max_chars` becomes a chunk of its own rather
/// than being cut mid-sentence.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for sentence in split_sentences(text) {
        let len = sentence.chars().count();
        if current_len > 0 && current_len + 1 + len > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(sentence);
        current_len += len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

// ── Chain ────────────────────────────────────────────────────────────────

/// Orchestrates the free services for one text.
pub struct FreeFallbackChain {
    services: Vec<Arc<dyn TextService>>,
    config: FreeChainConfig,
}

impl FreeFallbackChain {
    pub fn new(services: Vec<Arc<dyn TextService>>, mut config: FreeChainConfig) -> Self {
        config.chunk_concurrency = config.chunk_concurrency.max(1);
        config.max_chunk_chars = config.max_chunk_chars.max(1);
        Self { services, config }
    }

    /// Google, MyMemory, LibreTranslate against their public hosts.
    pub fn public(credentials: &Credentials, config: FreeChainConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.service_timeout_secs))
            .build()
            .unwrap_or_default();
        let timeout = config.service_timeout_secs;
        Self::new(
            vec![
                Arc::new(GoogleGtx::new(client.clone(), timeout)) as Arc<dyn TextService>,
                Arc::new(MyMemory::new(client.clone(), timeout)),
                Arc::new(LibreTranslate::new(
                    client,
                    timeout,
                    credentials.libretranslate.clone(),
                )),
            ],
            config,
        )
    }

    /// Translate `text`; `None` when no service produced anything.
    pub async fn translate(&self, text: &str, source: Language, target: Language) -> Option<String> {
        let len = text.chars().count();
        if len == 0 || self.services.is_empty() {
            return None;
        }
        if len < self.config.single_call_threshold {
            self.race(text, source, target).await
        } else {
            self.translate_chunked(text, source, target).await
        }
    }

    async fn race(&self, text: &str, source: Language, target: Language) -> Option<String> {
        debug!("free-fallback: racing {} services", self.services.len());
        let mut pending: FuturesUnordered<_> = self
            .services
            .iter()
            .map(|service| async move {
                (service.name(), service.translate(text, source, target).await)
            })
            .collect();

        while let Some((name, outcome)) = pending.next().await {
            match outcome {
                Ok(Some(t)) if !t.trim().is_empty() => {
                    info!("free-fallback: {} answered first", name);
                    return Some(t);
                }
                Ok(_) => debug!("free-fallback: {} returned nothing", name),
                Err(e) => debug!("free-fallback: {}", e),
            }
        }
        None
    }

    async fn translate_chunked(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Option<String> {
        let chunks = chunk_text(text, self.config.max_chunk_chars);
        let total = chunks.len();
        info!(
            "free-fallback: {} chunks, {} in flight",
            total, self.config.chunk_concurrency
        );

        let results: Vec<(String, bool)> = stream::iter(chunks.into_iter().enumerate())
            .map(|(i, chunk)| async move {
                let result = self.translate_chunk(&chunk, source, target).await;
                debug!("free-fallback: chunk {}/{} done", i + 1, total);
                match result {
                    Some(t) => (t, true),
                    None => (chunk, false),
                }
            })
            .buffered(self.config.chunk_concurrency)
            .collect()
            .await;

        let translated = results.iter().filter(|(_, ok)| *ok).count();
        if translated == 0 {
            warn!("free-fallback: no chunk could be translated");
            return None;
        }
        if translated < total {
            warn!(
                "free-fallback: {}/{} chunks left untranslated",
                total - translated,
                total
            );
        }

        Some(
            results
                .into_iter()
                .map(|(t, _)| t)
                .collect::<Vec<_>>()
                .join(" "),
        )
    }

    async fn translate_chunk(&self, chunk: &str, source: Language, target: Language) -> Option<String> {
        for service in &self.services {
            match service.translate(chunk, source, target).await {
                Ok(Some(t)) if !t.trim().is_empty() => return Some(t),
                Ok(_) => debug!("free-fallback: {} returned nothing for chunk", service.name()),
                Err(e) => debug!("free-fallback: {}", e),
            }
        }
        None
    }
}

/// [`TranslationProvider`] facade over [`FreeFallbackChain`].
pub struct FreeFallbackProvider {
    chain: FreeFallbackChain,
}

impl FreeFallbackProvider {
    pub fn new(credentials: &Credentials, config: &TranslatorConfig) -> Self {
        Self {
            chain: FreeFallbackChain::public(credentials, config.free_chain),
        }
    }

    pub fn with_chain(chain: FreeFallbackChain) -> Self {
        Self { chain }
    }
}

#[async_trait]
impl TranslationProvider for FreeFallbackProvider {
    fn id(&self) -> ProviderId {
        ProviderId::FreeFallback
    }

    fn tier(&self) -> ProviderTier {
        ProviderTier::Free
    }

    fn supports(&self, kind: MediaKind) -> bool {
        has_extracted_text(kind)
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn translate(&self, request: &ProviderRequest) -> Result<Option<String>, ProviderError> {
        if request.text.trim().is_empty() {
            return Ok(None);
        }
        Ok(self
            .chain
            .translate(&request.text, request.source, request.target)
            .await)
    }
}

// ── Services ─────────────────────────────────────────────────────────────

async fn get_json(
    name: &str,
    request: reqwest::RequestBuilder,
    timeout_secs: u64,
) -> Result<Value, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::from_reqwest(name, &e, timeout_secs))?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::from_status(name, status.as_u16(), body));
    }
    response
        .json::<Value>()
        .await
        .map_err(|e| ProviderError::from_reqwest(name, &e, timeout_secs))
}

fn non_empty(s: String) -> Option<String> {
    (!s.trim().is_empty()).then_some(s)
}

/// Google Translate's unauthenticated `gtx` client endpoint.
pub struct GoogleGtx {
    client: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
}

impl GoogleGtx {
    pub const DEFAULT_BASE_URL: &'static str = "https://translate.googleapis.com";

    pub fn new(client: reqwest::Client, timeout_secs: u64) -> Self {
        Self {
            client,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            timeout_secs,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// The gtx answer is `[[["translated", "source", ...], ...], ...]`.
fn parse_gtx(value: &Value) -> Option<String> {
    let segments = value.get(0)?.as_array()?;
    let joined: String = segments
        .iter()
        .filter_map(|seg| seg.get(0).and_then(Value::as_str))
        .collect();
    non_empty(joined)
}

#[async_trait]
impl TextService for GoogleGtx {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<Option<String>, ProviderError> {
        let request = self
            .client
            .get(format!("{}/translate_a/single", self.base_url))
            .query(&[
                ("client", "gtx"),
                ("sl", source.iso_code()),
                ("tl", target.iso_code()),
                ("dt", "t"),
                ("q", text),
            ]);
        let value = get_json(self.name(), request, self.timeout_secs).await?;
        Ok(parse_gtx(&value))
    }
}

/// MyMemory's public `get` endpoint.
pub struct MyMemory {
    client: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
}

impl MyMemory {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.mymemory.translated.net";

    pub fn new(client: reqwest::Client, timeout_secs: u64) -> Self {
        Self {
            client,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            timeout_secs,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MyMemoryResponse {
    response_data: Option<MyMemoryData>,
    #[serde(default)]
    response_status: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MyMemoryData {
    translated_text: Option<String>,
}

#[async_trait]
impl TextService for MyMemory {
    fn name(&self) -> &'static str {
        "mymemory"
    }

    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<Option<String>, ProviderError> {
        let langpair = format!("{}|{}", source.iso_code(), target.iso_code());
        let request = self
            .client
            .get(format!("{}/get", self.base_url))
            .query(&[("q", text), ("langpair", langpair.as_str())]);
        let value = get_json(self.name(), request, self.timeout_secs).await?;
        let parsed: MyMemoryResponse =
            serde_json::from_value(value).map_err(|e| ProviderError::Malformed {
                provider: self.name().to_string(),
                detail: e.to_string(),
            })?;

        // Quota errors arrive as HTTP 200 with the status inside the body.
        let status = parsed
            .response_status
            .as_u64()
            .or_else(|| parsed.response_status.as_str().and_then(|s| s.parse().ok()))
            .unwrap_or(200);
        if status != 200 {
            return Err(ProviderError::from_status(self.name(), status as u16, ""));
        }

        let text = parsed
            .response_data
            .and_then(|d| d.translated_text)
            .and_then(non_empty);
        match text {
            Some(t) if t.starts_with("MYMEMORY WARNING") => Err(ProviderError::RateLimited {
                provider: self.name().to_string(),
            }),
            other => Ok(other),
        }
    }
}

/// A LibreTranslate instance (the public one by default).
pub struct LibreTranslate {
    client: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
    api_key: Option<String>,
}

impl LibreTranslate {
    pub const DEFAULT_BASE_URL: &'static str = "https://libretranslate.com";

    pub fn new(client: reqwest::Client, timeout_secs: u64, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            timeout_secs,
            api_key,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl TextService for LibreTranslate {
    fn name(&self) -> &'static str {
        "libretranslate"
    }

    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<Option<String>, ProviderError> {
        let mut body = serde_json::json!({
            "q": text,
            "source": source.iso_code(),
            "target": target.iso_code(),
            "format": "text",
        });
        if let Some(key) = &self.api_key {
            body["api_key"] = Value::String(key.clone());
        }
        let request = self
            .client
            .post(format!("{}/translate", self.base_url))
            .json(&body);
        let value = get_json(self.name(), request, self.timeout_secs).await?;
        Ok(value
            .get("translatedText")
            .and_then(Value::as_str)
            .map(str::to_string)
            .and_then(non_empty))
    }
}

//! Ordered fallback across providers with retry and acceptance gating.
//!
//! ## Why one generic loop?
//!
//! Every media kind follows the same state machine; only the provider list
//! differs. Routes are data ([`Route`]), so adding a provider or reordering
//! a kind is a table change, and tests can drive the loop with fakes.
//!
//! ```text
//! NotStarted ─▶ Trying(0) ─┬─▶ Accepted
//!                          ├─▶ Trying(1) ─▶ … ─▶ Trying(n-1) ─▶ Exhausted
//!                          └─ (declined / failed / rejected all advance)
//! ```
//!
//! A declined provider (wrong media kind, missing credentials, no text) is
//! logged at `debug`; one that ran and failed or produced unusable output is
//! logged at `warn`. Both simply advance to the next provider.

use crate::acceptance::ProviderTier;
use crate::config::TranslatorConfig;
use crate::error::TranslateError;
use crate::pipeline::input::MediaKind;
use crate::progress::{NoopObserver, Observer};
use crate::provider::{ProviderId, ProviderRequest, TranslationProvider};
use crate::retry::RetryPolicy;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Ordered provider list for one media kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub kind: MediaKind,
    pub providers: Vec<ProviderId>,
}

impl Route {
    /// The built-in priority order for `kind`.
    pub fn default_for(kind: MediaKind) -> Self {
        use ProviderId::*;
        let providers = match kind {
            MediaKind::Image => vec![GeminiVision, OpenAiVision, ClaudeDocument, FreeFallback],
            MediaKind::Pdf => vec![ClaudeDocument, OpenAiText, OpenRouterText, FreeFallback],
            MediaKind::Docx | MediaKind::Text | MediaKind::Json => {
                vec![OpenAiText, OpenRouterText, FreeFallback]
            }
        };
        Self { kind, providers }
    }
}

/// What happened to one provider during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Skipped without a call.
    Declined(String),
    /// Called; errored or returned nothing after all retries.
    Failed(String),
    /// Called; output did not pass the acceptance policy.
    Rejected(String),
    Accepted,
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptOutcome::Declined(r) => write!(f, "declined: {r}"),
            AttemptOutcome::Failed(r) => write!(f, "failed: {r}"),
            AttemptOutcome::Rejected(r) => write!(f, "rejected: {r}"),
            AttemptOutcome::Accepted => f.write_str("accepted"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAttempt {
    pub provider: ProviderId,
    pub outcome: AttemptOutcome,
}

/// Successful result of [`Orchestrator::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestrationOutcome {
    pub translated_text: String,
    pub provider_used: ProviderId,
    /// Every provider on the route up to and including the accepted one.
    pub attempts: Vec<ProviderAttempt>,
}

/// Walks a route until one provider's output is accepted.
pub struct Orchestrator {
    providers: HashMap<ProviderId, Arc<dyn TranslationProvider>>,
    routes: HashMap<MediaKind, Route>,
    retry: RetryPolicy,
    config: TranslatorConfig,
    observer: Observer,
}

impl Orchestrator {
    /// Register `providers` under their ids with the built-in routes. A later
    /// provider with the same id replaces an earlier one.
    pub fn new(providers: Vec<Arc<dyn TranslationProvider>>, config: &TranslatorConfig) -> Self {
        let providers = providers.into_iter().map(|p| (p.id(), p)).collect();
        let routes = [
            MediaKind::Image,
            MediaKind::Pdf,
            MediaKind::Docx,
            MediaKind::Text,
            MediaKind::Json,
        ]
        .into_iter()
        .map(|k| (k, Route::default_for(k)))
        .collect();
        let observer = config
            .observer
            .clone()
            .unwrap_or_else(|| Arc::new(NoopObserver) as Observer);

        Self {
            providers,
            routes,
            retry: RetryPolicy::from_config(config),
            config: config.clone(),
            observer,
        }
    }

    /// Replace the route for one media kind.
    pub fn with_route(mut self, route: Route) -> Self {
        self.routes.insert(route.kind, route);
        self
    }

    pub fn route(&self, kind: MediaKind) -> &[ProviderId] {
        self.routes
            .get(&kind)
            .map(|r| r.providers.as_slice())
            .unwrap_or(&[])
    }

    /// Ids of registered providers that have credentials.
    pub fn configured(&self) -> Vec<ProviderId> {
        ProviderId::ALL
            .into_iter()
            .filter(|id| self.providers.get(id).is_some_and(|p| p.is_configured()))
            .collect()
    }

    /// Try the route for `request.kind` in order.
    pub async fn run(&self, request: &ProviderRequest) -> Result<OrchestrationOutcome, TranslateError> {
        let route = self.route(request.kind);
        let total = route.len();
        let source_len = request.source_len();
        let mut attempts = Vec::with_capacity(total);

        info!(
            "Orchestrating {} input ({} source chars) across {} providers",
            request.kind, source_len, total
        );

        for (i, &id) in route.iter().enumerate() {
            let provider = match self.check_eligible(id, request) {
                Ok(p) => p,
                Err(reason) => {
                    debug!("{}: declined ({})", id, reason);
                    self.observer.on_provider_declined(id.as_str(), &reason);
                    attempts.push(ProviderAttempt {
                        provider: id,
                        outcome: AttemptOutcome::Declined(reason),
                    });
                    continue;
                }
            };

            info!("Trying {} ({}/{})", id, i + 1, total);
            self.observer.on_provider_start(id.as_str(), i + 1, total);

            let outcome = self
                .retry
                .run(id.as_str(), || provider.translate(request))
                .await;

            let reason = match outcome {
                Ok(Some(text)) => {
                    let policy = self.config.policy_for(provider.tier());
                    let verdict = policy.evaluate(&text, source_len);
                    if verdict.is_accepted() {
                        let chars = text.chars().count();
                        info!("{} accepted ({} chars)", id, chars);
                        self.observer.on_accepted(id.as_str(), chars);
                        attempts.push(ProviderAttempt {
                            provider: id,
                            outcome: AttemptOutcome::Accepted,
                        });
                        return Ok(OrchestrationOutcome {
                            translated_text: text,
                            provider_used: id,
                            attempts,
                        });
                    }
                    AttemptOutcome::Rejected(verdict.to_string())
                }
                Ok(None) => AttemptOutcome::Failed("no output".into()),
                Err(e) => AttemptOutcome::Failed(e.to_string()),
            };

            warn!("{} {}, moving on", id, reason);
            self.observer.on_provider_rejected(id.as_str(), &reason.to_string());
            attempts.push(ProviderAttempt {
                provider: id,
                outcome: reason,
            });
        }

        let attempted: Vec<String> = attempts
            .iter()
            .map(|a| format!("{} ({})", a.provider, a.outcome))
            .collect();
        warn!("All {} providers exhausted for {} input", total, request.kind);
        self.observer.on_exhausted(&attempted);
        Err(TranslateError::AllProvidersFailed { attempted })
    }

    fn check_eligible(
        &self,
        id: ProviderId,
        request: &ProviderRequest,
    ) -> Result<&Arc<dyn TranslationProvider>, String> {
        let provider = self
            .providers
            .get(&id)
            .ok_or_else(|| "not registered".to_string())?;
        if !provider.supports(request.kind) {
            return Err(format!("does not read {} input", request.kind));
        }
        if !provider.is_configured() {
            return Err("not configured".into());
        }
        let needs_text = matches!(provider.tier(), ProviderTier::Text | ProviderTier::Free);
        if needs_text && request.text.trim().is_empty() {
            return Err("no extracted text".into());
        }
        Ok(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_routes() {
        use ProviderId::*;
        assert_eq!(
            Route::default_for(MediaKind::Image).providers,
            vec![GeminiVision, OpenAiVision, ClaudeDocument, FreeFallback]
        );
        assert_eq!(
            Route::default_for(MediaKind::Pdf).providers,
            vec![ClaudeDocument, OpenAiText, OpenRouterText, FreeFallback]
        );
        for kind in [MediaKind::Docx, MediaKind::Text, MediaKind::Json] {
            assert_eq!(
                Route::default_for(kind).providers,
                vec![OpenAiText, OpenRouterText, FreeFallback]
            );
        }
    }

    #[test]
    fn attempt_outcome_display() {
        assert_eq!(
            AttemptOutcome::Declined("not configured".into()).to_string(),
            "declined: not configured"
        );
        assert_eq!(AttemptOutcome::Accepted.to_string(), "accepted");
    }

    #[tokio::test]
    async fn empty_registry_exhausts() {
        let orch = Orchestrator::new(vec![], &TranslatorConfig::default());
        let req = ProviderRequest::text_only(
            "Hola",
            crate::language::Language::Spanish,
            crate::language::Language::English,
        );
        let err = orch.run(&req).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("openai-text (declined: not registered)"), "got: {msg}");
        assert!(msg.contains("free-fallback"), "got: {msg}");
    }
}

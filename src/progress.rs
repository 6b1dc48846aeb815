//! Observer trait for orchestration events.
//!
//! Inject an [`Arc<dyn OrchestrationObserver>`] via
//! [`crate::config::TranslatorConfigBuilder::observer`] to receive events as
//! the orchestrator walks its provider list. The CLI uses this to drive a
//! spinner; the server leaves it unset and relies on tracing.
//!
//! # Example
//!
//! ```rust
//! use translatrix::{OrchestrationObserver, TranslatorConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingObserver {
//!     tried: AtomicUsize,
//! }
//!
//! impl OrchestrationObserver for CountingObserver {
//!     fn on_provider_start(&self, provider: &str, position: usize, total: usize) {
//!         self.tried.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("trying {provider} ({position}/{total})");
//!     }
//! }
//!
//! let observer = Arc::new(CountingObserver { tried: AtomicUsize::new(0) });
//! let config = TranslatorConfig::builder()
//!     .observer(observer as Arc<dyn OrchestrationObserver>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the orchestrator as it moves through its provider list.
///
/// Implementations must be `Send + Sync`: concurrent requests share one
/// observer. All methods default to no-ops.
pub trait OrchestrationObserver: Send + Sync {
    /// A provider is about to be invoked.
    ///
    /// * `position`: 1-indexed place in the route
    /// * `total`   : route length
    fn on_provider_start(&self, provider: &str, position: usize, total: usize) {
        let _ = (provider, position, total);
    }

    /// A provider was skipped without a call (unsupported media or no credentials).
    fn on_provider_declined(&self, provider: &str, reason: &str) {
        let _ = (provider, reason);
    }

    /// A provider ran but its output was absent, failed, or too short.
    fn on_provider_rejected(&self, provider: &str, reason: &str) {
        let _ = (provider, reason);
    }

    /// A provider's output was accepted; orchestration stops here.
    fn on_accepted(&self, provider: &str, chars: usize) {
        let _ = (provider, chars);
    }

    /// Every provider in the route failed.
    fn on_exhausted(&self, attempted: &[String]) {
        let _ = attempted;
    }
}

/// A no-op observer, the default when none is configured.
pub struct NoopObserver;

impl OrchestrationObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::config::TranslatorConfig`].
pub type Observer = Arc<dyn OrchestrationObserver>;

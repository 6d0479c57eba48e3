//! # Application State Management
//!
//! Shared state handed to every HTTP request handler through `web::Data`.
//!
//! ## What lives here:
//! - **config**: read-only after startup, so a plain `Arc` is enough
//! - **random**: the random source behind greetings, mock transcription and vitals
//! - **store / cleanup**: the upload pipeline's disk side
//! - **metrics**: request counters, updated by middleware on every request
//!
//! ## Arc<RwLock<T>> for metrics
//! Every worker thread records metrics, so they need shared ownership (`Arc`)
//! and synchronized mutation (`RwLock`). Nothing else in the state is mutable.
//! The companion itself keeps no per-user or per-conversation state.

use crate::companion::random::{self, RandomSource};
use crate::config::AppConfig;
use crate::uploads::{AudioStore, CleanupScheduler};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

/// The application state shared across all HTTP request handlers.
///
/// Cloning is cheap: every field is either `Copy` or reference counted, and
/// clones observe the same metrics and pending cleanups.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub random: Arc<dyn RandomSource>,
    pub store: AudioStore,
    pub cleanup: CleanupScheduler,
    pub metrics: Arc<RwLock<AppMetrics>>,
    pub start_time: Instant,
}

/// Request metrics collected across all HTTP requests.
#[derive(Debug, Default, Clone)]
pub struct AppMetrics {
    /// Total number of HTTP requests processed since server start
    pub request_count: u64,

    /// Requests that ended with a 4xx or 5xx status
    pub error_count: u64,

    /// Audio clips accepted and stored
    pub uploads_accepted: u64,

    /// Per-endpoint statistics, keyed like `"POST /api/chat"`
    pub endpoint_metrics: HashMap<String, EndpointMetric>,
}

/// Detailed performance metrics for a specific API endpoint.
#[derive(Debug, Default, Clone)]
pub struct EndpointMetric {
    pub request_count: u64,
    pub total_duration_ms: u64,
    pub error_count: u64,
}

impl AppState {
    /// Build the state from configuration, seeding the random source from
    /// `companion.random_seed` when present.
    pub fn new(config: AppConfig) -> Self {
        let random = random::from_seed(config.companion.random_seed);
        Self::with_random(config, random)
    }

    /// Build the state with an explicit random source (tests use a fixed one).
    pub fn with_random(config: AppConfig, random: Arc<dyn RandomSource>) -> Self {
        let store = AudioStore::new(&config.uploads, Arc::clone(&random));
        let cleanup = CleanupScheduler::new(config.uploads.cleanup_delay());

        Self {
            config: Arc::new(config),
            random,
            store,
            cleanup,
            metrics: Arc::new(RwLock::new(AppMetrics::default())),
            start_time: Instant::now(),
        }
    }

    pub fn increment_request_count(&self) {
        let mut metrics = self.metrics.write().unwrap_or_else(PoisonError::into_inner);
        metrics.request_count += 1;
    }

    pub fn increment_error_count(&self) {
        let mut metrics = self.metrics.write().unwrap_or_else(PoisonError::into_inner);
        metrics.error_count += 1;
    }

    pub fn record_upload(&self) {
        let mut metrics = self.metrics.write().unwrap_or_else(PoisonError::into_inner);
        metrics.uploads_accepted += 1;
    }

    /// Record one finished request against its endpoint.
    ///
    /// The first request to an endpoint creates its entry.
    pub fn record_endpoint_request(&self, endpoint: &str, duration_ms: u64, is_error: bool) {
        let mut metrics = self.metrics.write().unwrap_or_else(PoisonError::into_inner);
        let endpoint_metric = metrics.endpoint_metrics.entry(endpoint.to_string()).or_default();

        endpoint_metric.request_count += 1;
        endpoint_metric.total_duration_ms += duration_ms;

        if is_error {
            endpoint_metric.error_count += 1;
        }
    }

    /// Copy of the current metrics, so no lock is held while serializing.
    pub fn get_metrics_snapshot(&self) -> AppMetrics {
        self.metrics.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl AppMetrics {
    /// Fraction of requests that failed, 0.0 when there were none.
    pub fn error_rate(&self) -> f64 {
        if self.request_count > 0 {
            self.error_count as f64 / self.request_count as f64
        } else {
            0.0
        }
    }
}

impl EndpointMetric {
    pub fn average_duration_ms(&self) -> f64 {
        if self.request_count > 0 {
            self.total_duration_ms as f64 / self.request_count as f64
        } else {
            0.0
        }
    }

    pub fn error_rate(&self) -> f64 {
        if self.request_count > 0 {
            self.error_count as f64 / self.request_count as f64
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_metrics() {
        let state = AppState::new(AppConfig::default());
        let clone = state.clone();

        state.increment_request_count();
        clone.increment_request_count();
        clone.increment_error_count();
        state.record_upload();

        let snapshot = state.get_metrics_snapshot();
        assert_eq!(snapshot.request_count, 2);
        assert_eq!(snapshot.error_count, 1);
        assert_eq!(snapshot.uploads_accepted, 1);
        assert_eq!(snapshot.error_rate(), 0.5);
    }

    #[test]
    fn test_endpoint_metrics() {
        let state = AppState::new(AppConfig::default());
        state.record_endpoint_request("POST /api/chat", 10, false);
        state.record_endpoint_request("POST /api/chat", 30, true);

        let snapshot = state.get_metrics_snapshot();
        let chat = &snapshot.endpoint_metrics["POST /api/chat"];
        assert_eq!(chat.request_count, 2);
        assert_eq!(chat.average_duration_ms(), 20.0);
        assert_eq!(chat.error_rate(), 0.5);
        assert_eq!(EndpointMetric::default().average_duration_ms(), 0.0);
    }

    #[test]
    fn test_seeded_state_is_reproducible() {
        let mut config = AppConfig::default();
        config.companion.random_seed = Some(7);
        let a = AppState::new(config.clone());
        let b = AppState::new(config);
        assert_eq!(a.random.next_unit(), b.random.next_unit());
    }
}

// Prometheus metrics for the gateway HTTP server

use crate::enrich::EnrichSummary;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics collector for the gateway
#[derive(Clone)]
pub struct Metrics {
    // Request metrics
    requests_total: Arc<AtomicU64>,
    requests_in_flight: Arc<AtomicU64>,
    request_duration_sum: Arc<AtomicU64>,
    request_duration_count: Arc<AtomicU64>,

    // Business metrics
    search_total: Arc<AtomicU64>,
    plugins_total: Arc<AtomicU64>,

    // Outcome metrics
    rejected_total: Arc<AtomicU64>,
    errors_total: Arc<AtomicU64>,

    // npm stats metrics
    stats_enriched_total: Arc<AtomicU64>,
    stats_failures_total: Arc<AtomicU64>,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self {
            requests_total: Arc::new(AtomicU64::new(0)),
            requests_in_flight: Arc::new(AtomicU64::new(0)),
            request_duration_sum: Arc::new(AtomicU64::new(0)),
            request_duration_count: Arc::new(AtomicU64::new(0)),
            search_total: Arc::new(AtomicU64::new(0)),
            plugins_total: Arc::new(AtomicU64::new(0)),
            rejected_total: Arc::new(AtomicU64::new(0)),
            errors_total: Arc::new(AtomicU64::new(0)),
            stats_enriched_total: Arc::new(AtomicU64::new(0)),
            stats_failures_total: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn inc_requests_total(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_requests_in_flight(&self) {
        self.requests_in_flight.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec_requests_in_flight(&self) {
        self.requests_in_flight.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record request duration (in milliseconds)
    pub fn record_request_duration(&self, duration_ms: u64) {
        self.request_duration_sum.fetch_add(duration_ms, Ordering::Relaxed);
        self.request_duration_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get request duration average in milliseconds
    pub fn get_request_duration_avg_ms(&self) -> f64 {
        let sum = self.request_duration_sum.load(Ordering::Relaxed);
        let count = self.request_duration_count.load(Ordering::Relaxed);
        if count > 0 {
            sum as f64 / count as f64
        } else {
            0.0
        }
    }

    pub fn inc_search(&self) {
        self.search_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_plugins(&self) {
        self.plugins_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a finished response by status class
    pub fn record_status(&self, status: u16) {
        match status {
            400..=499 => {
                self.rejected_total.fetch_add(1, Ordering::Relaxed);
            }
            500..=599 => {
                self.errors_total.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    pub fn record_enrichment(&self, summary: &EnrichSummary) {
        self.stats_enriched_total
            .fetch_add(summary.enriched as u64, Ordering::Relaxed);
        self.stats_failures_total
            .fetch_add(summary.failed as u64, Ordering::Relaxed);
    }

    pub fn get_requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    pub fn get_requests_in_flight(&self) -> u64 {
        self.requests_in_flight.load(Ordering::Relaxed)
    }

    pub fn get_search_total(&self) -> u64 {
        self.search_total.load(Ordering::Relaxed)
    }

    pub fn get_plugins_total(&self) -> u64 {
        self.plugins_total.load(Ordering::Relaxed)
    }

    pub fn get_rejected_total(&self) -> u64 {
        self.rejected_total.load(Ordering::Relaxed)
    }

    pub fn get_errors_total(&self) -> u64 {
        self.errors_total.load(Ordering::Relaxed)
    }

    pub fn get_stats_enriched_total(&self) -> u64 {
        self.stats_enriched_total.load(Ordering::Relaxed)
    }

    pub fn get_stats_failures_total(&self) -> u64 {
        self.stats_failures_total.load(Ordering::Relaxed)
    }

    /// Prometheus text exposition
    pub fn render(&self) -> String {
        format!(
r#"# HELP registry_http_requests_total Total HTTP requests received
# TYPE registry_http_requests_total counter
registry_http_requests_total {}

# HELP registry_http_requests_in_flight Requests currently being processed
# TYPE registry_http_requests_in_flight gauge
registry_http_requests_in_flight {}

# HELP registry_http_request_duration_ms_avg Mean request latency in milliseconds
# TYPE registry_http_request_duration_ms_avg gauge
registry_http_request_duration_ms_avg {:.3}

# HELP registry_search_total Total search requests
# TYPE registry_search_total counter
registry_search_total {}

# HELP registry_get_plugins_total Total getPlugins requests
# TYPE registry_get_plugins_total counter
registry_get_plugins_total {}

# HELP registry_rejected_total Requests answered with a 4xx status
# TYPE registry_rejected_total counter
registry_rejected_total {}

# HELP registry_errors_total Requests answered with a 5xx status
# TYPE registry_errors_total counter
registry_errors_total {}

# HELP registry_npm_enriched_total Hits enriched with npm downloads
# TYPE registry_npm_enriched_total counter
registry_npm_enriched_total {}

# HELP registry_npm_failures_total Failed npm download lookups
# TYPE registry_npm_failures_total counter
registry_npm_failures_total {}
"#,
            self.get_requests_total(),
            self.get_requests_in_flight(),
            self.get_request_duration_avg_ms(),
            self.get_search_total(),
            self.get_plugins_total(),
            self.get_rejected_total(),
            self.get_errors_total(),
            self.get_stats_enriched_total(),
            self.get_stats_failures_total(),
        )
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

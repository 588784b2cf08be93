//! Prometheus metrics for the server.
//!
//! A fixed set of operation counters, exported in text format by the
//! `/metrics` endpoint.

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::registry::Registry;

/// Server operation counters.
pub struct AppMetrics {
    registry: Registry,
    pub records_inserted: Counter,
    pub records_deleted: Counter,
    pub searches: Counter,
}

impl AppMetrics {
    /// Create a meter with a fresh registry.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let records_inserted = Counter::default();
        registry.register(
            "recall_records_inserted",
            "Records inserted",
            records_inserted.clone(),
        );

        let records_deleted = Counter::default();
        registry.register(
            "recall_records_deleted",
            "Records deleted",
            records_deleted.clone(),
        );

        let searches = Counter::default();
        registry.register("recall_searches", "Search requests served", searches.clone());

        Self {
            registry,
            records_inserted,
            records_deleted,
            searches,
        }
    }

    /// Export metrics in Prometheus text format.
    pub fn export(&self) -> String {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry).unwrap();
        buffer
    }
}

impl Default for AppMetrics {
    fn default() -> Self {
        Self::new()
    }
}

//! Store metrics for observability

use crate::keys::StoreKey;
use prometheus::{CounterVec, Opts, Registry};
use std::sync::OnceLock;

static METRICS: OnceLock<StoreMetricsInner> = OnceLock::new();

struct StoreMetricsInner {
    reads: CounterVec,
    writes: CounterVec,
    errors: CounterVec,
}

impl StoreMetricsInner {
    fn new() -> Self {
        Self {
            reads: CounterVec::new(
                Opts::new("feed_store_reads_total", "Total sorted-set reads"),
                &["entity", "op"],
            )
            .expect("valid metric definition"),
            writes: CounterVec::new(
                Opts::new("feed_store_writes_total", "Total sorted-set writes"),
                &["entity", "op"],
            )
            .expect("valid metric definition"),
            errors: CounterVec::new(
                Opts::new("feed_store_errors_total", "Total sorted-set command errors"),
                &["entity", "error_type"],
            )
            .expect("valid metric definition"),
        }
    }

    fn register(&self, registry: &Registry) -> Result<(), prometheus::Error> {
        registry.register(Box::new(self.reads.clone()))?;
        registry.register(Box::new(self.writes.clone()))?;
        registry.register(Box::new(self.errors.clone()))?;
        Ok(())
    }
}

fn get_metrics() -> &'static StoreMetricsInner {
    METRICS.get_or_init(StoreMetricsInner::new)
}

fn extract_entity(key: &str) -> &str {
    StoreKey::entity_type(key).unwrap_or("unknown")
}

/// Store metrics wrapper
#[derive(Clone, Default)]
pub struct StoreMetrics;

impl StoreMetrics {
    pub fn new() -> Self {
        Self
    }

    /// Register metrics with a Prometheus registry
    pub fn register(registry: &Registry) -> Result<(), prometheus::Error> {
        get_metrics().register(registry)
    }

    pub fn record_read(&self, key: &str, op: &str) {
        let entity = extract_entity(key);
        get_metrics().reads.with_label_values(&[entity, op]).inc();
    }

    pub fn record_write(&self, key: &str, op: &str) {
        let entity = extract_entity(key);
        get_metrics().writes.with_label_values(&[entity, op]).inc();
    }

    pub fn record_error(&self, key: &str, error_type: &str) {
        let entity = extract_entity(key);
        get_metrics()
            .errors
            .with_label_values(&[entity, error_type])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_are_labelled_by_entity() {
        let metrics = StoreMetrics::new();
        let before = get_metrics()
            .errors
            .with_label_values(&["feed", "timeout"])
            .get();
        metrics.record_error("v1:feed:abc", "timeout");
        let after = get_metrics()
            .errors
            .with_label_values(&["feed", "timeout"])
            .get();
        assert_eq!(after - before, 1.0);
    }

    #[test]
    fn test_unknown_entity() {
        assert_eq!(extract_entity("garbage"), "unknown");
    }
}

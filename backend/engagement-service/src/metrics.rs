//! Prometheus metrics for likes and fan-out

use actix_web::HttpResponse;
use prometheus::{CounterVec, Encoder, IntCounter, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

static METRICS: OnceLock<EngagementMetrics> = OnceLock::new();

pub struct EngagementMetrics {
    pub like_toggles: CounterVec,
    pub like_drift: IntCounter,
    pub fanout_deliveries: IntCounter,
    pub fanout_failures: IntCounter,
    pub partial_fanouts: IntCounter,
}

impl EngagementMetrics {
    fn new() -> Self {
        Self {
            like_toggles: CounterVec::new(
                Opts::new("engagement_like_toggles_total", "Like toggles by outcome"),
                &["outcome"],
            )
            .expect("valid metric definition"),
            like_drift: IntCounter::new(
                "engagement_like_drift_total",
                "Counter updates whose like-set write failed afterwards",
            )
            .expect("valid metric definition"),
            fanout_deliveries: IntCounter::new(
                "engagement_fanout_deliveries_total",
                "Timeline appends performed during fan-out",
            )
            .expect("valid metric definition"),
            fanout_failures: IntCounter::new(
                "engagement_fanout_failures_total",
                "Timeline appends that failed during fan-out",
            )
            .expect("valid metric definition"),
            partial_fanouts: IntCounter::new(
                "engagement_partial_fanouts_total",
                "Publishes whose fan-out missed at least one follower",
            )
            .expect("valid metric definition"),
        }
    }

    fn register(&self, registry: &Registry) -> Result<(), prometheus::Error> {
        registry.register(Box::new(self.like_toggles.clone()))?;
        registry.register(Box::new(self.like_drift.clone()))?;
        registry.register(Box::new(self.fanout_deliveries.clone()))?;
        registry.register(Box::new(self.fanout_failures.clone()))?;
        registry.register(Box::new(self.partial_fanouts.clone()))?;
        Ok(())
    }
}

pub fn metrics() -> &'static EngagementMetrics {
    METRICS.get_or_init(EngagementMetrics::new)
}

/// Register service and store metrics with a registry
pub fn register_all(registry: &Registry) -> Result<(), prometheus::Error> {
    metrics().register(registry)?;
    feed_store::StoreMetrics::register(registry)
}

/// `GET /metrics` in the Prometheus text format
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}

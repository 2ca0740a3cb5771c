use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    pub http_requests_total: IntCounter,
    pub http_request_errors_total: IntCounter,
    pub mods_created_total: IntCounter,
    pub mods_updated_total: IntCounter,
    pub mods_deleted_total: IntCounter,
    pub store_errors_total: IntCounter,
    pub requests_in_flight: IntGauge,
    pub http_request_duration_seconds: Histogram,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Arc::new(Registry::new());

        let http_requests_total = IntCounter::new("http_requests_total", "API requests handled")?;
        let http_request_errors_total = IntCounter::new("http_request_errors_total", "API requests answered with a 4xx or 5xx status")?;
        let mods_created_total = IntCounter::new("mods_created_total", "Mods created by upsert")?;
        let mods_updated_total = IntCounter::new("mods_updated_total", "Mods updated by upsert")?;
        let mods_deleted_total = IntCounter::new("mods_deleted_total", "Mods deleted")?;
        let store_errors_total = IntCounter::new("store_errors_total", "Store failures other than not-found")?;
        let requests_in_flight = IntGauge::new("requests_in_flight", "API requests currently being handled")?;
        let http_request_duration_seconds = Histogram::with_opts(
            HistogramOpts::new("http_request_duration_seconds", "API request duration in seconds")
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_errors_total.clone()))?;
        registry.register(Box::new(mods_created_total.clone()))?;
        registry.register(Box::new(mods_updated_total.clone()))?;
        registry.register(Box::new(mods_deleted_total.clone()))?;
        registry.register(Box::new(store_errors_total.clone()))?;
        registry.register(Box::new(requests_in_flight.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_errors_total,
            mods_created_total,
            mods_updated_total,
            mods_deleted_total,
            store_errors_total,
            requests_in_flight,
            http_request_duration_seconds,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        encoder.encode(&metric_families, &mut buffer).unwrap_or(());
        buffer
    }
}

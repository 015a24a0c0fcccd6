use prometheus::{Encoder, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub proxy_requests_total: IntCounterVec,
    pub proxy_request_latency_seconds: HistogramVec,
    pub rider_enrichment_failures_total: IntCounter,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let proxy_requests_total = IntCounterVec::new(
            Opts::new("proxy_requests_total", "Proxy requests by action and outcome"),
            &["action", "outcome"],
        )
        .expect("valid proxy_requests_total metric");

        let proxy_request_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "proxy_request_latency_seconds",
                "Latency of proxy requests in seconds",
            ),
            &["action"],
        )
        .expect("valid proxy_request_latency_seconds metric");

        let rider_enrichment_failures_total = IntCounter::new(
            "rider_enrichment_failures_total",
            "Rider lookups that failed and were skipped",
        )
        .expect("valid rider_enrichment_failures_total metric");

        registry
            .register(Box::new(proxy_requests_total.clone()))
            .expect("register proxy_requests_total");
        registry
            .register(Box::new(proxy_request_latency_seconds.clone()))
            .expect("register proxy_request_latency_seconds");
        registry
            .register(Box::new(rider_enrichment_failures_total.clone()))
            .expect("register rider_enrichment_failures_total");

        Self {
            registry,
            proxy_requests_total,
            proxy_request_latency_seconds,
            rider_enrichment_failures_total,
        }
    }

    pub fn observe_request(&self, action: &str, outcome: &str, elapsed_secs: f64) {
        self.proxy_requests_total
            .with_label_values(&[action, outcome])
            .inc();
        self.proxy_request_latency_seconds
            .with_label_values(&[action])
            .observe(elapsed_secs);
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

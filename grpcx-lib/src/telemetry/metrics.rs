use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram, Meter};
use opentelemetry::KeyValue;
use std::sync::Arc;

pub mod labels {
    pub const METHOD: &str = "method";
    pub const CODE: &str = "code";
    pub const KIND: &str = "kind";
    pub const STRATEGY: &str = "strategy";
    pub const MODE: &str = "mode";
}

pub mod values {
    pub const KIND_UNARY: &str = "unary";
    pub const KIND_STREAM: &str = "stream";
}

/// Instruments recorded by the standard interceptors.
#[derive(Clone)]
pub struct Metrics {
    pub requests_total: Counter<u64>,
    pub request_duration_seconds: Histogram<f64>,

    pub panics_recovered_total: Counter<u64>,

    pub rate_limit_allowed_total: Counter<u64>,
    pub rate_limit_rejected_total: Counter<u64>,

    pub ip_filter_allowed_total: Counter<u64>,
    pub ip_filter_denied_total: Counter<u64>,
}

impl Metrics {
    pub fn new(meter: Meter) -> Self {
        Self {
            requests_total: meter
                .u64_counter("grpcx_requests_total")
                .with_description("Total number of calls handled, by method and status code")
                .build(),
            request_duration_seconds: meter
                .f64_histogram("grpcx_request_duration_seconds")
                .with_description("Call duration in seconds")
                .with_unit("s")
                .build(),
            panics_recovered_total: meter
                .u64_counter("grpcx_panics_recovered_total")
                .with_description("Total number of handler panics converted to Internal")
                .build(),
            rate_limit_allowed_total: meter
                .u64_counter("grpcx_rate_limit_allowed_total")
                .with_description("Total number of calls allowed by the rate limiter")
                .build(),
            rate_limit_rejected_total: meter
                .u64_counter("grpcx_rate_limit_rejected_total")
                .with_description("Total number of calls rejected by the rate limiter")
                .build(),
            ip_filter_allowed_total: meter
                .u64_counter("grpcx_ip_filter_allowed_total")
                .with_description("Total number of calls allowed by the IP filter")
                .build(),
            ip_filter_denied_total: meter
                .u64_counter("grpcx_ip_filter_denied_total")
                .with_description("Total number of calls denied by the IP filter")
                .build(),
        }
    }

    pub fn record_request(&self, kind: &str, method: &str, code: &str, duration: f64) {
        let attrs = [
            KeyValue::new(labels::KIND, kind.to_string()),
            KeyValue::new(labels::METHOD, method.to_string()),
            KeyValue::new(labels::CODE, code.to_string()),
        ];
        self.requests_total.add(1, &attrs);
        self.request_duration_seconds.record(duration, &attrs);
    }

    pub fn record_panic_recovered(&self, kind: &str, method: &str) {
        self.panics_recovered_total.add(
            1,
            &[
                KeyValue::new(labels::KIND, kind.to_string()),
                KeyValue::new(labels::METHOD, method.to_string()),
            ],
        );
    }

    pub fn record_rate_limit_allowed(&self, strategy: &str) {
        self.rate_limit_allowed_total
            .add(1, &[KeyValue::new(labels::STRATEGY, strategy.to_string())]);
    }

    pub fn record_rate_limit_rejection(&self, strategy: &str, method: &str) {
        self.rate_limit_rejected_total.add(
            1,
            &[
                KeyValue::new(labels::STRATEGY, strategy.to_string()),
                KeyValue::new(labels::METHOD, method.to_string()),
            ],
        );
    }

    pub fn record_ip_filter_allowed(&self, mode: &str) {
        self.ip_filter_allowed_total
            .add(1, &[KeyValue::new(labels::MODE, mode.to_string())]);
    }

    pub fn record_ip_filter_denied(&self, mode: &str) {
        self.ip_filter_denied_total
            .add(1, &[KeyValue::new(labels::MODE, mode.to_string())]);
    }
}

/// Instruments bound to the global meter provider.
///
/// Without an installed provider the global meter is a no-op, so this is safe
/// to call in tests and in processes that never export metrics.
pub fn init_metrics() -> Arc<Metrics> {
    Arc::new(Metrics::new(global::meter("grpcx")))
}

//! Prometheus metrics for the gateway.

use crate::backend::BackendError;
use axum::http::StatusCode;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use prometheus_client::encoding::{EncodeLabelSet, text::encode};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;
use std::sync::Arc;
use std::time::Duration;

/// Global metrics registry instance.
pub static METRICS: Lazy<Arc<MetricsCollector>> = Lazy::new(|| Arc::new(MetricsCollector::new()));

/// Labels for HTTP request metrics.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RequestLabels {
    /// Matched route template, e.g. `/sheets/{sheet_id}`.
    pub endpoint: String,
    /// HTTP status code of the response.
    pub status: String,
}

/// Labels for backend error metrics.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct BackendErrorLabels {
    /// Failure classification ("credentials", "transport", "status", "decode").
    pub kind: String,
}

/// Labels for request latency metrics.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct EndpointLabels {
    pub endpoint: String,
}

pub struct MetricsCollector {
    registry: RwLock<Registry>,

    /// Total HTTP requests by endpoint and status.
    pub http_requests_total: Family<RequestLabels, Counter>,

    /// Request latency in seconds by endpoint.
    pub http_request_duration_seconds: Family<EndpointLabels, Histogram>,

    /// Backend failures by kind.
    pub backend_errors_total: Family<BackendErrorLabels, Counter>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let http_requests_total = Family::<RequestLabels, Counter>::default();
        registry.register(
            "http_requests_total",
            "Total number of HTTP requests",
            http_requests_total.clone(),
        );

        let http_request_duration_seconds =
            Family::<EndpointLabels, Histogram>::new_with_constructor(|| {
                Histogram::new(exponential_buckets(0.01, 2.5, 10))
            });
        registry.register(
            "http_request_duration_seconds",
            "Request latency histogram in seconds",
            http_request_duration_seconds.clone(),
        );

        let backend_errors_total = Family::<BackendErrorLabels, Counter>::default();
        registry.register(
            "backend_errors_total",
            "Total number of spreadsheet backend failures by kind",
            backend_errors_total.clone(),
        );

        Self {
            registry: RwLock::new(registry),
            http_requests_total,
            http_request_duration_seconds,
            backend_errors_total,
        }
    }

    pub fn observe_request(&self, endpoint: &str, status: StatusCode, elapsed: Duration) {
        self.http_requests_total
            .get_or_create(&RequestLabels {
                endpoint: endpoint.to_string(),
                status: status.as_u16().to_string(),
            })
            .inc();
        self.http_request_duration_seconds
            .get_or_create(&EndpointLabels {
                endpoint: endpoint.to_string(),
            })
            .observe(elapsed.as_secs_f64());
    }

    pub fn record_backend_error(&self, error: &BackendError) {
        let kind = match error {
            BackendError::Credentials(_) => "credentials",
            BackendError::Transport(_) => "transport",
            BackendError::Status { .. } => "status",
            BackendError::Decode(_) => "decode",
        };
        self.backend_errors_total
            .get_or_create(&BackendErrorLabels {
                kind: kind.to_string(),
            })
            .inc();
    }

    /// Encodes the registry in the Prometheus text exposition format.
    pub fn encode(&self) -> String {
        let registry = self.registry.read();
        let mut buffer = String::new();
        if let Err(e) = encode(&mut buffer, &registry) {
            tracing::error!("failed to encode metrics: {}", e);
        }
        buffer
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

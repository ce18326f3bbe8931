//! Prometheus metrics for the idgen server.

use axum::http::Method;
use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;

/// Allocation operation label value.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum Operation {
    Next,
    Range,
}

/// Operation status for metrics.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum OperationStatus {
    Success,
    Error,
}

/// Labels for issued ID counts.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct IssuedLabels {
    pub operation: Operation,
}

/// Labels for allocation request counts.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RequestLabels {
    pub operation: Operation,
    pub status: OperationStatus,
}

/// Route label value. Paths outside the served routes collapse into
/// `Unmatched` so stray requests cannot grow label cardinality.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum Endpoint {
    Next,
    Range,
    Healthy,
    Ready,
    Metrics,
    Unmatched,
}

impl Endpoint {
    pub fn from_path(path: &str) -> Self {
        match path {
            "/next" => Endpoint::Next,
            "/range" => Endpoint::Range,
            "/-/healthy" => Endpoint::Healthy,
            "/-/ready" => Endpoint::Ready,
            "/metrics" => Endpoint::Metrics,
            _ => Endpoint::Unmatched,
        }
    }

    /// Whether the route hands out IDs.
    pub fn is_allocation(&self) -> bool {
        matches!(self, Endpoint::Next | Endpoint::Range)
    }
}

/// Labels for HTTP request latency.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct HttpLabels {
    pub method: HttpMethod,
    pub endpoint: Endpoint,
}

/// Labels for HTTP request metrics.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct HttpLabelsWithStatus {
    pub method: HttpMethod,
    pub endpoint: Endpoint,
    pub status: u16,
}

/// HTTP method label value. Every route is `GET`; anything else is rejected
/// by the router and counted as `Other`.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum HttpMethod {
    Get,
    Head,
    Other,
}

impl From<&Method> for HttpMethod {
    fn from(method: &Method) -> Self {
        match *method {
            Method::GET => HttpMethod::Get,
            Method::HEAD => HttpMethod::Head,
            _ => HttpMethod::Other,
        }
    }
}

fn latency_histogram() -> Histogram {
    // 0.5ms .. ~16s
    Histogram::new(exponential_buckets(0.0005, 2.0, 16))
}

/// Container for all Prometheus metrics.
pub struct Metrics {
    registry: Registry,

    /// Counter of IDs handed out, by operation.
    pub ids_issued_total: Family<IssuedLabels, Counter>,

    /// Counter of allocation requests by operation and status.
    pub id_requests_total: Family<RequestLabels, Counter>,

    /// Counter of HTTP requests.
    pub http_requests_total: Family<HttpLabelsWithStatus, Counter>,

    /// Histogram of HTTP request latency in seconds.
    pub http_request_duration_seconds: Family<HttpLabels, Histogram>,

    /// Number of HTTP requests currently being served.
    pub http_requests_in_flight: Gauge,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics registry with all metrics registered.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let ids_issued_total = Family::<IssuedLabels, Counter>::default();
        registry.register(
            "ids_issued_total",
            "Total number of IDs issued by operation",
            ids_issued_total.clone(),
        );

        let id_requests_total = Family::<RequestLabels, Counter>::default();
        registry.register(
            "id_requests_total",
            "Total number of allocation requests by operation and status",
            id_requests_total.clone(),
        );

        let http_requests_total = Family::<HttpLabelsWithStatus, Counter>::default();
        registry.register(
            "http_requests_total",
            "Total number of HTTP requests",
            http_requests_total.clone(),
        );

        let http_request_duration_seconds: Family<HttpLabels, Histogram> =
            Family::new_with_constructor(latency_histogram as fn() -> Histogram);
        registry.register(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
            http_request_duration_seconds.clone(),
        );

        let http_requests_in_flight = Gauge::default();
        registry.register(
            "http_requests_in_flight",
            "Number of HTTP requests currently being served",
            http_requests_in_flight.clone(),
        );

        Self {
            registry,
            ids_issued_total,
            id_requests_total,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
        }
    }

    /// Records the outcome of an allocation request.
    pub fn record_request(&self, operation: Operation, issued: Option<usize>) {
        let status = match issued {
            Some(count) => {
                self.ids_issued_total
                    .get_or_create(&IssuedLabels {
                        operation: operation.clone(),
                    })
                    .inc_by(count as u64);
                OperationStatus::Success
            }
            None => OperationStatus::Error,
        };
        self.id_requests_total
            .get_or_create(&RequestLabels { operation, status })
            .inc();
    }

    /// Encode all metrics to Prometheus text format.
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        prometheus_client::encoding::text::encode(&mut buffer, &self.registry)
            .expect("encoding metrics should not fail");
        buffer
    }
}

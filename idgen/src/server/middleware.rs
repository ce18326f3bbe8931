//! Tower middleware observing requests to the idgen routes.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use tower::{Layer, Service};

use super::metrics::{Endpoint, HttpLabels, HttpLabelsWithStatus, HttpMethod, Metrics};

/// Holds one slot of the in-flight gauge until the request finishes or is
/// dropped.
struct InFlight {
    metrics: Arc<Metrics>,
}

impl InFlight {
    fn enter(metrics: Arc<Metrics>) -> Self {
        metrics.http_requests_in_flight.inc();
        Self { metrics }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.metrics.http_requests_in_flight.dec();
    }
}

/// Layer classifying each request by [`Endpoint`], then counting, timing and
/// logging it.
#[derive(Clone)]
pub struct ObserveLayer {
    metrics: Arc<Metrics>,
}

impl ObserveLayer {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }
}

impl<S> Layer<S> for ObserveLayer {
    type Service = ObserveService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ObserveService {
            inner,
            metrics: self.metrics.clone(),
        }
    }
}

#[derive(Clone)]
pub struct ObserveService<S> {
    inner: S,
    metrics: Arc<Metrics>,
}

impl<S, ResBody> Service<Request<Body>> for ObserveService<S>
where
    S: Service<Request<Body>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ResBody: Send,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let method = HttpMethod::from(request.method());
        let endpoint = Endpoint::from_path(request.uri().path());
        let query = request.uri().query().map(str::to_owned);
        let metrics = self.metrics.clone();

        let in_flight = InFlight::enter(metrics.clone());
        let start = Instant::now();
        let future = self.inner.call(request);

        Box::pin(async move {
            let _in_flight = in_flight;
            let response = future.await?;
            let status = response.status().as_u16();
            let elapsed = start.elapsed();

            if endpoint.is_allocation() {
                tracing::debug!(
                    ?endpoint,
                    query = query.as_deref().unwrap_or("-"),
                    status,
                    duration_ms = elapsed.as_millis() as u64,
                    "allocation request served"
                );
            }

            metrics
                .http_requests_total
                .get_or_create(&HttpLabelsWithStatus {
                    method: method.clone(),
                    endpoint: endpoint.clone(),
                    status,
                })
                .inc();
            metrics
                .http_request_duration_seconds
                .get_or_create(&HttpLabels { method, endpoint })
                .observe(elapsed.as_secs_f64());

            Ok(response)
        })
    }
}

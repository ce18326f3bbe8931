//! HTTP route handlers for the idgen server.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};

use super::error::ApiError;
use super::metrics::{Metrics, Operation};
use super::request::RangeParams;
use super::response::{NextResponse, RangeResponse};
use crate::{Error, IdAllocator};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub allocator: Arc<dyn IdAllocator>,
    pub metrics: Arc<Metrics>,
}

/// Handle GET /next
pub async fn handle_next(State(state): State<AppState>) -> Result<Json<NextResponse>, ApiError> {
    match state.allocator.next_id().await {
        Ok(id) => {
            state.metrics.record_request(Operation::Next, Some(1));
            Ok(Json(NextResponse::success(id)))
        }
        Err(e) => {
            state.metrics.record_request(Operation::Next, None);
            Err(ApiError::from(e))
        }
    }
}

/// Handle GET /range
pub async fn handle_range(
    State(state): State<AppState>,
    params: Result<Query<RangeParams>, QueryRejection>,
) -> Result<Json<RangeResponse>, ApiError> {
    let Query(params) = params.map_err(|rejection| {
        ApiError::from(Error::InvalidInput(format!(
            "invalid count parameter: {}",
            rejection.body_text()
        )))
    })?;
    let count = params.count()?;

    match state.allocator.id_range(count).await {
        Ok(ids) => {
            state.metrics.record_request(Operation::Range, Some(ids.len()));
            Ok(Json(RangeResponse::success(ids)))
        }
        Err(e) => {
            state.metrics.record_request(Operation::Range, None);
            Err(ApiError::from(e))
        }
    }
}

/// Handle GET /-/healthy
pub async fn handle_healthy() -> &'static str {
    "OK"
}

/// Handle GET /-/ready
pub async fn handle_ready() -> &'static str {
    "OK"
}

/// Handle GET /metrics
pub async fn handle_metrics(State(state): State<AppState>) -> String {
    state.metrics.encode()
}

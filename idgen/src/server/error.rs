//! HTTP error types for the idgen server.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::Error;

/// Error wrapper for converting allocation errors to HTTP responses.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self.0 {
            Error::InvalidInput(_) => (StatusCode::BAD_REQUEST, "bad_data"),
            Error::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            Error::Encoding(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }

        let body = serde_json::json!({
            "status": "error",
            "errorType": error_type,
            "error": self.0.to_string()
        });

        (status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Error::InvalidInput("bad".to_string()), StatusCode::BAD_REQUEST)]
    #[case(Error::Storage("down".to_string()), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(Error::Encoding("corrupt".to_string()), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(Error::Internal("bug".to_string()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn should_map_error_to_status(#[case] err: Error, #[case] expected: StatusCode) {
        // when
        let response = ApiError(err).into_response();

        // then
        assert_eq!(response.status(), expected);
    }

    #[tokio::test]
    async fn should_report_storage_failure_as_internal_error_body() {
        // given
        let err = ApiError::from(Error::Storage("bucket unavailable".to_string()));

        // when
        let response = err.into_response();

        // then
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(body["errorType"], "internal");
        assert!(body["error"].as_str().unwrap().contains("bucket unavailable"));
    }
}

//! HTTP response types for the idgen server.

use serde::Serialize;

/// Response for `/next` requests.
#[derive(Debug, Serialize)]
pub struct NextResponse {
    /// Status of the response.
    pub status: String,
    /// The issued ID.
    pub id: u64,
}

impl NextResponse {
    /// Create a successful next response.
    pub fn success(id: u64) -> Self {
        Self {
            status: "success".to_string(),
            id,
        }
    }
}

/// Response for `/range` requests.
#[derive(Debug, Serialize)]
pub struct RangeResponse {
    /// Status of the response.
    pub status: String,
    /// The issued IDs, in increasing order.
    pub ids: Vec<u64>,
}

impl RangeResponse {
    /// Create a successful range response.
    pub fn success(ids: Vec<u64>) -> Self {
        Self {
            status: "success".to_string(),
            ids,
        }
    }
}

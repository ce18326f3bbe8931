//! HTTP request types for the idgen server.

use serde::Deserialize;

use crate::Error;

/// Largest range a single `/range` request may ask for.
pub const MAX_RANGE_COUNT: u64 = 100_000;

/// Query parameters for range requests.
#[derive(Debug, Deserialize)]
pub struct RangeParams {
    /// Number of IDs to return; 1 when absent.
    ///
    /// Signed so that negative values reach validation and are reported as
    /// such instead of as a parse failure.
    pub count: Option<i64>,
}

impl RangeParams {
    /// Validates the requested count.
    pub fn count(&self) -> Result<u64, Error> {
        let count = self.count.unwrap_or(1);

        match u64::try_from(count) {
            Ok(count) if (1..=MAX_RANGE_COUNT).contains(&count) => Ok(count),
            _ => Err(Error::InvalidInput(format!(
                "count must be between 1 and {}, got {}",
                MAX_RANGE_COUNT, count
            ))),
        }
    }
}

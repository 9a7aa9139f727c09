//! Request body decoding

use serde::Serialize;

use contracts::{blank_batch, Batch, Item};

use crate::error::GatewayError;

/// Accepted body shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyFormat {
    /// JSON array of arbitrary values, one item each
    Items,
    /// JSON array of integers; only the count matters
    Counts,
}

/// Decode a request body into a batch
///
/// # Errors
/// [`GatewayError::Decode`] carrying the JSON error message
pub fn decode_batch(body: &[u8], format: BodyFormat) -> Result<Batch, GatewayError> {
    match format {
        BodyFormat::Items => Ok(serde_json::from_slice::<Vec<Item>>(body)?),
        BodyFormat::Counts => {
            let counts: Vec<i64> = serde_json::from_slice(body)?;
            Ok(blank_batch(counts.len()))
        }
    }
}

//! Response types for the Places Nearby Search endpoint.
//!
//! Results are kept as raw JSON values so every field the service returns
//! survives to the export untouched; only `place_id` is interpreted.
//!
//! See: <https://developers.google.com/maps/documentation/places/web-service/search-nearby>

use serde::Deserialize;
use serde_json::Value;

/// Nearby Search response body.
#[derive(Debug, Deserialize)]
pub struct NearbySearchResponse {
    /// Status string from the service.
    ///
    /// Common values:
    /// - `"OK"` - Results were found
    /// - `"ZERO_RESULTS"` - The query succeeded but matched nothing
    /// - `"INVALID_REQUEST"` - A parameter was missing or the page token was
    ///   not yet valid
    /// - `"OVER_QUERY_LIMIT"` - Quota exceeded
    /// - `"REQUEST_DENIED"` - The key was rejected
    pub status: String,

    /// Human-readable detail accompanying a non-`OK` status.
    pub error_message: Option<String>,

    /// Place payloads for this page.
    pub results: Option<Vec<Value>>,

    /// Cursor for the following page, when one exists.
    pub next_page_token: Option<String>,
}

impl NearbySearchResponse {
    /// Check whether the status reports a successful query.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self.status.as_str(), "OK" | "ZERO_RESULTS")
    }
}

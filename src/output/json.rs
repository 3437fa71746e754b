//! JSON serialization for pipeline results.

use crate::result::ConnectivityResult;

/// Serialize a ConnectivityResult to a compact JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for
/// ConnectivityResult).
pub fn to_json(result: &ConnectivityResult) -> Result<String, serde_json::Error> {
    serde_json::to_string(result)
}

/// Serialize a ConnectivityResult to a pretty-printed JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for
/// ConnectivityResult).
pub fn to_json_pretty(result: &ConnectivityResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}

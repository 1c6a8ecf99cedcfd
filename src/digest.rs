//! Canonical JSON and content hashing
//!
//! Canonical JSON is compact (no incidental whitespace) with object keys in
//! lexicographic order at every depth. `serde_json::Map` is ordered, so
//! routing any value through `serde_json::Value` sorts struct fields too.

use crate::error::Result;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Serialize a value to canonical JSON (sorted keys, compact separators)
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let tree = serde_json::to_value(value)?;
    Ok(serde_json::to_string(&tree)?)
}

/// Lowercase hex SHA-256 of a UTF-8 string
pub fn sha256_hex(payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}

/// SHA-256 over the canonical JSON form of a value
pub fn content_hash<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(sha256_hex(&canonical_json(value)?))
}

/// Round to 6 decimal places for stable report output
pub(crate) fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

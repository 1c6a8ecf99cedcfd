//! Strict canonicalization of untrusted telemetry
//!
//! Turns raw JSON into typed values plus a deterministic content hash.
//! Fail-closed: the first violation aborts with a [`ReasonCode`] and no
//! partial value is returned. Nothing is defaulted or coerced.

use crate::digest::content_hash;
use crate::error::{AdaptiveError, ReasonCode, Result};
use crate::types::{CanonicalEvent, ContextHash, NodeSummaryEvent, ObservedEvent};
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Accepted date-time layouts for the part before the trailing `Z`
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Canonicalize a raw event mapping into an [`ObservedEvent`] + context hash
pub fn canonicalize_event(raw: &Value) -> Result<CanonicalEvent> {
    let map = require_object(raw)?;

    let source_layer = require_str(map, "source_layer")?.to_string();
    let event_type = require_str(map, "event_type")?.to_string();
    let severity = require_unit_float(map, "severity")?;
    let timestamp = require_timestamp(map, "timestamp")?.to_string();
    let correlation_id = require_str(map, "correlation_id")?.to_string();
    let meta = require_meta(map, "meta")?;
    let reason_id = optional_str(map, "reason_id")?;

    let event = ObservedEvent {
        source_layer,
        event_type,
        severity,
        timestamp,
        correlation_id,
        meta,
        reason_id,
    };
    let context_hash = ContextHash::from_hex(content_hash(&event)?);

    Ok(CanonicalEvent {
        event,
        context_hash,
    })
}

/// Canonicalize a raw cross-node summary into a [`NodeSummaryEvent`] + hash
///
/// `window_start < window_end` is not cross-checked.
pub fn canonicalize_node_summary(raw: &Value) -> Result<(NodeSummaryEvent, ContextHash)> {
    let map = require_object(raw)?;

    let node_id = require_str(map, "node_id")?.trim().to_string();
    let window_start = require_timestamp(map, "window_start")?.to_string();
    let window_end = require_timestamp(map, "window_end")?.to_string();
    let total_events = require_count(map, "total_events")?;
    let by_upstream_reason_id = require_reason_counter(map, "by_upstream_reason_id")?;

    let summary = NodeSummaryEvent {
        node_id,
        window_start,
        window_end,
        total_events,
        by_upstream_reason_id,
    };
    let hash = ContextHash::from_hex(content_hash(&summary)?);
    Ok((summary, hash))
}

/// True when `ts` is ISO-8601 (date or date-time) followed by a single `Z`
pub fn is_utc_timestamp(ts: &str) -> bool {
    let Some(body) = ts.strip_suffix('Z') else {
        return false;
    };
    if !has_iso_shape(body.as_bytes()) {
        return false;
    }
    DATETIME_FORMATS
        .iter()
        .any(|fmt| NaiveDateTime::parse_from_str(body, fmt).is_ok())
        || NaiveDate::parse_from_str(body, "%Y-%m-%d").is_ok()
}

/// Fixed-width `YYYY-MM-DD[(T| )HH:MM[:SS[.f+]]]` with seconds below 60
///
/// Checked before chrono, which accepts padded, signed and short fields.
fn has_iso_shape(body: &[u8]) -> bool {
    fn digits(b: &[u8]) -> bool {
        !b.is_empty() && b.iter().all(u8::is_ascii_digit)
    }

    if body.len() < 10
        || !digits(&body[0..4])
        || body[4] != b'-'
        || !digits(&body[5..7])
        || body[7] != b'-'
        || !digits(&body[8..10])
    {
        return false;
    }
    let rest = &body[10..];
    let Some((&sep, time)) = rest.split_first() else {
        return true;
    };
    if (sep != b'T' && sep != b' ')
        || time.len() < 5
        || !digits(&time[0..2])
        || time[2] != b':'
        || !digits(&time[3..5])
    {
        return false;
    }
    let rest = &time[5..];
    if rest.is_empty() {
        return true;
    }
    if rest.len() < 3 || rest[0] != b':' || !digits(&rest[1..3]) || rest[1] > b'5' {
        return false;
    }
    match &rest[3..] {
        [] => true,
        [b'.', frac @ ..] => digits(frac),
        _ => false,
    }
}

fn require_object(raw: &Value) -> Result<&Map<String, Value>> {
    raw.as_object().ok_or_else(|| {
        AdaptiveError::validation(ReasonCode::InvalidEvent, "raw input must be a JSON object")
    })
}

fn require_present<'a>(map: &'a Map<String, Value>, key: &str) -> Result<&'a Value> {
    map.get(key).ok_or_else(|| {
        AdaptiveError::validation(ReasonCode::MissingField, format!("missing '{}'", key))
    })
}

fn require_str<'a>(map: &'a Map<String, Value>, key: &str) -> Result<&'a str> {
    match require_present(map, key)? {
        Value::String(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(AdaptiveError::validation(
            ReasonCode::TypeInvalid,
            format!("'{}' must be a non-empty string", key),
        )),
    }
}

fn optional_str(map: &Map<String, Value>, key: &str) -> Result<Option<String>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(Some(s.clone())),
        Some(_) => Err(AdaptiveError::validation(
            ReasonCode::TypeInvalid,
            format!("'{}' must be a non-empty string or absent", key),
        )),
    }
}

fn require_unit_float(map: &Map<String, Value>, key: &str) -> Result<f64> {
    let value = require_present(map, key)?
        .as_f64()
        .ok_or_else(|| {
            AdaptiveError::validation(ReasonCode::TypeInvalid, format!("'{}' must be a number", key))
        })?;
    if !(0.0..=1.0).contains(&value) {
        return Err(AdaptiveError::validation(
            ReasonCode::NonCanonical,
            format!("'{}' must be in [0.0, 1.0], got {}", key, value),
        ));
    }
    Ok(value)
}

fn require_timestamp<'a>(map: &'a Map<String, Value>, key: &str) -> Result<&'a str> {
    let ts = require_str(map, key)?;
    if !ts.ends_with('Z') {
        return Err(AdaptiveError::validation(
            ReasonCode::TimestampInvalid,
            format!("'{}' must end with 'Z'", key),
        ));
    }
    if !is_utc_timestamp(ts) {
        return Err(AdaptiveError::validation(
            ReasonCode::TimestampInvalid,
            format!("'{}' is not a valid ISO-8601 timestamp", key),
        ));
    }
    Ok(ts)
}

fn require_meta(map: &Map<String, Value>, key: &str) -> Result<BTreeMap<String, Value>> {
    match require_present(map, key)? {
        Value::Object(meta) => Ok(meta.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
        _ => Err(AdaptiveError::validation(
            ReasonCode::MetaInvalid,
            format!("'{}' must be a string-keyed object", key),
        )),
    }
}

/// Non-negative JSON integer; booleans are rejected, never coerced
fn parse_count(value: &Value, what: &str) -> Result<u64> {
    match value {
        Value::Number(n) => {
            if let Some(count) = n.as_u64() {
                Ok(count)
            } else if n.as_i64().is_some() || n.as_f64().is_some_and(|f| f < 0.0) {
                Err(AdaptiveError::validation(
                    ReasonCode::NonCanonical,
                    format!("{} must be >= 0", what),
                ))
            } else {
                Err(AdaptiveError::validation(
                    ReasonCode::TypeInvalid,
                    format!("{} must be an integer", what),
                ))
            }
        }
        _ => Err(AdaptiveError::validation(
            ReasonCode::TypeInvalid,
            format!("{} must be an integer", what),
        )),
    }
}

fn require_count(map: &Map<String, Value>, key: &str) -> Result<u64> {
    parse_count(require_present(map, key)?, &format!("'{}'", key))
}

fn require_reason_counter(map: &Map<String, Value>, key: &str) -> Result<BTreeMap<String, u64>> {
    let Value::Object(raw) = require_present(map, key)? else {
        return Err(AdaptiveError::validation(
            ReasonCode::TypeInvalid,
            format!("'{}' must be an object", key),
        ));
    };

    let mut counter = BTreeMap::new();
    for (reason_id, count) in raw {
        let reason_id = reason_id.trim();
        if reason_id.is_empty() {
            return Err(AdaptiveError::validation(
                ReasonCode::TypeInvalid,
                "reason_id key must be a non-empty string",
            ));
        }
        let count = parse_count(count, "reason_id count")?;
        counter.insert(reason_id.to_string(), count);
    }
    Ok(counter)
}

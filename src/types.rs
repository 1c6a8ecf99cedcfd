//! Core evidence types for the a3s-adaptive system
//!
//! All types use snake_case JSON keys; the canonical form of each type is
//! what gets hashed, so field names here are part of the wire contract.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single strictly-validated observation emitted by a security layer
///
/// Only [`crate::canonicalize::canonicalize_event`] builds these from
/// untrusted input; severity and timestamp shape are checked there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedEvent {
    /// Layer that emitted the event (e.g., "sentinel_ai_v3", "dqsn")
    pub source_layer: String,

    /// Event type identifier (e.g., "reject", "block_stall")
    pub event_type: String,

    /// Advisory severity in [0.0, 1.0]
    pub severity: f64,

    /// ISO-8601 timestamp with trailing `Z`
    pub timestamp: String,

    /// Correlation identifier shared across layers
    pub correlation_id: String,

    /// Arbitrary JSON metadata; ordered so hashing is key-order independent
    pub meta: BTreeMap<String, serde_json::Value>,

    /// Upstream reason code, omitted from the canonical form when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_id: Option<String>,
}

/// Pre-aggregated counters reported by one node for one window
///
/// Aggregated counts only; no raw per-event data crosses nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSummaryEvent {
    /// Pseudonymous node identifier
    pub node_id: String,

    /// Window start, ISO-8601 with trailing `Z`
    pub window_start: String,

    /// Window end, ISO-8601 with trailing `Z`
    pub window_end: String,

    /// Total events the node observed in the window
    pub total_events: u64,

    /// Per-reason event counts
    pub by_upstream_reason_id: BTreeMap<String, u64>,
}

/// SHA-256 (lowercase hex) over a value's canonical JSON form
///
/// Purely derived; carries no identity of its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextHash(String);

impl ContextHash {
    pub(crate) fn from_hex(hex: String) -> Self {
        Self(hex)
    }

    /// The hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContextHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A canonicalized event together with its content hash
///
/// This is the unit admitted into an [`crate::window::EvidenceWindow`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEvent {
    /// The validated event
    pub event: ObservedEvent,

    /// Hash of `event`'s canonical JSON
    pub context_hash: ContextHash,
}

/// Explicit assumptions a layer makes about its inputs
///
/// Supplied in-process by the caller; never persisted here.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LayerContract {
    /// Layer name
    pub layer: String,

    /// Assumption key → declared value
    pub assumptions: BTreeMap<String, String>,
}

impl LayerContract {
    /// Create a contract with no assumptions
    pub fn new(layer: impl Into<String>) -> Self {
        Self {
            layer: layer.into(),
            assumptions: BTreeMap::new(),
        }
    }

    /// Add an assumption
    pub fn with_assumption(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.assumptions.insert(key.into(), value.into());
        self
    }
}

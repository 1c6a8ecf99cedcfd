//! Bounded evidence window with live counters
//!
//! The window is a FIFO of canonical events capped at `capacity`. Three
//! counter maps are maintained incrementally and always equal the exact
//! aggregate of the events currently retained; a key is removed as soon as
//! its count reaches zero.
//!
//! `add` evicts and then inserts without any internal locking. Hosts that
//! share a window must serialize writers behind one exclusive lock (see
//! [`crate::sink::WindowSink`]).

use crate::config::AdaptiveConfig;
use crate::error::{AdaptiveError, Result};
use crate::types::CanonicalEvent;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Default number of events retained by a window
pub const DEFAULT_WINDOW_CAPACITY: usize = 1000;

/// Point-in-time copy of the window counters
///
/// Computed on demand by [`EvidenceWindow::snapshot`]; never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceSnapshot {
    /// Number of events currently retained
    pub total_events: u64,

    /// Counts per source layer
    pub by_source_layer: BTreeMap<String, u64>,

    /// Counts per event type
    pub by_event_type: BTreeMap<String, u64>,

    /// Counts per upstream reason id (events without one are not counted)
    pub by_upstream_reason_id: BTreeMap<String, u64>,
}

impl EvidenceSnapshot {
    /// Largest single-reason count, if any reason was observed
    pub fn max_reason_count(&self) -> Option<u64> {
        self.by_upstream_reason_id.values().copied().max()
    }
}

/// Deterministic hot window of canonical events
#[derive(Debug, Clone)]
pub struct EvidenceWindow {
    capacity: usize,
    events: VecDeque<CanonicalEvent>,
    by_source_layer: BTreeMap<String, u64>,
    by_event_type: BTreeMap<String, u64>,
    by_upstream_reason_id: BTreeMap<String, u64>,
}

impl EvidenceWindow {
    /// Create a window holding at most `capacity` events
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(AdaptiveError::Config(
                "Evidence window capacity must be > 0".to_string(),
            ));
        }
        Ok(Self {
            capacity,
            events: VecDeque::with_capacity(capacity.min(DEFAULT_WINDOW_CAPACITY)),
            by_source_layer: BTreeMap::new(),
            by_event_type: BTreeMap::new(),
            by_upstream_reason_id: BTreeMap::new(),
        })
    }

    /// Create a window sized by `config.window_capacity`
    ///
    /// The whole config is validated first.
    pub fn from_config(config: &AdaptiveConfig) -> Result<Self> {
        config.validate()?;
        Self::new(config.window_capacity)
    }

    /// Maximum number of retained events
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of retained events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when no events are retained
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Admit an event, evicting the oldest one first when full
    ///
    /// The evicted event's contribution is removed from every counter
    /// before the new event is counted. Returns the evicted event.
    pub fn add(&mut self, item: CanonicalEvent) -> Option<CanonicalEvent> {
        let evicted = if self.events.len() >= self.capacity {
            self.events.pop_front()
        } else {
            None
        };

        if let Some(old) = &evicted {
            self.decrement(old);
            tracing::debug!(
                context_hash = %old.context_hash,
                source_layer = %old.event.source_layer,
                "Evicted oldest event from evidence window"
            );
        }

        self.increment(&item);
        self.events.push_back(item);
        evicted
    }

    /// Current counters as an independent snapshot
    pub fn snapshot(&self) -> EvidenceSnapshot {
        EvidenceSnapshot {
            total_events: self.events.len() as u64,
            by_source_layer: self.by_source_layer.clone(),
            by_event_type: self.by_event_type.clone(),
            by_upstream_reason_id: self.by_upstream_reason_id.clone(),
        }
    }

    /// Retained events oldest → newest, as an independent copy
    pub fn iter_window(&self) -> Vec<CanonicalEvent> {
        self.events.iter().cloned().collect()
    }

    fn increment(&mut self, item: &CanonicalEvent) {
        let ev = &item.event;
        bump(&mut self.by_source_layer, &ev.source_layer);
        bump(&mut self.by_event_type, &ev.event_type);
        if let Some(reason_id) = &ev.reason_id {
            bump(&mut self.by_upstream_reason_id, reason_id);
        }
    }

    fn decrement(&mut self, item: &CanonicalEvent) {
        let ev = &item.event;
        drop_one(&mut self.by_source_layer, &ev.source_layer);
        drop_one(&mut self.by_event_type, &ev.event_type);
        if let Some(reason_id) = &ev.reason_id {
            drop_one(&mut self.by_upstream_reason_id, reason_id);
        }
    }
}

impl Default for EvidenceWindow {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_WINDOW_CAPACITY,
            events: VecDeque::new(),
            by_source_layer: BTreeMap::new(),
            by_event_type: BTreeMap::new(),
            by_upstream_reason_id: BTreeMap::new(),
        }
    }
}

fn bump(counter: &mut BTreeMap<String, u64>, key: &str) {
    *counter.entry(key.to_string()).or_insert(0) += 1;
}

/// Decrement `key`, removing it once it reaches zero
fn drop_one(counter: &mut BTreeMap<String, u64>, key: &str) {
    if let Some(count) = counter.get_mut(key) {
        *count = count.saturating_sub(1);
        if *count == 0 {
            counter.remove(key);
        }
    }
}

//! Event sinks: where canonical events go after validation
//!
//! Layers hand raw payloads to an [`EvidenceWriter`], which canonicalizes
//! them and forwards the result to whichever [`EventSink`] it was built
//! with. There is no global sink registry; the sink is chosen at
//! construction time.

use crate::canonicalize::canonicalize_event;
use crate::config::AdaptiveConfig;
use crate::error::Result;
use crate::types::CanonicalEvent;
use crate::window::{EvidenceSnapshot, EvidenceWindow};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Destination for canonical events
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Store one event
    async fn store(&self, event: CanonicalEvent) -> Result<()>;

    /// Sink name (e.g., "memory", "window")
    fn name(&self) -> &str;
}

/// Keeps every stored event in arrival order
///
/// Unbounded; intended for tests and local simulation.
#[derive(Default)]
pub struct MemoryEventSink {
    events: Arc<RwLock<Vec<CanonicalEvent>>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all stored events, oldest first
    pub async fn events(&self) -> Vec<CanonicalEvent> {
        self.events.read().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.events.read().await.len()
    }
}

#[async_trait]
impl EventSink for MemoryEventSink {
    async fn store(&self, event: CanonicalEvent) -> Result<()> {
        self.events.write().await.push(event);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Feeds events into an [`EvidenceWindow`]
///
/// `EvidenceWindow::add` is a non-atomic evict-then-insert, so all writers
/// go through one exclusive lock.
pub struct WindowSink {
    window: Mutex<EvidenceWindow>,
}

impl WindowSink {
    /// Create a sink over a new window of the given capacity
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self::from_window(EvidenceWindow::new(capacity)?))
    }

    /// Create a sink over a window sized by `config`
    pub fn from_config(config: &AdaptiveConfig) -> Result<Self> {
        Ok(Self::from_window(EvidenceWindow::from_config(config)?))
    }

    /// Wrap an existing window
    pub fn from_window(window: EvidenceWindow) -> Self {
        Self {
            window: Mutex::new(window),
        }
    }

    /// Counters over the events currently held
    pub async fn snapshot(&self) -> EvidenceSnapshot {
        self.window.lock().await.snapshot()
    }

    pub async fn len(&self) -> usize {
        self.window.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.window.lock().await.is_empty()
    }
}

#[async_trait]
impl EventSink for WindowSink {
    async fn store(&self, event: CanonicalEvent) -> Result<()> {
        let mut window = self.window.lock().await;
        window.add(event);
        Ok(())
    }

    fn name(&self) -> &str {
        "window"
    }
}

/// Canonicalizes payloads and forwards them to a sink
pub struct EvidenceWriter {
    sink: Arc<dyn EventSink>,
}

impl EvidenceWriter {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    /// The configured sink
    pub fn sink(&self) -> &Arc<dyn EventSink> {
        &self.sink
    }

    /// Validate a raw payload, store it and return the canonical event
    ///
    /// Invalid payloads are rejected before reaching the sink.
    pub async fn write_raw(&self, raw: &Value) -> Result<CanonicalEvent> {
        let event = canonicalize_event(raw)?;
        self.write(event.clone()).await?;
        Ok(event)
    }

    /// Store an already-canonical event
    pub async fn write(&self, event: CanonicalEvent) -> Result<()> {
        tracing::debug!(
            sink = self.sink.name(),
            context_hash = %event.context_hash,
            "Storing evidence"
        );
        self.sink.store(event).await
    }
}

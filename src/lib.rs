//! # a3s-adaptive
//!
//! Deterministic evidence windows and guardrail-gated advisory reports for
//! multi-layer security telemetry.
//!
//! ## Overview
//!
//! `a3s-adaptive` turns untrusted anomaly events from independent security
//! layers into strictly validated, content-addressed evidence, then
//! synthesizes reproducible upgrade reports. It never acts on its own
//! findings; every output is advisory and cites the guardrails it invokes.
//!
//! ## Quick Start
//!
//! ```rust
//! use a3s_adaptive::{canonicalize_event, run_pipeline, EvidenceWindow, ReportRequest};
//!
//! # fn example() -> a3s_adaptive::Result<()> {
//! let mut window = EvidenceWindow::new(1000)?;
//!
//! // Validate a raw event and admit it into the window
//! let event = canonicalize_event(&serde_json::json!({
//!     "source_layer": "dqsn",
//!     "event_type": "reject",
//!     "severity": 0.4,
//!     "timestamp": "2026-01-14T00:00:00Z",
//!     "correlation_id": "c-1",
//!     "meta": {},
//!     "reason_id": "SIG_INVALID",
//! }))?;
//! window.add(event);
//!
//! // Build, render and hash a report from the window counters
//! let request = ReportRequest::new("r-1", ["dqsn"], window.snapshot());
//! let output = run_pipeline(&request)?;
//!
//! println!("{} {}", output.report.report_type, output.envelope.report_hash());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **canonicalize**: strict validation + SHA-256 context hash
//! - **EvidenceWindow**: bounded FIFO with incrementally maintained counters
//! - **findings**: spike, contract drift and cross-node correlation detectors
//! - **GuardrailRegistry**: compiled-in governance catalog, fail-closed lookups
//! - **ReportBuilder**: merges findings, scores confidence, renders JSON + markdown
//! - **ReportEnvelope**: content hash plus declared signature status
//! - **EventSink** trait: pluggable destinations for canonical events

pub mod canonicalize;
pub mod confidence;
pub mod config;
pub mod digest;
pub mod envelope;
pub mod error;
pub mod findings;
pub mod guardrails;
pub mod packet_store;
pub mod pipeline;
pub mod report;
pub mod sink;
pub mod types;
pub mod window;

// Re-export core types
pub use canonicalize::{canonicalize_event, canonicalize_node_summary};
pub use confidence::{compute_confidence, ConfidenceSignals};
pub use config::{AdaptiveConfig, AnalyzeConfig, ConfidenceWeights, CorrelationConfig, ReportConfig};
pub use envelope::{ReportEnvelope, SignatureStatus};
pub use error::{AdaptiveError, ReasonCode, Result};
pub use findings::{
    aggregate_node_summaries, detect_contract_drift, generate_correlation_findings,
    generate_findings, CorrelationSnapshot, Finding,
};
pub use guardrails::{Guardrail, GuardrailId, GuardrailRegistry};
pub use packet_store::{PacketStore, ThreatPacket};
pub use pipeline::{run_pipeline, Pipeline, PipelineOutput};
pub use report::{
    render_report_json, render_report_markdown, Capabilities, EvidenceSummary, Presence,
    ReportBuilder, ReportRequest, ReportType, Toggle, UpgradeReport,
};
pub use sink::{EventSink, EvidenceWriter, MemoryEventSink, WindowSink};
pub use types::{CanonicalEvent, ContextHash, LayerContract, NodeSummaryEvent, ObservedEvent};
pub use window::{EvidenceSnapshot, EvidenceWindow};

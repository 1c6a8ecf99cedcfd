//! Advisory report model, builder and renderers
//!
//! A report is assembled once per build from an evidence snapshot and the
//! optional drift and correlation inputs. It is an immutable value; the
//! renderers turn it into byte-stable JSON and markdown.

use crate::findings::{CorrelationSnapshot, Finding};
use crate::guardrails::GuardrailId;
use crate::types::LayerContract;
use crate::window::EvidenceSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

mod builder;
pub mod graph;
pub mod render;

pub use builder::ReportBuilder;
pub use graph::render_drift_dot;
pub use render::{render_report_json, render_report_markdown};

/// Threshold below which a build only emits a signal collection notice
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.60;

/// Kind of report a build produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportType {
    /// Confidence met the threshold; escalated actions apply
    UpgradeReport,
    /// Not enough evidence; collect more before acting
    SignalCollectionNotice,
}

impl ReportType {
    /// Wire name, as serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpgradeReport => "UPGRADE_REPORT",
            Self::SignalCollectionNotice => "SIGNAL_COLLECTION_NOTICE",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a component is deployed at all
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Presence {
    /// Not deployed
    #[default]
    Absent,
    /// Deployed
    Present,
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Absent => "ABSENT",
            Self::Present => "PRESENT",
        })
    }
}

/// Whether an optional feature is switched on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Toggle {
    /// Disabled
    #[default]
    Off,
    /// Enabled
    On,
}

impl fmt::Display for Toggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Off => "OFF",
            Self::On => "ON",
        })
    }
}

/// Deployment capabilities echoed into every report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Report envelope (hash + signature status) deployment
    pub envelope: Presence,
    /// Cross-node correlation
    pub correlation: Toggle,
    /// Long-term report archival
    pub archival: Toggle,
    /// Outbound telemetry export
    pub telemetry: Toggle,
}

/// Counters a report was built from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceSummary {
    /// Events in the window snapshot
    pub total_events: u64,
    /// Event count per source layer
    pub by_source_layer: BTreeMap<String, u64>,
    /// Event count per event type
    pub by_event_type: BTreeMap<String, u64>,
    /// Event count per upstream reason id
    pub by_upstream_reason_id: BTreeMap<String, u64>,

    /// Number of layer contracts supplied for drift detection
    pub drift_contracts_provided: u64,
    /// Drift findings in this report
    pub drift_findings: u64,
    /// Correlation findings in this report
    pub correlation_findings: u64,
}

/// Deterministic advisory report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeReport {
    /// Caller-supplied identifier
    pub report_id: String,
    /// Upgrade report or signal collection notice
    pub report_type: ReportType,

    /// Sorted copy of the requested layers
    pub target_layers: Vec<String>,

    /// Counters the report was built from
    pub evidence: EvidenceSummary,

    /// All findings, sorted by `finding_id`
    pub findings: Vec<Finding>,

    /// Union of cited guardrails, sorted
    pub guardrails: Vec<GuardrailId>,
    /// Catalog title per cited guardrail, keyed by id
    pub guardrail_titles: BTreeMap<String, String>,

    /// Score rounded to 6 decimals
    pub confidence: f64,
    /// Each confidence signal, rounded to 6 decimals
    pub confidence_breakdown: BTreeMap<String, f64>,

    /// Capabilities echoed from the request
    pub capabilities: Capabilities,

    /// DOT source for the drift graph, when requested and drift exists
    pub drift_dot: Option<String>,

    /// Advisory next steps for operators
    pub recommended_actions: Vec<String>,
    /// Tests that must exist before any change ships
    pub required_tests: Vec<String>,
    /// Conditions that close the report
    pub exit_criteria: Vec<String>,
    /// Actions the report never authorizes
    pub forbidden_actions: Vec<String>,
}

impl UpgradeReport {
    /// True when confidence met the threshold
    pub fn is_upgrade(&self) -> bool {
        self.report_type == ReportType::UpgradeReport
    }
}

/// Inputs for one report build
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    /// Identifier copied into the report
    pub report_id: String,
    /// Layers the report is about; must be non-empty
    pub target_layers: Vec<String>,
    /// Window counters to analyze
    pub snapshot: EvidenceSnapshot,
    /// Deployment capabilities to echo
    pub capabilities: Capabilities,
    /// Minimum confidence for an upgrade report, within [0, 1]
    pub confidence_threshold: f64,

    /// Layer contracts for drift detection; `None` skips the detector
    pub drift_contracts: Option<Vec<LayerContract>>,

    /// Fleet aggregate for correlation; `None` skips the detector
    pub correlation: Option<CorrelationSnapshot>,

    /// Attach a DOT drift graph when drift findings exist
    pub include_drift_graph: bool,
}

impl ReportRequest {
    /// Request with default capabilities and threshold and no optional inputs
    pub fn new<I, S>(report_id: impl Into<String>, target_layers: I, snapshot: EvidenceSnapshot) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            report_id: report_id.into(),
            target_layers: target_layers.into_iter().map(Into::into).collect(),
            snapshot,
            capabilities: Capabilities::default(),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            drift_contracts: None,
            correlation: None,
            include_drift_graph: false,
        }
    }

    /// Set the deployment capabilities
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Override the upgrade threshold
    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Enable drift detection over these contracts
    pub fn with_drift_contracts(mut self, contracts: Vec<LayerContract>) -> Self {
        self.drift_contracts = Some(contracts);
        self
    }

    /// Enable correlation over this fleet aggregate
    pub fn with_correlation(mut self, snapshot: CorrelationSnapshot) -> Self {
        self.correlation = Some(snapshot);
        self
    }

    /// Render a DOT graph of drift findings into the report
    pub fn with_drift_graph(mut self, include: bool) -> Self {
        self.include_drift_graph = include;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enums_serialize_screaming() {
        assert_eq!(
            serde_json::to_string(&ReportType::SignalCollectionNotice).unwrap(),
            "\"SIGNAL_COLLECTION_NOTICE\""
        );
        let caps = Capabilities {
            envelope: Presence::Present,
            correlation: Toggle::On,
            ..Default::default()
        };
        let json = serde_json::to_value(caps).unwrap();
        assert_eq!(json["envelope"], "PRESENT");
        assert_eq!(json["correlation"], "ON");
        assert_eq!(json["archival"], "OFF");
        assert_eq!(Presence::Absent.to_string(), "ABSENT");
        assert_eq!(Toggle::On.to_string(), "ON");
    }

    #[test]
    fn test_request_defaults() {
        let req = ReportRequest::new("r-1", ["dqsn"], EvidenceSnapshot::default());
        assert_eq!(req.target_layers, vec!["dqsn".to_string()]);
        assert_eq!(req.confidence_threshold, DEFAULT_CONFIDENCE_THRESHOLD);
        assert_eq!(req.capabilities, Capabilities::default());
        assert!(req.drift_contracts.is_none());
        assert!(req.correlation.is_none());
        assert!(!req.include_drift_graph);
    }
}

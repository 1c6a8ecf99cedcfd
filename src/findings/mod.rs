//! Deterministic finding generators
//!
//! Each generator is a pure function of its inputs and emits findings in
//! ascending key order. Findings are advisory only; the report builder
//! merges them and validates their guardrail references.

use crate::guardrails::GuardrailId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub mod correlation;
pub mod drift;
pub mod spike;

pub use correlation::{aggregate_node_summaries, generate_correlation_findings, CorrelationSnapshot};
pub use drift::detect_contract_drift;
pub use spike::generate_findings;

/// One advisory observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Unique per detector + key, e.g. `AC-DRIFT::meta.canonical`
    pub finding_id: String,

    /// Human-readable summary
    pub title: String,

    /// Advisory severity in [0.0, 1.0]
    pub severity: f64,

    /// Detector-specific evidence
    pub evidence: BTreeMap<String, Value>,

    /// Guardrails this finding invokes
    pub guardrails: Vec<GuardrailId>,
}

impl Finding {
    /// True when the evidence names an upstream reason id
    pub fn cites_reason_id(&self) -> bool {
        self.evidence.contains_key("reason_id")
    }

    /// True for contract-drift findings
    pub fn is_drift(&self) -> bool {
        self.finding_id.starts_with(drift::DRIFT_PREFIX)
    }
}

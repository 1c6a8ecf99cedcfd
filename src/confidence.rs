//! Confidence scoring
//!
//! Four bounded signals are derived from the evidence snapshot and the merged
//! finding set, then combined as a weighted sum. The score decides whether a
//! build produces an upgrade report or only a signal collection notice.

use crate::config::ConfidenceWeights;
use crate::digest::round6;
use crate::findings::Finding;
use crate::window::EvidenceSnapshot;
use std::collections::BTreeMap;

/// Layer or drift count at which the cross-layer signal saturates
const CROSS_LAYER_SATURATION: f64 = 5.0;

/// Inputs to [`compute_confidence`], each in [0.0, 1.0]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConfidenceSignals {
    /// Share of the window held by the most frequent reason id
    pub recurrence_ratio: f64,

    /// Highest severity among all findings
    pub max_severity: f64,

    /// 1.0 when a finding cites a reason id, 0.5 for uncited findings only
    pub reproducibility: f64,

    /// Breadth of impact across layers
    pub cross_layer_impact: f64,
}

impl ConfidenceSignals {
    /// Derive the signals for one report build
    pub fn derive(
        snapshot: &EvidenceSnapshot,
        findings: &[Finding],
        drift_count: usize,
        target_layer_count: usize,
    ) -> Self {
        let total = snapshot.total_events.max(1) as f64;
        let recurrence_ratio = snapshot.max_reason_count().unwrap_or(0) as f64 / total;

        let max_severity = findings
            .iter()
            .map(|f| f.severity)
            .fold(0.0_f64, f64::max);

        let reproducibility = if findings.is_empty() {
            0.0
        } else if findings.iter().any(Finding::cites_reason_id) {
            1.0
        } else {
            0.5
        };

        let drift_signal = (drift_count as f64 / CROSS_LAYER_SATURATION).min(1.0);
        let layer_signal = (target_layer_count as f64 / CROSS_LAYER_SATURATION).min(1.0);

        Self {
            recurrence_ratio,
            max_severity,
            reproducibility,
            cross_layer_impact: drift_signal.max(layer_signal),
        }
    }

    /// Weighted score of these signals
    pub fn score(&self, weights: &ConfidenceWeights) -> f64 {
        compute_confidence(
            self.recurrence_ratio,
            self.max_severity,
            self.reproducibility,
            self.cross_layer_impact,
            weights,
        )
    }

    /// Per-signal values rounded to 6 decimals, keyed by signal name
    pub fn breakdown(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("cross_layer_impact".to_string(), round6(self.cross_layer_impact)),
            ("max_severity".to_string(), round6(self.max_severity)),
            ("recurrence_ratio".to_string(), round6(self.recurrence_ratio)),
            ("reproducibility".to_string(), round6(self.reproducibility)),
        ])
    }
}

/// Weighted confidence in [0.0, 1.0]
///
/// Every signal is clamped into [0.0, 1.0] first; a non-finite signal counts
/// as 0.0. The weighted sum is clamped again.
pub fn compute_confidence(
    recurrence_ratio: f64,
    max_severity: f64,
    reproducibility: f64,
    cross_layer_impact: f64,
    weights: &ConfidenceWeights,
) -> f64 {
    let score = weights.recurrence * clamp_unit(recurrence_ratio)
        + weights.severity * clamp_unit(max_severity)
        + weights.reproducibility * clamp_unit(reproducibility)
        + weights.cross_layer * clamp_unit(cross_layer_impact);
    clamp_unit(score)
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

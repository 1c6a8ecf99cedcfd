//! Upstream reason-id spike detection

use super::Finding;
use crate::config::AnalyzeConfig;
use crate::digest::round6;
use crate::guardrails::{AMG_001, AMG_014, AMG_051};
use crate::window::EvidenceSnapshot;
use serde_json::json;
use std::collections::BTreeMap;

pub const SPIKE_PREFIX: &str = "AC-FIND-REASON-SPIKE::";

/// Flag reason ids that recur often enough, both absolutely and relatively
///
/// A reason spikes when `count >= min_count` and `count / total >= min_ratio`.
/// An empty window yields no findings.
pub fn generate_findings(snapshot: &EvidenceSnapshot, cfg: &AnalyzeConfig) -> Vec<Finding> {
    let total = snapshot.total_events;
    if total == 0 {
        return Vec::new();
    }

    snapshot
        .by_upstream_reason_id
        .iter()
        .filter_map(|(reason_id, &count)| {
            let ratio = count as f64 / total as f64;
            if count < cfg.reason_spike_min_count || ratio < cfg.reason_spike_min_ratio {
                return None;
            }
            let evidence = BTreeMap::from([
                ("reason_id".to_string(), json!(reason_id)),
                ("count".to_string(), json!(count)),
                ("total_events".to_string(), json!(total)),
                ("ratio".to_string(), json!(round6(ratio))),
            ]);
            Some(Finding {
                finding_id: format!("{}{}", SPIKE_PREFIX, reason_id),
                title: format!("Repeated upstream reason_id spike: {}", reason_id),
                severity: (0.2 + ratio).min(1.0),
                evidence,
                guardrails: vec![AMG_001, AMG_014, AMG_051],
            })
        })
        .collect()
}

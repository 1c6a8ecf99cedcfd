//! Cross-node correlation over pre-aggregated node summaries
//!
//! Nodes never exchange raw events. Each node contributes one or more
//! [`NodeSummaryEvent`]s; this module folds them into per-reason node counts
//! and flags reasons reported by a large enough share of the fleet.

use super::Finding;
use crate::config::CorrelationConfig;
use crate::digest::round6;
use crate::guardrails::{AMG_001, AMG_037, AMG_042};
use crate::types::NodeSummaryEvent;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};

pub const CORRELATION_PREFIX: &str = "AC-CORR::REASON-WIDESPREAD::";

/// Fleet-wide aggregate of node summaries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationSnapshot {
    /// Distinct node ids seen across all summaries
    pub total_nodes: u64,

    /// Reason id → distinct nodes reporting a non-zero count
    pub nodes_by_reason_id: BTreeMap<String, u64>,

    /// Reason id → summed counts across all nodes
    pub events_by_reason_id: BTreeMap<String, u64>,
}

/// Fold node summaries into a [`CorrelationSnapshot`]
///
/// Several summaries from the same node count that node once. A reason with
/// a zero count does not make its node a reporter.
pub fn aggregate_node_summaries(summaries: &[NodeSummaryEvent]) -> CorrelationSnapshot {
    let mut nodes: BTreeSet<&str> = BTreeSet::new();
    let mut reporters: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    let mut events: BTreeMap<String, u64> = BTreeMap::new();

    for summary in summaries {
        nodes.insert(summary.node_id.as_str());
        for (reason_id, &count) in &summary.by_upstream_reason_id {
            if count == 0 {
                continue;
            }
            reporters
                .entry(reason_id.as_str())
                .or_default()
                .insert(summary.node_id.as_str());
            let total = events.entry(reason_id.clone()).or_insert(0);
            *total = total.saturating_add(count);
        }
    }

    CorrelationSnapshot {
        total_nodes: nodes.len() as u64,
        nodes_by_reason_id: reporters
            .into_iter()
            .map(|(reason_id, set)| (reason_id.to_string(), set.len() as u64))
            .collect(),
        events_by_reason_id: events,
    }
}

/// Flag reasons reported by at least `min_nodes` nodes and at least
/// `min_nodes_ratio` of all nodes, in ascending reason order
pub fn generate_correlation_findings(
    snapshot: &CorrelationSnapshot,
    cfg: &CorrelationConfig,
) -> Vec<Finding> {
    let total_nodes = snapshot.total_nodes;
    if total_nodes == 0 {
        return Vec::new();
    }

    snapshot
        .nodes_by_reason_id
        .iter()
        .filter(|(_, &reporting)| {
            reporting >= cfg.min_nodes
                && reporting as f64 >= cfg.min_nodes_ratio * total_nodes as f64
        })
        .map(|(reason_id, &reporting)| {
            let node_ratio = reporting as f64 / total_nodes as f64;
            let total_count = snapshot
                .events_by_reason_id
                .get(reason_id)
                .copied()
                .unwrap_or(0);
            let evidence = BTreeMap::from([
                ("reason_id".to_string(), json!(reason_id)),
                ("reporting_nodes".to_string(), json!(reporting)),
                ("total_nodes".to_string(), json!(total_nodes)),
                ("node_ratio".to_string(), json!(round6(node_ratio))),
                ("total_count".to_string(), json!(total_count)),
            ]);
            Finding {
                finding_id: format!("{}{}", CORRELATION_PREFIX, reason_id),
                title: format!("Reason id reported across the fleet: {}", reason_id),
                severity: (0.2 + node_ratio).min(1.0),
                evidence,
                guardrails: vec![AMG_001, AMG_037, AMG_042],
            }
        })
        .collect()
}

//! Drift radar: mismatched assumptions across layer contracts
//!
//! Values are compared as exact strings. There is no tolerance, so
//! whitespace or casing differences count as drift.

use super::Finding;
use crate::guardrails::{AMG_001, AMG_022, AMG_037, AMG_055};
use crate::types::LayerContract;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};

pub const DRIFT_PREFIX: &str = "AC-DRIFT::";

/// Fixed advisory severity for every drift finding
pub const DRIFT_SEVERITY: f64 = 0.6;

/// Emit one finding per assumption key that has more than one distinct value
pub fn detect_contract_drift(contracts: &[LayerContract]) -> Vec<Finding> {
    // assumption key -> (layers, values)
    let mut index: BTreeMap<&str, (BTreeSet<&str>, BTreeSet<&str>)> = BTreeMap::new();
    for contract in contracts {
        for (key, value) in &contract.assumptions {
            let (layers, values) = index.entry(key.as_str()).or_default();
            layers.insert(contract.layer.as_str());
            values.insert(value.as_str());
        }
    }

    index
        .into_iter()
        .filter(|(_, (_, values))| values.len() > 1)
        .map(|(key, (layers, values))| {
            let evidence = BTreeMap::from([
                ("assumption_key".to_string(), json!(key)),
                ("layers".to_string(), json!(layers)),
                ("values".to_string(), json!(values)),
            ]);
            Finding {
                finding_id: format!("{}{}", DRIFT_PREFIX, key),
                title: format!("Contract drift detected for assumption '{}'", key),
                severity: DRIFT_SEVERITY,
                evidence,
                guardrails: vec![AMG_001, AMG_022, AMG_037, AMG_055],
            }
        })
        .collect()
}

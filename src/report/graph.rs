//! DOT rendering of contract drift

use crate::findings::Finding;
use serde_json::Value;

/// Render drift findings as a `digraph DriftRadar` with one edge per
/// layer → assumption key; non-drift findings are skipped
pub fn render_drift_dot(findings: &[Finding]) -> String {
    let mut lines = vec![
        "digraph DriftRadar {".to_string(),
        "  rankdir=LR;".to_string(),
        "  node [shape=box];".to_string(),
    ];

    for finding in findings.iter().filter(|f| f.is_drift()) {
        let Some(key) = finding.evidence.get("assumption_key").and_then(Value::as_str) else {
            continue;
        };
        let layers = finding
            .evidence
            .get("layers")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for layer in layers.iter().filter_map(Value::as_str) {
            lines.push(format!("  \"{}\" -> \"{}\";", escape(layer), escape(key)));
        }
    }

    lines.push("}".to_string());
    lines.join("\n")
}

fn escape(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}

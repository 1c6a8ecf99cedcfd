//! Byte-stable report renderers
//!
//! Neither renderer reads the clock or any other ambient state, so identical
//! reports always render to identical bytes.

use super::UpgradeReport;
use crate::digest::canonical_json;
use crate::error::Result;

/// Canonical JSON: sorted keys at every depth, compact separators
pub fn render_report_json(report: &UpgradeReport) -> Result<String> {
    canonical_json(report)
}

/// Human-readable markdown with a fixed section order
pub fn render_report_markdown(report: &UpgradeReport) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push("# Adaptive Core Upgrade Report".to_string());
    lines.push(String::new());
    lines.push(format!("**Report ID:** {}", report.report_id));
    lines.push(format!("**Type:** {}", report.report_type));
    lines.push(format!("**Target Layers:** {}", report.target_layers.join(", ")));
    lines.push(String::new());

    lines.push("## Capabilities".to_string());
    let caps = &report.capabilities;
    lines.push(format!("- Envelope: {}", caps.envelope));
    lines.push(format!("- Correlation: {}", caps.correlation));
    lines.push(format!("- Archival: {}", caps.archival));
    lines.push(format!("- Telemetry: {}", caps.telemetry));
    lines.push(String::new());

    lines.push("## Evidence Summary".to_string());
    let ev = &report.evidence;
    lines.push(format!("- Total events: {}", ev.total_events));
    for (reason_id, count) in &ev.by_upstream_reason_id {
        lines.push(format!("- Reason `{}`: {}", reason_id, count));
    }
    lines.push(format!("- Drift contracts provided: {}", ev.drift_contracts_provided));
    lines.push(format!("- Drift findings: {}", ev.drift_findings));
    lines.push(format!("- Correlation findings: {}", ev.correlation_findings));
    lines.push(String::new());

    lines.push("## Guardrails Triggered".to_string());
    if report.guardrails.is_empty() {
        lines.push("- (none)".to_string());
    }
    for id in &report.guardrails {
        let key = id.to_string();
        let title = report.guardrail_titles.get(&key).map(String::as_str).unwrap_or("");
        lines.push(format!("- **{}**: {}", key, title));
    }
    lines.push(String::new());

    lines.push("## Confidence".to_string());
    lines.push(format!("**Score:** {}", report.confidence));
    for (signal, value) in &report.confidence_breakdown {
        lines.push(format!("- {}: {}", signal, value));
    }
    lines.push(String::new());

    lines.push("## Findings".to_string());
    if report.findings.is_empty() {
        lines.push("_No findings in this window._".to_string());
    }
    for finding in &report.findings {
        lines.push(format!(
            "- `{}` (severity {}): {}",
            finding.finding_id, finding.severity, finding.title
        ));
    }
    lines.push(String::new());

    if let Some(dot) = &report.drift_dot {
        lines.push("## Drift Radar Graph (DOT)".to_string());
        lines.push("```dot".to_string());
        lines.push(dot.clone());
        lines.push("```".to_string());
        lines.push(String::new());
    }

    push_list(&mut lines, "## Recommended Actions", &report.recommended_actions);
    push_list(&mut lines, "## Required Tests", &report.required_tests);
    push_list(&mut lines, "## Exit Criteria", &report.exit_criteria);
    push_list(&mut lines, "## Forbidden Actions", &report.forbidden_actions);

    lines.join("\n")
}

fn push_list(lines: &mut Vec<String>, heading: &str, items: &[String]) {
    lines.push(heading.to_string());
    if items.is_empty() {
        lines.push("- (none)".to_string());
    }
    lines.extend(items.iter().map(|item| format!("- {}", item)));
    lines.push(String::new());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportConfig;
    use crate::guardrails::GuardrailRegistry;
    use crate::report::{ReportBuilder, ReportRequest};
    use crate::types::LayerContract;
    use crate::window::EvidenceSnapshot;
    use std::collections::BTreeMap;

    fn build(req: ReportRequest) -> UpgradeReport {
        ReportBuilder::new(GuardrailRegistry::bundled().unwrap(), ReportConfig::default())
            .build(&req)
            .unwrap()
    }

    fn spike_request() -> ReportRequest {
        let snapshot = EvidenceSnapshot {
            total_events: 10,
            by_source_layer: BTreeMap::from([("dqsn".to_string(), 10)]),
            by_event_type: BTreeMap::from([("reject".to_string(), 10)]),
            by_upstream_reason_id: BTreeMap::from([("SPIKE".to_string(), 10)]),
        };
        ReportRequest::new("r-md", ["sentinel", "dqsn"], snapshot)
            .with_drift_contracts(vec![
                LayerContract::new("dqsn").with_assumption("meta.canonical", "true"),
                LayerContract::new("sentinel").with_assumption("meta.canonical", "false"),
            ])
            .with_drift_graph(true)
    }

    #[test]
    fn test_json_is_sorted_and_compact() {
        let json = render_report_json(&build(spike_request())).unwrap();
        assert!(json.starts_with("{\"capabilities\":"));
        assert!(!json.contains('\n'));
        assert!(json.contains("\"report_type\":\"UPGRADE_REPORT\""));
        assert!(json.contains("\"guardrails\":[\"AMG-001\""));
    }

    #[test]
    fn test_json_stable_across_renders() {
        let a = render_report_json(&build(spike_request())).unwrap();
        let b = render_report_json(&build(spike_request())).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_absent_drift_graph_is_null() {
        let json = render_report_json(&build(ReportRequest::new(
            "r",
            ["a"],
            EvidenceSnapshot::default(),
        )))
        .unwrap();
        assert!(json.contains("\"drift_dot\":null"));
    }

    #[test]
    fn test_markdown_section_order() {
        let md = render_report_markdown(&build(spike_request()));
        let sections = [
            "## Capabilities",
            "## Evidence Summary",
            "## Guardrails Triggered",
            "## Confidence",
            "## Findings",
            "## Drift Radar Graph (DOT)",
            "## Recommended Actions",
            "## Required Tests",
            "## Exit Criteria",
            "## Forbidden Actions",
        ];
        let positions: Vec<usize> = sections.iter().map(|s| md.find(s).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{:?}", positions);
        assert!(md.contains("**Target Layers:** dqsn, sentinel"));
        assert!(md.contains("- **AMG-001**: Deny by default"));
        assert!(md.contains("`AC-FIND-REASON-SPIKE::SPIKE`"));
    }

    #[test]
    fn test_notice_markdown() {
        let md = render_report_markdown(&build(ReportRequest::new(
            "r-n",
            ["a"],
            EvidenceSnapshot::default(),
        )));
        assert!(md.contains("**Type:** SIGNAL_COLLECTION_NOTICE"));
        assert!(md.contains("_No findings in this window._"));
        assert!(md.contains("## Required Tests\n- (none)"));
        assert!(!md.contains("## Drift Radar Graph"));
    }

    #[test]
    fn test_confidence_breakdown_sorted() {
        let md = render_report_markdown(&build(spike_request()));
        let a = md.find("- cross_layer_impact:").unwrap();
        let b = md.find("- max_severity:").unwrap();
        let c = md.find("- recurrence_ratio:").unwrap();
        let d = md.find("- reproducibility:").unwrap();
        assert!(a < b && b < c && c < d);
    }
}

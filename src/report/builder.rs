use super::graph::render_drift_dot;
use super::{EvidenceSummary, ReportRequest, ReportType, UpgradeReport};
use crate::confidence::ConfidenceSignals;
use crate::config::ReportConfig;
use crate::digest::round6;
use crate::error::{AdaptiveError, Result};
use crate::findings::{
    detect_contract_drift, generate_correlation_findings, generate_findings, Finding,
};
use crate::guardrails::{GuardrailId, GuardrailRegistry};
use std::collections::BTreeSet;

const NOTICE_RECOMMENDED: &[&str] = &[
    "Collect more evidence for recurring reason codes and anomalies.",
    "If drift is suspected, provide LayerContract inputs for Drift Radar.",
];

const NOTICE_EXIT: &[&str] = &[
    "Confidence must meet threshold before emitting an Upgrade Report.",
    "All outputs must remain deterministic and reproducible.",
];

const NOTICE_FORBIDDEN: &[&str] = &[
    "Do not relax validation to increase acceptance.",
    "Do not apply code changes based on low-confidence notices.",
];

const UPGRADE_RECOMMENDED: &[&str] = &[
    "Harden validation/canonicalization at boundaries where spikes occur.",
    "Resolve contract drift by aligning assumptions across layers (fail-closed).",
    "Add negative tests and regression locks referencing this report_id.",
];

const UPGRADE_REQUIRED_TESTS: &[&str] = &[
    "Add a negative test that fails before the fix and passes after.",
    "Add a regression lock referencing this report_id.",
];

const UPGRADE_EXIT: &[&str] = &[
    "New tests MUST fail on prior version and pass after fix.",
    "Coverage must not regress (≥ project threshold).",
    "No silent fallbacks; explicit reason codes required.",
];

const UPGRADE_FORBIDDEN: &[&str] = &[
    "Do not relax validation rules.",
    "Do not introduce silent defaults.",
    "Do not auto-apply changes; human review is mandatory.",
];

/// Builds [`UpgradeReport`]s against one guardrail registry
///
/// A build either yields a complete report or fails; one unknown guardrail
/// reference anywhere in the finding set aborts it.
pub struct ReportBuilder<'a> {
    registry: &'a GuardrailRegistry,
    config: ReportConfig,
}

impl<'a> ReportBuilder<'a> {
    /// Builder over `registry`; `config` is validated on every build
    pub fn new(registry: &'a GuardrailRegistry, config: ReportConfig) -> Self {
        Self { registry, config }
    }

    /// Detector and weight settings in use
    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Run every detector, score confidence and assemble the report
    pub fn build(&self, request: &ReportRequest) -> Result<UpgradeReport> {
        validate_request(request)?;
        self.config.validate()?;

        let spike = generate_findings(&request.snapshot, &self.config.analyze);
        let drift = request
            .drift_contracts
            .as_deref()
            .map(detect_contract_drift)
            .unwrap_or_default();
        let correlation = request
            .correlation
            .as_ref()
            .map(|snap| generate_correlation_findings(snap, &self.config.correlation))
            .unwrap_or_default();

        let drift_dot = (request.include_drift_graph && !drift.is_empty())
            .then(|| render_drift_dot(&drift));

        let evidence = EvidenceSummary {
            total_events: request.snapshot.total_events,
            by_source_layer: request.snapshot.by_source_layer.clone(),
            by_event_type: request.snapshot.by_event_type.clone(),
            by_upstream_reason_id: request.snapshot.by_upstream_reason_id.clone(),
            drift_contracts_provided: request.drift_contracts.as_ref().map_or(0, |c| c.len() as u64),
            drift_findings: drift.len() as u64,
            correlation_findings: correlation.len() as u64,
        };
        let drift_count = drift.len();

        let mut findings: Vec<Finding> = spike;
        findings.extend(drift);
        findings.extend(correlation);
        findings.sort_by(|a, b| a.finding_id.cmp(&b.finding_id));

        let signals = ConfidenceSignals::derive(
            &request.snapshot,
            &findings,
            drift_count,
            request.target_layers.len(),
        );
        let confidence = signals.score(&self.config.weights);

        let guardrails: Vec<GuardrailId> = findings
            .iter()
            .flat_map(|f| f.guardrails.iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let guardrail_titles = self.registry.titles_for(&guardrails).map_err(|e| {
            tracing::warn!(
                report_id = %request.report_id,
                error = %e,
                "Report build rejected"
            );
            e
        })?;

        let mut target_layers = request.target_layers.clone();
        target_layers.sort();

        let report_type = if confidence < request.confidence_threshold {
            ReportType::SignalCollectionNotice
        } else {
            ReportType::UpgradeReport
        };
        let (recommended, required_tests, exit, forbidden) = match report_type {
            ReportType::SignalCollectionNotice => {
                (NOTICE_RECOMMENDED, &[][..], NOTICE_EXIT, NOTICE_FORBIDDEN)
            }
            ReportType::UpgradeReport => (
                UPGRADE_RECOMMENDED,
                UPGRADE_REQUIRED_TESTS,
                UPGRADE_EXIT,
                UPGRADE_FORBIDDEN,
            ),
        };

        tracing::info!(
            report_id = %request.report_id,
            report_type = %report_type,
            findings = findings.len(),
            guardrails = guardrails.len(),
            confidence,
            "Report built"
        );

        Ok(UpgradeReport {
            report_id: request.report_id.clone(),
            report_type,
            target_layers,
            evidence,
            findings,
            guardrails,
            guardrail_titles,
            confidence: round6(confidence),
            confidence_breakdown: signals.breakdown(),
            capabilities: request.capabilities,
            drift_dot,
            recommended_actions: owned(recommended),
            required_tests: owned(required_tests),
            exit_criteria: owned(exit),
            forbidden_actions: owned(forbidden),
        })
    }
}

fn validate_request(request: &ReportRequest) -> Result<()> {
    if request.report_id.trim().is_empty() {
        return Err(AdaptiveError::ReportInvalid(
            "report_id must be non-empty".to_string(),
        ));
    }
    if request.target_layers.is_empty() {
        return Err(AdaptiveError::ReportInvalid(
            "target_layers must be non-empty".to_string(),
        ));
    }
    if request.target_layers.iter().any(|l| l.trim().is_empty()) {
        return Err(AdaptiveError::ReportInvalid(
            "target_layers entries must be non-empty".to_string(),
        ));
    }
    let threshold = request.confidence_threshold;
    if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
        return Err(AdaptiveError::ReportInvalid(format!(
            "confidence_threshold must be in [0.0, 1.0], got {}",
            threshold
        )));
    }
    Ok(())
}

fn owned(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReasonCode;
    use crate::findings::aggregate_node_summaries;
    use crate::report::{Capabilities, Presence};
    use crate::types::{LayerContract, NodeSummaryEvent};
    use crate::window::EvidenceSnapshot;
    use std::collections::BTreeMap;

    fn bundled() -> &'static GuardrailRegistry {
        GuardrailRegistry::bundled().unwrap()
    }

    fn spike_snapshot() -> EvidenceSnapshot {
        EvidenceSnapshot {
            total_events: 10,
            by_upstream_reason_id: BTreeMap::from([("SPIKE".to_string(), 10)]),
            ..Default::default()
        }
    }

    #[test]
    fn test_spike_yields_upgrade_report() {
        let builder = ReportBuilder::new(bundled(), ReportConfig::default());
        let req = ReportRequest::new("r-1", ["dqsn"], spike_snapshot()).with_confidence_threshold(0.0);
        let report = builder.build(&req).unwrap();

        assert_eq!(report.report_type, ReportType::UpgradeReport);
        assert!(report.is_upgrade());
        assert!(report
            .findings
            .iter()
            .any(|f| f.finding_id == "AC-FIND-REASON-SPIKE::SPIKE"));
        assert_eq!(report.required_tests.len(), 2);
        let ids: Vec<String> = report.guardrails.iter().map(ToString::to_string).collect();
        assert_eq!(ids, vec!["AMG-001", "AMG-014", "AMG-051"]);
        assert_eq!(report.guardrail_titles.len(), 3);
        assert_eq!(
            report.exit_criteria,
            vec![
                "New tests MUST fail on prior version and pass after fix.",
                "Coverage must not regress (≥ project threshold).",
                "No silent fallbacks; explicit reason codes required.",
            ]
        );
    }

    #[test]
    fn test_empty_snapshot_yields_notice() {
        let builder = ReportBuilder::new(bundled(), ReportConfig::default());
        let req = ReportRequest::new("r-2", ["dqsn"], EvidenceSnapshot::default());
        let report = builder.build(&req).unwrap();

        assert_eq!(report.report_type, ReportType::SignalCollectionNotice);
        assert!(report.findings.is_empty());
        assert!(report.required_tests.is_empty());
        assert!(report.guardrails.is_empty());
        assert_eq!(report.recommended_actions.len(), 2);
        assert_eq!(report.forbidden_actions.len(), 2);
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let config = ReportConfig::default();
        let builder = ReportBuilder::new(bundled(), config);
        // spike of 10/10 on one layer: every signal saturates except cross-layer (1/5)
        let exact = crate::confidence::compute_confidence(1.0, 1.0, 1.0, 0.2, &config.weights);
        let report = builder
            .build(&ReportRequest::new("r", ["a"], spike_snapshot()).with_confidence_threshold(exact))
            .unwrap();
        assert_eq!(report.report_type, ReportType::UpgradeReport);

        let above = builder
            .build(&ReportRequest::new("r", ["a"], spike_snapshot()).with_confidence_threshold(exact + 1e-9))
            .unwrap();
        assert_eq!(above.report_type, ReportType::SignalCollectionNotice);
    }

    #[test]
    fn test_invalid_requests_rejected() {
        let builder = ReportBuilder::new(bundled(), ReportConfig::default());
        let empty: [&str; 0] = [];
        let cases = vec![
            ReportRequest::new("  ", ["a"], EvidenceSnapshot::default()),
            ReportRequest::new("r", empty, EvidenceSnapshot::default()),
            ReportRequest::new("r", ["a", " "], EvidenceSnapshot::default()),
            ReportRequest::new("r", ["a"], EvidenceSnapshot::default()).with_confidence_threshold(f64::NAN),
            ReportRequest::new("r", ["a"], EvidenceSnapshot::default()).with_confidence_threshold(1.5),
        ];
        for req in cases {
            let err = builder.build(&req).unwrap_err();
            assert_eq!(err.code(), ReasonCode::ReportInvalid, "{:?}", req);
        }
    }

    #[test]
    fn test_unknown_guardrail_aborts_build() {
        let registry = GuardrailRegistry::from_json_str(
            r#"{"version": "test", "guardrails": [
                {"id": "AMG-001", "title": "Deny by default", "category": "core"}
            ]}"#,
        )
        .unwrap();
        let builder = ReportBuilder::new(&registry, ReportConfig::default());
        let err = builder
            .build(&ReportRequest::new("r", ["a"], spike_snapshot()))
            .unwrap_err();
        match err {
            AdaptiveError::GuardrailUnknown { ids } => {
                assert_eq!(ids, vec!["AMG-014".to_string(), "AMG-051".to_string()])
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_findings_merged_and_sorted() {
        let summaries: Vec<NodeSummaryEvent> = (1..=3)
            .map(|i| NodeSummaryEvent {
                node_id: format!("n{}", i),
                window_start: "2026-01-14T00:00:00Z".to_string(),
                window_end: "2026-01-14T01:00:00Z".to_string(),
                total_events: 5,
                by_upstream_reason_id: BTreeMap::from([("RISK".to_string(), 2)]),
            })
            .collect();
        let req = ReportRequest::new("r", ["b", "a"], spike_snapshot())
            .with_drift_contracts(vec![
                LayerContract::new("a").with_assumption("k", "1"),
                LayerContract::new("b").with_assumption("k", "2"),
            ])
            .with_correlation(aggregate_node_summaries(&summaries))
            .with_drift_graph(true);
        let report = ReportBuilder::new(bundled(), ReportConfig::default())
            .build(&req)
            .unwrap();

        let ids: Vec<_> = report.findings.iter().map(|f| f.finding_id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "AC-CORR::REASON-WIDESPREAD::RISK",
                "AC-DRIFT::k",
                "AC-FIND-REASON-SPIKE::SPIKE"
            ]
        );
        assert_eq!(report.target_layers, vec!["a", "b"]);
        assert_eq!(report.evidence.drift_contracts_provided, 2);
        assert_eq!(report.evidence.drift_findings, 1);
        assert_eq!(report.evidence.correlation_findings, 1);
        assert!(report.drift_dot.as_deref().unwrap().contains("\"a\" -> \"k\";"));
        let ids: Vec<String> = report.guardrails.iter().map(ToString::to_string).collect();
        assert_eq!(
            ids,
            vec!["AMG-001", "AMG-014", "AMG-022", "AMG-037", "AMG-042", "AMG-051", "AMG-055"]
        );
    }

    #[test]
    fn test_drift_graph_needs_drift_and_request() {
        let builder = ReportBuilder::new(bundled(), ReportConfig::default());
        let no_drift = ReportRequest::new("r", ["a"], EvidenceSnapshot::default())
            .with_drift_contracts(vec![LayerContract::new("a").with_assumption("k", "1")])
            .with_drift_graph(true);
        assert!(builder.build(&no_drift).unwrap().drift_dot.is_none());

        let not_requested = ReportRequest::new("r", ["a"], EvidenceSnapshot::default())
            .with_drift_contracts(vec![
                LayerContract::new("a").with_assumption("k", "1"),
                LayerContract::new("b").with_assumption("k", "2"),
            ]);
        assert!(builder.build(&not_requested).unwrap().drift_dot.is_none());
    }

    #[test]
    fn test_capabilities_echoed() {
        let caps = Capabilities {
            envelope: Presence::Present,
            ..Default::default()
        };
        let req = ReportRequest::new("r", ["a"], EvidenceSnapshot::default()).with_capabilities(caps);
        let report = ReportBuilder::new(bundled(), ReportConfig::default())
            .build(&req)
            .unwrap();
        assert_eq!(report.capabilities, caps);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = ReportConfig::default();
        config.weights.recurrence = f64::NAN;
        let err = ReportBuilder::new(bundled(), config)
            .build(&ReportRequest::new("r", ["a"], EvidenceSnapshot::default()))
            .unwrap_err();
        assert_eq!(err.code(), ReasonCode::ConfigInvalid);
    }
}

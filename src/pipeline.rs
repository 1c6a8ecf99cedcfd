//! Build → render → envelope, in one pass
//!
//! The pipeline owns no state beyond its builder and the declared signature
//! statuses. Any failure aborts the run; there is no partial output.

use crate::config::ReportConfig;
use crate::envelope::{ReportEnvelope, SignatureStatus};
use crate::error::Result;
use crate::guardrails::GuardrailRegistry;
use crate::report::{
    render_report_json, render_report_markdown, ReportBuilder, ReportRequest, UpgradeReport,
};

/// Everything one pipeline run produces
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub report: UpgradeReport,
    pub canonical_json: String,
    pub markdown: String,
    pub envelope: ReportEnvelope,
}

/// Report pipeline bound to one guardrail registry
pub struct Pipeline<'a> {
    builder: ReportBuilder<'a>,
    classical_signature: SignatureStatus,
    pqc_signature: SignatureStatus,
}

impl<'a> Pipeline<'a> {
    /// Pipeline with both signature statuses `ABSENT`
    pub fn new(registry: &'a GuardrailRegistry, config: ReportConfig) -> Self {
        Self {
            builder: ReportBuilder::new(registry, config),
            classical_signature: SignatureStatus::Absent,
            pqc_signature: SignatureStatus::Absent,
        }
    }

    /// Declare the signature statuses recorded in every envelope
    pub fn with_signatures(mut self, classical: SignatureStatus, pqc: SignatureStatus) -> Self {
        self.classical_signature = classical;
        self.pqc_signature = pqc;
        self
    }

    pub fn run(&self, request: &ReportRequest) -> Result<PipelineOutput> {
        let report = self.builder.build(request)?;
        let canonical_json = render_report_json(&report)?;
        let markdown = render_report_markdown(&report);
        let envelope = ReportEnvelope::create(
            canonical_json.clone(),
            self.classical_signature,
            self.pqc_signature,
        )?;

        tracing::info!(
            report_id = %report.report_id,
            report_hash = %envelope.report_hash(),
            "Pipeline run complete"
        );

        Ok(PipelineOutput {
            report,
            canonical_json,
            markdown,
            envelope,
        })
    }
}

/// Run the pipeline with the bundled guardrail catalog and default config
pub fn run_pipeline(request: &ReportRequest) -> Result<PipelineOutput> {
    Pipeline::new(GuardrailRegistry::bundled()?, ReportConfig::default()).run(request)
}

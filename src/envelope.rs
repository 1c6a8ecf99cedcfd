//! Integrity envelope for rendered reports
//!
//! The envelope binds a SHA-256 content hash to the canonical JSON and
//! records signature status as plain metadata. It never verifies a
//! signature and grants no execution authority.

use crate::digest::sha256_hex;
use crate::error::{AdaptiveError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

/// Declared state of one signature scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignatureStatus {
    #[default]
    Absent,
    Present,
    Unsupported,
}

impl SignatureStatus {
    /// Parse `ABSENT`, `PRESENT` or `UNSUPPORTED`; anything else is rejected
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "ABSENT" => Ok(Self::Absent),
            "PRESENT" => Ok(Self::Present),
            "UNSUPPORTED" => Ok(Self::Unsupported),
            other => Err(AdaptiveError::EnvelopeInvalid(format!(
                "invalid signature status '{}'",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Absent => "ABSENT",
            Self::Present => "PRESENT",
            Self::Unsupported => "UNSUPPORTED",
        }
    }
}

impl fmt::Display for SignatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureStatus {
    type Err = AdaptiveError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Hash plus signature metadata for one canonical report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEnvelope {
    report_hash: String,
    canonical_json: String,
    classical_signature: SignatureStatus,
    pqc_signature: SignatureStatus,
}

impl ReportEnvelope {
    /// Hash `canonical_json` and record both signature statuses
    pub fn create(
        canonical_json: impl Into<String>,
        classical_signature: SignatureStatus,
        pqc_signature: SignatureStatus,
    ) -> Result<Self> {
        let canonical_json = canonical_json.into();
        if canonical_json.trim().is_empty() {
            return Err(AdaptiveError::EnvelopeInvalid(
                "canonical_json must be non-empty".to_string(),
            ));
        }
        Ok(Self {
            report_hash: sha256_hex(&canonical_json),
            canonical_json,
            classical_signature,
            pqc_signature,
        })
    }

    /// Lowercase hex SHA-256 of the canonical JSON
    pub fn report_hash(&self) -> &str {
        &self.report_hash
    }

    pub fn canonical_json(&self) -> &str {
        &self.canonical_json
    }

    pub fn classical_signature(&self) -> SignatureStatus {
        self.classical_signature
    }

    pub fn pqc_signature(&self) -> SignatureStatus {
        self.pqc_signature
    }

    /// `{report_hash, classical_signature, pqc_signature}` without the payload
    pub fn summary(&self) -> Value {
        json!({
            "report_hash": self.report_hash,
            "classical_signature": self.classical_signature.as_str(),
            "pqc_signature": self.pqc_signature.as_str(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReasonCode;

    #[test]
    fn test_create_hashes_payload() {
        let env = ReportEnvelope::create(
            r#"{"a":1}"#,
            SignatureStatus::Absent,
            SignatureStatus::Unsupported,
        )
        .unwrap();
        assert_eq!(env.report_hash(), sha256_hex(r#"{"a":1}"#));
        assert_eq!(env.report_hash().len(), 64);
        assert_eq!(env.canonical_json(), r#"{"a":1}"#);
        assert_eq!(env.classical_signature(), SignatureStatus::Absent);
        assert_eq!(env.pqc_signature(), SignatureStatus::Unsupported);
    }

    #[test]
    fn test_blank_payload_rejected() {
        for payload in ["", "   "] {
            let err = ReportEnvelope::create(payload, SignatureStatus::Absent, SignatureStatus::Absent)
                .unwrap_err();
            assert_eq!(err.code(), ReasonCode::EnvelopeInvalid);
        }
    }

    #[test]
    fn test_signature_status_parse() {
        assert_eq!(SignatureStatus::parse("PRESENT").unwrap(), SignatureStatus::Present);
        assert_eq!("UNSUPPORTED".parse::<SignatureStatus>().unwrap(), SignatureStatus::Unsupported);
        for bad in ["present", "VALID", ""] {
            let err = SignatureStatus::parse(bad).unwrap_err();
            assert_eq!(err.code(), ReasonCode::EnvelopeInvalid);
        }
    }

    #[test]
    fn test_summary_omits_payload() {
        let env = ReportEnvelope::create("{}", SignatureStatus::Present, SignatureStatus::Absent).unwrap();
        let summary = env.summary();
        assert_eq!(summary["classical_signature"], "PRESENT");
        assert_eq!(summary["pqc_signature"], "ABSENT");
        assert_eq!(summary["report_hash"], env.report_hash());
        assert!(summary.get("canonical_json").is_none());
    }

    #[test]
    fn test_different_payloads_differ() {
        let a = ReportEnvelope::create("{\"a\":1}", SignatureStatus::Absent, SignatureStatus::Absent).unwrap();
        let b = ReportEnvelope::create("{\"a\":2}", SignatureStatus::Absent, SignatureStatus::Absent).unwrap();
        assert_ne!(a.report_hash(), b.report_hash());
    }
}

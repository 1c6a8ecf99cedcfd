//! Error types for a3s-adaptive
//!
//! Every failure carries a stable [`ReasonCode`]. Callers branch on
//! [`AdaptiveError::code`], never on the message text.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Stable, enumerated reason codes for every failure in the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "&'static str")]
pub enum ReasonCode {
    /// A required field is absent
    MissingField,
    /// A field is present but has the wrong type or is blank
    TypeInvalid,
    /// A value is well-typed but outside its canonical range
    NonCanonical,
    /// A timestamp is not ISO-8601 with a trailing `Z`
    TimestampInvalid,
    /// `meta` is not a string-keyed object
    MetaInvalid,
    /// The raw input is not a JSON object
    InvalidEvent,
    /// A finding references a guardrail absent from the registry
    GuardrailUnknown,
    /// The guardrail catalog itself is malformed
    GuardrailRegistryInvalid,
    /// Report construction arguments are invalid
    ReportInvalid,
    /// Envelope construction arguments are invalid
    EnvelopeInvalid,
    /// Configuration values are invalid
    ConfigInvalid,
    /// JSON encoding or decoding failed
    SerializationFailed,
    /// The historical packet store could not read or write its file
    StorageFailed,
}

impl ReasonCode {
    /// Wire representation of the code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingField => "AC_V3_MISSING_FIELD",
            Self::TypeInvalid => "AC_V3_TYPE_INVALID",
            Self::NonCanonical => "AC_V3_NON_CANONICAL",
            Self::TimestampInvalid => "AC_V3_TIMESTAMP_INVALID",
            Self::MetaInvalid => "AC_V3_META_INVALID",
            Self::InvalidEvent => "AC_V3_INVALID_EVENT",
            Self::GuardrailUnknown => "AC_V3_GUARDRAIL_UNKNOWN",
            Self::GuardrailRegistryInvalid => "AC_V3_GUARDRAIL_REGISTRY_INVALID",
            Self::ReportInvalid => "AC_V3_REPORT_INVALID",
            Self::EnvelopeInvalid => "AC_V3_ENVELOPE_INVALID",
            Self::ConfigInvalid => "AC_V3_CONFIG_INVALID",
            Self::SerializationFailed => "AC_V3_SERIALIZATION_FAILED",
            Self::StorageFailed => "AC_V3_STORAGE_FAILED",
        }
    }
}

impl From<ReasonCode> for &'static str {
    fn from(code: ReasonCode) -> Self {
        code.as_str()
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while canonicalizing evidence or building reports
#[derive(Debug, Error)]
pub enum AdaptiveError {
    /// Untrusted input failed strict validation
    #[error("{code}: {reason}")]
    Validation { code: ReasonCode, reason: String },

    /// One or more referenced guardrails are not in the registry
    #[error("AC_V3_GUARDRAIL_UNKNOWN: unknown guardrail ids {ids:?}")]
    GuardrailUnknown { ids: Vec<String> },

    /// Guardrail catalog failed structural validation
    #[error("AC_V3_GUARDRAIL_REGISTRY_INVALID: {0}")]
    RegistryInvalid(String),

    /// Report construction arguments rejected
    #[error("AC_V3_REPORT_INVALID: {0}")]
    ReportInvalid(String),

    /// Envelope construction arguments rejected
    #[error("AC_V3_ENVELOPE_INVALID: {0}")]
    EnvelopeInvalid(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Packet store file access failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl AdaptiveError {
    /// Shorthand for a validation failure
    pub(crate) fn validation(code: ReasonCode, reason: impl Into<String>) -> Self {
        Self::Validation {
            code,
            reason: reason.into(),
        }
    }

    /// Stable reason code for this error
    pub fn code(&self) -> ReasonCode {
        match self {
            Self::Validation { code, .. } => *code,
            Self::GuardrailUnknown { .. } => ReasonCode::GuardrailUnknown,
            Self::RegistryInvalid(_) => ReasonCode::GuardrailRegistryInvalid,
            Self::ReportInvalid(_) => ReasonCode::ReportInvalid,
            Self::EnvelopeInvalid(_) => ReasonCode::EnvelopeInvalid,
            Self::Config(_) => ReasonCode::ConfigInvalid,
            Self::Serialization(_) => ReasonCode::SerializationFailed,
            Self::Storage(_) => ReasonCode::StorageFailed,
        }
    }
}

/// Result type alias for adaptive-core operations
pub type Result<T> = std::result::Result<T, AdaptiveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_leads_with_code() {
        let err = AdaptiveError::validation(ReasonCode::MissingField, "missing 'meta'");
        assert_eq!(err.to_string(), "AC_V3_MISSING_FIELD: missing 'meta'");
        assert_eq!(err.code(), ReasonCode::MissingField);
    }

    #[test]
    fn test_unknown_guardrail_code() {
        let err = AdaptiveError::GuardrailUnknown {
            ids: vec!["AMG-900".to_string()],
        };
        assert_eq!(err.code(), ReasonCode::GuardrailUnknown);
        assert!(err.to_string().contains("AMG-900"));
    }

    #[test]
    fn test_reason_code_serializes_as_wire_string() {
        let json = serde_json::to_string(&ReasonCode::TimestampInvalid).unwrap();
        assert_eq!(json, "\"AC_V3_TIMESTAMP_INVALID\"");
    }

    #[test]
    fn test_serde_error_converts() {
        let err: AdaptiveError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.code(), ReasonCode::SerializationFailed);
    }
}

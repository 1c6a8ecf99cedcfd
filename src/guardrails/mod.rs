//! Guardrail registry: the governance rules every finding must cite
//!
//! The registry is a static, versioned catalog loaded once and immutable
//! afterwards. [`GuardrailRegistry::require_all`] is the single enforcement
//! point: a report citing any id the catalog does not know is rejected.

use crate::error::{AdaptiveError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Compiled-in catalog shipped with the crate
const BUNDLED_CATALOG: &str = include_str!("amg_guardrails_v1.json");

const ID_PREFIX: &str = "AMG-";

/// Deny by default
pub const AMG_001: GuardrailId = GuardrailId(1);
/// No silent fallback
pub const AMG_014: GuardrailId = GuardrailId(14);
/// Strict canonicalization
pub const AMG_022: GuardrailId = GuardrailId(22);
/// Determinism guardian
pub const AMG_037: GuardrailId = GuardrailId(37);
/// Cross-node data stays aggregated
pub const AMG_042: GuardrailId = GuardrailId(42);
/// No fix without test
pub const AMG_051: GuardrailId = GuardrailId(51);
/// Proof pack required
pub const AMG_055: GuardrailId = GuardrailId(55);

/// Guardrail identifier: exactly `AMG-` followed by three ASCII digits
///
/// Shape is validated once at parse time; the string form is rebuilt on
/// display, so ordering matches lexicographic order of the ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GuardrailId(u16);

impl GuardrailId {
    /// Parse and validate an id such as `AMG-001`
    pub fn parse(raw: &str) -> Result<Self> {
        let digits = raw
            .strip_prefix(ID_PREFIX)
            .filter(|d| d.len() == 3 && d.bytes().all(|b| b.is_ascii_digit()))
            .ok_or_else(|| {
                AdaptiveError::RegistryInvalid(format!("malformed guardrail id '{}'", raw))
            })?;
        let number = digits
            .parse::<u16>()
            .map_err(|e| AdaptiveError::RegistryInvalid(format!("guardrail id '{}': {}", raw, e)))?;
        Ok(Self(number))
    }

    /// Numeric suffix
    pub fn number(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for GuardrailId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", ID_PREFIX, self.0)
    }
}

impl FromStr for GuardrailId {
    type Err = AdaptiveError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for GuardrailId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GuardrailId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// One governance rule from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Guardrail {
    /// Catalog identifier (e.g., `AMG-001`)
    pub id: GuardrailId,
    /// Human-readable rule title
    pub title: String,
    /// Grouping used by the catalog
    pub category: String,
}

/// Immutable lookup table of guardrails
#[derive(Debug, Clone)]
pub struct GuardrailRegistry {
    version: String,
    guardrails: BTreeMap<GuardrailId, Guardrail>,
}

impl GuardrailRegistry {
    /// The compiled-in catalog, parsed once per process
    pub fn bundled() -> Result<&'static GuardrailRegistry> {
        static BUNDLED: OnceLock<std::result::Result<GuardrailRegistry, String>> = OnceLock::new();
        BUNDLED
            .get_or_init(|| Self::from_json_str(BUNDLED_CATALOG).map_err(|e| e.to_string()))
            .as_ref()
            .map_err(|e| AdaptiveError::RegistryInvalid(format!("bundled catalog: {}", e)))
    }

    /// Parse and validate a catalog document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| AdaptiveError::RegistryInvalid(format!("catalog is not JSON: {}", e)))?;
        Self::from_value(&value)
    }

    /// Validate an already-parsed catalog document
    ///
    /// Fails closed on any structural violation; nothing is skipped.
    pub fn from_value(value: &Value) -> Result<Self> {
        let root = value
            .as_object()
            .ok_or_else(|| invalid("catalog root must be an object"))?;

        let version = match root.get("version") {
            Some(Value::String(v)) if !v.trim().is_empty() => v.trim().to_string(),
            Some(_) => return Err(invalid("version must be a non-empty string")),
            None => return Err(invalid("missing version")),
        };

        let entries = match root.get("guardrails") {
            Some(Value::Array(items)) if !items.is_empty() => items,
            Some(_) => return Err(invalid("guardrails must be a non-empty list")),
            None => return Err(invalid("missing guardrails")),
        };

        let mut guardrails = BTreeMap::new();
        for entry in entries {
            let entry = entry
                .as_object()
                .ok_or_else(|| invalid("guardrail entry must be an object"))?;

            let id = entry
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| invalid("guardrail id must be a string"))
                .and_then(GuardrailId::parse)?;
            let title = non_blank(entry.get("title"))
                .ok_or_else(|| invalid(format!("bad title for {}", id)))?;
            let category = non_blank(entry.get("category"))
                .ok_or_else(|| invalid(format!("bad category for {}", id)))?;

            if guardrails.contains_key(&id) {
                return Err(invalid(format!("duplicate {}", id)));
            }
            guardrails.insert(id, Guardrail { id, title, category });
        }

        tracing::debug!(version = %version, count = guardrails.len(), "Guardrail registry loaded");

        Ok(Self {
            version,
            guardrails,
        })
    }

    /// Catalog version string
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Number of guardrails
    pub fn len(&self) -> usize {
        self.guardrails.len()
    }

    /// True when the registry is empty (never the case for a loaded catalog)
    pub fn is_empty(&self) -> bool {
        self.guardrails.is_empty()
    }

    /// Look up one guardrail
    pub fn get(&self, id: &GuardrailId) -> Option<&Guardrail> {
        self.guardrails.get(id)
    }

    /// All known ids, ascending
    pub fn ids(&self) -> Vec<GuardrailId> {
        self.guardrails.keys().copied().collect()
    }

    /// Fail unless every id is present; the error lists all unknown ids, sorted
    pub fn require_all(&self, ids: &[GuardrailId]) -> Result<()> {
        let unknown: BTreeSet<GuardrailId> = ids
            .iter()
            .filter(|id| !self.guardrails.contains_key(id))
            .copied()
            .collect();
        if unknown.is_empty() {
            return Ok(());
        }
        Err(AdaptiveError::GuardrailUnknown {
            ids: unknown.iter().map(ToString::to_string).collect(),
        })
    }

    /// Display titles keyed by id; fails like [`Self::require_all`]
    pub fn titles_for(&self, ids: &[GuardrailId]) -> Result<BTreeMap<String, String>> {
        self.require_all(ids)?;
        Ok(ids
            .iter()
            .filter_map(|id| self.guardrails.get(id))
            .map(|g| (g.id.to_string(), g.title.clone()))
            .collect())
    }
}

fn invalid(reason: impl Into<String>) -> AdaptiveError {
    AdaptiveError::RegistryInvalid(reason.into())
}

fn non_blank(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

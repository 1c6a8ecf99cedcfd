//! Analysis configuration
//!
//! Thresholds and scoring weights are explicit value types with fixed
//! defaults. Every struct deserializes with `#[serde(default)]`, so a
//! partial JSON document only overrides the fields it names.

use crate::error::{AdaptiveError, Result};
use crate::window::DEFAULT_WINDOW_CAPACITY;
use serde::{Deserialize, Serialize};

/// Thresholds for reason-id spike detection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzeConfig {
    /// Minimum occurrences of one reason id
    pub reason_spike_min_count: u64,

    /// Minimum share of the window held by one reason id
    pub reason_spike_min_ratio: f64,
}

impl Default for AnalyzeConfig {
    fn default() -> Self {
        Self {
            reason_spike_min_count: 5,
            reason_spike_min_ratio: 0.10,
        }
    }
}

/// Thresholds for cross-node correlation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Minimum number of distinct nodes reporting a reason id
    pub min_nodes: u64,

    /// Minimum share of all observed nodes reporting a reason id
    pub min_nodes_ratio: f64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            min_nodes: 3,
            min_nodes_ratio: 0.50,
        }
    }
}

/// Weights applied to the four confidence signals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceWeights {
    pub recurrence: f64,
    pub severity: f64,
    pub reproducibility: f64,
    pub cross_layer: f64,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            recurrence: 0.35,
            severity: 0.25,
            reproducibility: 0.20,
            cross_layer: 0.20,
        }
    }
}

impl ConfidenceWeights {
    /// Weights must be finite and non-negative
    pub fn validate(&self) -> Result<()> {
        let named = [
            ("recurrence", self.recurrence),
            ("severity", self.severity),
            ("reproducibility", self.reproducibility),
            ("cross_layer", self.cross_layer),
        ];
        for (name, weight) in named {
            if !weight.is_finite() || weight < 0.0 {
                return Err(AdaptiveError::Config(format!(
                    "confidence weight '{}' must be finite and >= 0, got {}",
                    name, weight
                )));
            }
        }
        Ok(())
    }
}

/// Everything the report builder needs besides its inputs
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub analyze: AnalyzeConfig,
    pub correlation: CorrelationConfig,
    pub weights: ConfidenceWeights,
}

impl ReportConfig {
    /// Validate thresholds and weights
    pub fn validate(&self) -> Result<()> {
        unit_ratio("analyze.reason_spike_min_ratio", self.analyze.reason_spike_min_ratio)?;
        unit_ratio("correlation.min_nodes_ratio", self.correlation.min_nodes_ratio)?;
        self.weights.validate()
    }
}

/// Top-level configuration document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveConfig {
    /// Evidence window capacity
    pub window_capacity: usize,

    /// Report builder settings
    pub report: ReportConfig,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            report: ReportConfig::default(),
        }
    }
}

impl AdaptiveConfig {
    /// Parse a JSON document and validate it
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| AdaptiveError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        if self.window_capacity == 0 {
            return Err(AdaptiveError::Config(
                "window_capacity must be > 0".to_string(),
            ));
        }
        self.report.validate()
    }
}

fn unit_ratio(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(AdaptiveError::Config(format!(
            "{} must be in [0.0, 1.0], got {}",
            name, value
        )));
    }
    Ok(())
}

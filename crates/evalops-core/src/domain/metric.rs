//! Metric results produced by scoring packs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Discriminator for how a metric was computed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Deterministic check, no I/O.
    Rule,

    /// Delegated to an external judge collaborator.
    Judge,
}

/// Scalar value of a metric.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MetricValue {
    Bool(bool),
    Number(f64),
}

impl MetricValue {
    /// Numeric view: booleans map to 1.0 / 0.0.
    pub fn as_f64(&self) -> f64 {
        match self {
            MetricValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            MetricValue::Number(n) => *n,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetricValue::Bool(b) => Some(*b),
            MetricValue::Number(_) => None,
        }
    }
}

impl From<bool> for MetricValue {
    fn from(b: bool) -> Self {
        MetricValue::Bool(b)
    }
}

impl From<f64> for MetricValue {
    fn from(n: f64) -> Self {
        MetricValue::Number(n)
    }
}

/// Single metric output from one scoring pack invocation.
///
/// Never mutated after creation. The `kind` tag is what the engine uses to
/// partition metrics into rule vs. judge buckets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricResult {
    /// Metric name, e.g. `task_success` or `judge_score`.
    pub name: String,

    /// Scalar value (numeric or boolean).
    pub value: MetricValue,

    /// How this metric was computed.
    pub kind: MetricKind,

    /// Pack-specific detail fields (reason, reasoning, model, ...).
    #[serde(default)]
    pub details: BTreeMap<String, serde_json::Value>,
}

impl MetricResult {
    /// Construct a metric with an empty detail map.
    pub fn new(name: impl Into<String>, value: impl Into<MetricValue>, kind: MetricKind) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            kind,
            details: BTreeMap::new(),
        }
    }

    /// Attach a detail field.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

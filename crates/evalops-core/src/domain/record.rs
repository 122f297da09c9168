//! Evaluation records and the per-run aggregate built from them.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::subject::{SubjectResponse, ToolCall};

use super::metric::MetricResult;
use super::testcase::Testcase;

/// Normalized subject output captured in a record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SubjectOutput {
    pub answer: String,
}

/// Metadata about one subject invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResponseMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,

    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,

    /// Session graph as reported, `{}` when the subject has none.
    #[serde(default)]
    pub session_graph: serde_json::Value,
}

impl ResponseMeta {
    /// Build metadata from a normalized subject response.
    pub fn from_response(response: &SubjectResponse) -> Self {
        Self {
            latency_ms: response.latency_ms,
            tool_calls: response.tool_calls.clone(),
            session_graph: response
                .session_graph
                .clone()
                .unwrap_or_else(|| serde_json::json!({})),
        }
    }
}

/// Full evaluation record for a single testcase.
///
/// One record per (version, testcase) pair, owned by the run that created
/// it. Written once; a correction is a new record, never an in-place
/// update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvalRecord {
    /// Deterministic identifier: `subject_id:version_id:testcase_id`.
    pub eval_id: String,

    pub subject_id: String,
    pub version_id: String,

    /// The golden row this record evaluates.
    pub testcase: Testcase,

    pub output: SubjectOutput,
    pub response_meta: ResponseMeta,

    pub rule_metrics: Vec<MetricResult>,
    pub judge_metrics: Vec<MetricResult>,
}

impl EvalRecord {
    /// Derive the deterministic eval id so re-running the same version +
    /// testcase yields a stable identifier for dedup and audit.
    pub fn derive_eval_id(subject_id: &str, version_id: &str, testcase_id: &str) -> String {
        format!("{subject_id}:{version_id}:{testcase_id}")
    }

    /// First `judge_score` metric value, if any.
    pub fn judge_score(&self) -> Option<f64> {
        self.judge_metrics
            .iter()
            .find(|m| m.name == "judge_score")
            .map(|m| m.value.as_f64())
    }

    /// First `task_success` metric value, if any.
    pub fn task_success(&self) -> Option<bool> {
        self.rule_metrics
            .iter()
            .find(|m| m.name == "task_success")
            .and_then(|m| m.value.as_bool())
    }
}

/// Aggregate metrics computed over one full run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SummaryMetrics {
    pub judge_score_avg: Option<f64>,
    pub judge_score_p95: Option<f64>,
    pub latency_ms_p95: Option<f64>,
    pub task_success_rate: Option<f64>,
}

/// Result of a full evaluation run.
///
/// Derived and recomputed every run; only the constituent records are
/// persisted, never the summary itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregatedSummary {
    pub subject_id: String,
    pub version_id: String,

    /// Resolved golden set path the run used.
    pub golden_path: PathBuf,

    /// SHA-256 hex digest of the golden file contents.
    pub golden_digest: String,

    pub num_testcases: usize,
    pub metrics: SummaryMetrics,

    /// All records, inlined for downstream consumers.
    pub records: Vec<EvalRecord>,
}

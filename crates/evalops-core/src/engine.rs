//! The evaluation engine: drives golden testcases through the subject and
//! every registered scoring pack, aggregates the results, and persists
//! history.
//!
//! Failure policy is fail-soft everywhere below the batch level: one bad
//! input row, one failing pack, or one failed side-log write never stops
//! the run. Only a missing or empty golden set aborts with no partial
//! summary.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::domain::{
    load_golden_set, AggregatedSummary, EvalOpsError, EvalRecord, ResponseMeta, Result,
    SubjectOutput, SubjectSpec, SummaryMetrics, Testcase,
};
use crate::obs::{emit_case_evaluated, emit_eval_finished, emit_eval_started, EvalSpan};
use crate::packs::{ScoringPack, JUDGE_SCORE, TASK_SUCCESS};
use crate::stats;
use crate::store::{MemoryStore, TraceStore};
use crate::subject::{SubjectClient, SubjectResponse};

/// Runs full evaluations for one subject.
///
/// Owns the `EvalRecord` lifecycle for each run it executes. Collaborators
/// are constructed by the caller and passed in; the engine holds no global
/// state.
pub struct EvaluationEngine {
    subject: Arc<dyn SubjectClient>,
    packs: Vec<Arc<dyn ScoringPack>>,
    spec: SubjectSpec,
    traces: TraceStore,
    memory: MemoryStore,
    base_dir: PathBuf,
}

impl EvaluationEngine {
    pub fn new(
        subject: Arc<dyn SubjectClient>,
        packs: Vec<Arc<dyn ScoringPack>>,
        spec: SubjectSpec,
        traces: TraceStore,
        memory: MemoryStore,
    ) -> Self {
        Self {
            subject,
            packs,
            spec,
            traces,
            memory,
            base_dir: PathBuf::from("."),
        }
    }

    /// Directory relative golden paths resolve against (default `.`).
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Run the full evaluation suite for this subject version.
    ///
    /// `version_id` defaults to the spec's version. The error side carries
    /// the resolved golden path when the set is missing or empty; no
    /// partial summary is produced in that case.
    pub async fn run_full_eval(&self, version_id: Option<&str>) -> Result<AggregatedSummary> {
        let version = version_id.unwrap_or(&self.spec.version).to_string();
        let _span = EvalSpan::enter(&self.spec.subject_id, &version);

        let golden_path = self.resolve_golden_path()?;
        let testcases = load_golden_set(&golden_path)?;
        let golden_digest = file_digest(&golden_path)?;

        emit_eval_started(&self.spec.subject_id, &version, testcases.len());

        let mut records = Vec::with_capacity(testcases.len());
        for testcase in &testcases {
            let record = self.run_single_case(testcase, &version).await;
            self.persist_record(&record, &golden_digest);
            records.push(record);
        }

        let metrics = aggregate(&records);
        emit_eval_finished(
            &self.spec.subject_id,
            &version,
            records.len(),
            metrics.task_success_rate,
        );

        Ok(AggregatedSummary {
            subject_id: self.spec.subject_id.clone(),
            version_id: version,
            golden_path,
            golden_digest,
            num_testcases: records.len(),
            metrics,
            records,
        })
    }

    fn resolve_golden_path(&self) -> Result<PathBuf> {
        let declared = self.spec.evaluation.golden_path.as_ref().ok_or_else(|| {
            EvalOpsError::InvalidSubjectSpec("evaluation.golden_path is not set".to_string())
        })?;
        if declared.is_absolute() {
            Ok(declared.clone())
        } else {
            Ok(self.base_dir.join(declared))
        }
    }

    /// Convert a testcase's opaque input into the subject request payload.
    ///
    /// String inputs are parsed as JSON; a parse failure substitutes an
    /// empty request so one bad row never stops the run.
    pub fn build_request(testcase: &Testcase) -> Value {
        match &testcase.input {
            Value::String(raw) => {
                let raw = raw.trim();
                if raw.is_empty() {
                    return json!({});
                }
                match serde_json::from_str(raw) {
                    Ok(value) => value,
                    Err(e) => {
                        warn!(
                            testcase_id = %testcase.id,
                            error = %e,
                            "failed to parse testcase input, substituting empty request"
                        );
                        json!({})
                    }
                }
            }
            other => other.clone(),
        }
    }

    async fn run_single_case(&self, testcase: &Testcase, version_id: &str) -> EvalRecord {
        let request = Self::build_request(testcase);

        let response = match self.subject.run_query(&request, None).await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    testcase_id = %testcase.id,
                    error = %e,
                    "subject call failed, scoring an empty response"
                );
                SubjectResponse::default()
            }
        };

        let mut rule_metrics = Vec::new();
        let mut judge_metrics = Vec::new();
        for pack in &self.packs {
            match pack.evaluate(testcase, &response, &self.spec).await {
                Ok(metrics) => {
                    for metric in metrics {
                        match metric.kind {
                            crate::domain::MetricKind::Rule => rule_metrics.push(metric),
                            crate::domain::MetricKind::Judge => judge_metrics.push(metric),
                        }
                    }
                }
                Err(e) => crate::obs::emit_pack_failed(pack.name(), &testcase.id, &e),
            }
        }

        let eval_id =
            EvalRecord::derive_eval_id(&self.spec.subject_id, version_id, &testcase.id);
        emit_case_evaluated(&eval_id, rule_metrics.len() + judge_metrics.len());

        EvalRecord {
            eval_id,
            subject_id: self.spec.subject_id.clone(),
            version_id: version_id.to_string(),
            testcase: testcase.clone(),
            output: SubjectOutput {
                answer: response.answer.clone(),
            },
            response_meta: ResponseMeta::from_response(&response),
            rule_metrics,
            judge_metrics,
        }
    }

    /// Persist one record's outcome to memory and its flattened projection
    /// to the trace log. Failures are logged and swallowed; the evaluation
    /// result must not be lost because a side-log write failed.
    fn persist_record(&self, record: &EvalRecord, golden_digest: &str) {
        if let Err(e) = self.memory.record_eval_outcome(record) {
            warn!(eval_id = %record.eval_id, error = %e, "failed to record eval outcome to memory");
        }
        let projection = trace_projection(record, golden_digest);
        if let Err(e) = self.traces.append_event(&projection) {
            warn!(eval_id = %record.eval_id, error = %e, "failed to append trace event");
        }
    }
}

/// Aggregate the fixed summary metrics over a record set.
pub fn aggregate(records: &[EvalRecord]) -> SummaryMetrics {
    let judge_scores: Vec<f64> = records
        .iter()
        .flat_map(|r| &r.judge_metrics)
        .filter(|m| m.name == JUDGE_SCORE)
        .map(|m| m.value.as_f64())
        .collect();

    let latencies: Vec<f64> = records
        .iter()
        .filter_map(|r| r.response_meta.latency_ms)
        .collect();

    let successes: Vec<bool> = records
        .iter()
        .flat_map(|r| &r.rule_metrics)
        .filter(|m| m.name == TASK_SUCCESS)
        .filter_map(|m| m.value.as_bool())
        .collect();

    SummaryMetrics {
        judge_score_avg: stats::mean(&judge_scores),
        judge_score_p95: stats::p95(&judge_scores),
        latency_ms_p95: stats::p95(&latencies),
        task_success_rate: stats::pass_rate(&successes),
    }
}

/// Flattened per-case projection written to the trace log.
fn trace_projection(record: &EvalRecord, golden_digest: &str) -> Map<String, Value> {
    let judge_score = record.judge_score();
    let judge_reasoning = record
        .judge_metrics
        .iter()
        .find(|m| m.name == JUDGE_SCORE)
        .and_then(|m| m.details.get("reasoning"))
        .cloned();

    let mut event = Map::new();
    event.insert(
        "subject_id".to_string(),
        Value::String(record.subject_id.clone()),
    );
    event.insert(
        "version_id".to_string(),
        Value::String(record.version_id.clone()),
    );
    event.insert(
        "testcase_id".to_string(),
        Value::String(record.testcase.id.clone()),
    );
    event.insert("input".to_string(), record.testcase.input.clone());
    event.insert(
        "answer".to_string(),
        Value::String(record.output.answer.clone()),
    );
    event.insert(
        "latency_ms".to_string(),
        record
            .response_meta
            .latency_ms
            .map(Value::from)
            .unwrap_or(Value::Null),
    );
    event.insert(
        "judge_score".to_string(),
        judge_score.map(Value::from).unwrap_or(Value::Null),
    );
    event.insert(
        "judge_reasoning".to_string(),
        judge_reasoning.unwrap_or(Value::Null),
    );
    event.insert(
        "tool_calls".to_string(),
        serde_json::to_value(&record.response_meta.tool_calls).unwrap_or(Value::Array(Vec::new())),
    );
    event.insert(
        "session_graph".to_string(),
        record.response_meta.session_graph.clone(),
    );
    event.insert(
        "golden_digest".to_string(),
        Value::String(golden_digest.to_string()),
    );
    event
}

fn file_digest(path: &std::path::Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

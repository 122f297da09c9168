//! Artifacts and summaries derived from eval history.
//!
//! `write_summary_json` persists one run's aggregate; `summarize_traces` /
//! `render_metrics_md` build the cross-version report from the trace log.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::AggregatedSummary;
use crate::stats;

/// Judge scores below this count as failing in the cross-version report.
const FAILING_SCORE_THRESHOLD: f64 = 4.0;

/// Per-version aggregate over the trace log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionMetrics {
    pub version_id: String,
    pub num_traces: usize,
    pub avg_judge_score: Option<f64>,
    pub avg_latency_ms: Option<f64>,
    pub p50_latency_ms: Option<f64>,
    pub p95_latency_ms: Option<f64>,
    pub avg_tool_calls: Option<f64>,
    /// Traces whose judge score fell below 4.
    pub failing: usize,
    /// Share of scored traces at or above 4.
    pub pass_rate: Option<f64>,
}

/// Write one run's summary as a pretty JSON artifact.
pub fn write_summary_json(path: &Path, summary: &AggregatedSummary) -> Result<()> {
    let content = serde_json::to_string_pretty(summary).context("serialize eval summary")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Group loaded trace rows by `version_id` and aggregate each group.
///
/// Rows without a version (including synthetic corruption records) land in
/// the `"unknown"` group. Output is sorted by version id for stable
/// rendering.
pub fn summarize_traces(traces: &[Map<String, Value>]) -> Vec<VersionMetrics> {
    let mut by_version: BTreeMap<String, Vec<&Map<String, Value>>> = BTreeMap::new();
    for trace in traces {
        let version = trace
            .get("version_id")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        by_version.entry(version).or_default().push(trace);
    }

    by_version
        .into_iter()
        .map(|(version_id, rows)| {
            let scores: Vec<f64> = rows
                .iter()
                .filter_map(|r| r.get("judge_score"))
                .filter_map(Value::as_f64)
                .collect();
            let latencies: Vec<f64> = rows
                .iter()
                .filter_map(|r| r.get("latency_ms"))
                .filter_map(Value::as_f64)
                .collect();
            let tool_call_counts: Vec<f64> = rows
                .iter()
                .filter_map(|r| r.get("tool_calls"))
                .filter_map(Value::as_array)
                .map(|calls| calls.len() as f64)
                .collect();

            let failing = scores
                .iter()
                .filter(|s| **s < FAILING_SCORE_THRESHOLD)
                .count();
            let pass_rate = if scores.is_empty() {
                None
            } else {
                Some((scores.len() - failing) as f64 / scores.len() as f64)
            };

            VersionMetrics {
                version_id,
                num_traces: rows.len(),
                avg_judge_score: stats::mean(&scores),
                avg_latency_ms: stats::mean(&latencies),
                p50_latency_ms: stats::percentile_nearest_rank(&latencies, 0.5),
                p95_latency_ms: stats::p95(&latencies),
                avg_tool_calls: stats::mean(&tool_call_counts),
                failing,
                pass_rate,
            }
        })
        .collect()
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{v:.precision$}"),
        None => "N/A".to_string(),
    }
}

/// Render the cross-version metrics report as markdown.
pub fn render_metrics_md(metrics: &[VersionMetrics]) -> String {
    let mut out = String::new();
    out.push_str("# Metrics Summary\n");
    for m in metrics {
        out.push_str(&format!("\n## Version: {}\n", m.version_id));
        out.push_str(&format!("- traces: {}\n", m.num_traces));
        out.push_str(&format!(
            "- avg judge score: {}\n",
            fmt_opt(m.avg_judge_score, 2)
        ));
        out.push_str(&format!(
            "- avg latency: {} ms\n",
            fmt_opt(m.avg_latency_ms, 1)
        ));
        out.push_str(&format!(
            "- p50 latency: {} ms\n",
            fmt_opt(m.p50_latency_ms, 1)
        ));
        out.push_str(&format!(
            "- p95 latency: {} ms\n",
            fmt_opt(m.p95_latency_ms, 1)
        ));
        out.push_str(&format!(
            "- avg tool calls: {}\n",
            fmt_opt(m.avg_tool_calls, 2)
        ));
        out.push_str(&format!("- failing (<4): {}\n", m.failing));
        out.push_str(&format!(
            "- pass rate: {}\n",
            match m.pass_rate {
                Some(rate) => format!("{:.1}%", rate * 100.0),
                None => "N/A".to_string(),
            }
        ));
    }
    out
}

//! Pluggable scoring packs.
//!
//! A pack computes zero or more named metrics for one (testcase, response)
//! pair. The engine runs every registered pack per case and isolates pack
//! failures from each other and from the batch.

use async_trait::async_trait;

use crate::domain::{MetricResult, Result, SubjectSpec, Testcase};
use crate::subject::SubjectResponse;

pub mod judge;
pub mod rule;

pub use judge::{
    judge_disabled_by_env, parse_judge_verdict, JudgeClient, JudgeScorePack, JudgeVerdict,
    JUDGE_KILL_SWITCH_ENV,
};
pub use rule::AnswerRulePack;

/// Name of the rule-based success metric.
pub const TASK_SUCCESS: &str = "task_success";

/// Name of the judge score metric.
pub const JUDGE_SCORE: &str = "judge_score";

/// Contract every scoring pack satisfies.
#[async_trait]
pub trait ScoringPack: Send + Sync {
    /// Pack name, used in logs when a pack fails.
    fn name(&self) -> &str;

    /// Compute metrics for a single case. An `Err` is caught by the
    /// engine and contributes zero metrics for the case.
    async fn evaluate(
        &self,
        testcase: &Testcase,
        response: &SubjectResponse,
        spec: &SubjectSpec,
    ) -> Result<Vec<MetricResult>>;
}

/// Metric selection derived from `SubjectSpec.evaluation.metrics`.
///
/// An omitted list means every available metric (default-permissive); an
/// explicit empty list computes nothing. Aggregate names such as
/// `judge_score_p95` enable the base `judge_score` metric.
#[derive(Debug, Clone, Default)]
pub struct MetricFilter {
    selected: Option<Vec<String>>,
}

impl MetricFilter {
    /// Compute everything available.
    pub fn permissive() -> Self {
        Self { selected: None }
    }

    pub fn from_spec(spec: &SubjectSpec) -> Self {
        Self {
            selected: spec.evaluation.metrics.clone(),
        }
    }

    pub fn wants_task_success(&self) -> bool {
        match &self.selected {
            None => true,
            Some(names) => names.iter().any(|n| n == TASK_SUCCESS),
        }
    }

    pub fn wants_judge_score(&self) -> bool {
        match &self.selected {
            None => true,
            Some(names) => names.iter().any(|n| n.starts_with(JUDGE_SCORE)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_with_metrics(metrics: Option<Vec<&str>>) -> SubjectSpec {
        let mut spec = SubjectSpec::new("travel");
        spec.evaluation.metrics =
            metrics.map(|names| names.into_iter().map(String::from).collect());
        spec
    }

    #[test]
    fn test_omitted_list_is_permissive() {
        let filter = MetricFilter::from_spec(&spec_with_metrics(None));
        assert!(filter.wants_task_success());
        assert!(filter.wants_judge_score());
    }

    #[test]
    fn test_explicit_empty_list_computes_nothing() {
        let filter = MetricFilter::from_spec(&spec_with_metrics(Some(vec![])));
        assert!(!filter.wants_task_success());
        assert!(!filter.wants_judge_score());
    }

    #[test]
    fn test_aggregate_name_enables_base_judge_metric() {
        let filter = MetricFilter::from_spec(&spec_with_metrics(Some(vec![
            "judge_score_p95",
            "latency_ms_p95",
        ])));
        assert!(filter.wants_judge_score());
        assert!(!filter.wants_task_success());
    }

    #[test]
    fn test_exact_task_success_selection() {
        let filter = MetricFilter::from_spec(&spec_with_metrics(Some(vec!["task_success"])));
        assert!(filter.wants_task_success());
        assert!(!filter.wants_judge_score());
    }
}

//! Rule-based metrics: deterministic checks, no I/O.

use async_trait::async_trait;

use crate::domain::{MetricKind, MetricResult, Result, SubjectSpec, Testcase};
use crate::subject::SubjectResponse;

use super::{MetricFilter, ScoringPack, TASK_SUCCESS};

/// Emits a boolean `task_success` from a non-empty-answer check.
#[derive(Debug, Clone, Default)]
pub struct AnswerRulePack {
    filter: MetricFilter,
}

impl AnswerRulePack {
    pub fn new(filter: MetricFilter) -> Self {
        Self { filter }
    }

    pub fn from_spec(spec: &SubjectSpec) -> Self {
        Self::new(MetricFilter::from_spec(spec))
    }
}

#[async_trait]
impl ScoringPack for AnswerRulePack {
    fn name(&self) -> &str {
        "answer_rules"
    }

    async fn evaluate(
        &self,
        _testcase: &Testcase,
        response: &SubjectResponse,
        _spec: &SubjectSpec,
    ) -> Result<Vec<MetricResult>> {
        if !self.filter.wants_task_success() {
            return Ok(Vec::new());
        }

        let success = !response.answer.trim().is_empty();
        let reason = if success {
            "non_empty_answer"
        } else {
            "empty_answer"
        };

        Ok(vec![MetricResult::new(
            TASK_SUCCESS,
            success,
            MetricKind::Rule,
        )
        .with_detail("reason", reason)])
    }
}

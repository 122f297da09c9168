//! Judge-based metrics: scoring delegated to an external collaborator.
//!
//! The judge is nondeterministic and its output is unreliable, so parsing
//! is a strict pipeline with an explicit fallback chain: code-fence strip
//! -> JSON parse -> standalone-digit extraction -> zero-score default.
//! Parsing never fails; every raw response resolves to a real verdict.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, info};

use crate::domain::{MetricKind, MetricResult, Result, SubjectSpec, Testcase};
use crate::subject::SubjectResponse;

use super::{MetricFilter, ScoringPack, JUDGE_SCORE};

/// Environment kill switch: set to `1`/`true`/`yes`/`on` to skip judge
/// metrics entirely.
pub const JUDGE_KILL_SWITCH_ENV: &str = "EVALOPS_DISABLE_JUDGE";

const DEFAULT_RUBRIC_ID: &str = "generic_quality_v1";

/// External scoring collaborator. Implementations own transport, auth,
/// and model selection plumbing; the pack owns prompt shape and parsing.
#[async_trait]
pub trait JudgeClient: Send + Sync {
    /// Send one scoring prompt and return the judge's raw text output.
    async fn score(&self, prompt: &str) -> Result<String>;
}

/// Resolved judge output after the fallback chain.
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeVerdict {
    /// Score on the 1-5 scale, or 0.0 when nothing could be extracted.
    pub score: f64,
    pub rationale: String,
    /// The judge's raw text, kept for audit.
    pub raw: String,
}

/// Drop one leading and one trailing code-fence line, if present.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let mut lines: Vec<&str> = trimmed.lines().collect();
    if lines
        .first()
        .map(|l| l.trim_start().starts_with("```"))
        .unwrap_or(false)
    {
        lines.remove(0);
    }
    if lines
        .last()
        .map(|l| l.trim_start().starts_with("```"))
        .unwrap_or(false)
    {
        lines.pop();
    }
    lines.join("\n").trim().to_string()
}

fn digit_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b([1-5])\b").expect("valid digit pattern"))
}

/// Resolve raw judge output into a verdict. Never errors.
pub fn parse_judge_verdict(raw: &str) -> JudgeVerdict {
    let raw = raw.trim().to_string();
    let cleaned = strip_code_fences(&raw);

    if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(&cleaned) {
        if let Some(obj) = parsed.as_object() {
            let score = obj.get("score").and_then(|v| v.as_f64()).unwrap_or(0.0);
            let rationale = obj
                .get("rationale")
                .or_else(|| obj.get("reasoning"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| raw.clone());
            return JudgeVerdict {
                score,
                rationale,
                raw,
            };
        }
    }

    if let Some(captures) = digit_pattern().captures(&raw) {
        let score: f64 = captures[1].parse().unwrap_or(0.0);
        return JudgeVerdict {
            score,
            rationale: raw.clone(),
            raw,
        };
    }

    JudgeVerdict {
        score: 0.0,
        rationale: raw.clone(),
        raw,
    }
}

/// Whether the environment kill switch is engaged.
pub fn judge_disabled_by_env() -> bool {
    std::env::var(JUDGE_KILL_SWITCH_ENV)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// Emits a numeric `judge_score` (1-5) from one judge call per case.
pub struct JudgeScorePack {
    judge: Arc<dyn JudgeClient>,
    model: String,
    rubric_id: String,
    filter: MetricFilter,
    disabled: bool,
}

impl JudgeScorePack {
    /// Build from the spec's judge configuration. The kill-switch env is
    /// read once here, not per case.
    pub fn from_spec(judge: Arc<dyn JudgeClient>, spec: &SubjectSpec) -> Self {
        let model = spec
            .evaluation
            .judge
            .model
            .clone()
            .unwrap_or_else(|| "default".to_string());
        let rubric_id = spec
            .evaluation
            .judge
            .rubric_id
            .clone()
            .unwrap_or_else(|| DEFAULT_RUBRIC_ID.to_string());
        Self {
            judge,
            model,
            rubric_id,
            filter: MetricFilter::from_spec(spec),
            disabled: judge_disabled_by_env(),
        }
    }

    /// Override the disabled flag (kill switch equivalent in code).
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    fn build_prompt(&self, testcase: &Testcase, answer: &str) -> String {
        format!(
            "You are an expert evaluator.\n\
             \n\
             Rubric ID: {rubric}\n\
             \n\
             GOLDEN TESTCASE:\n\
             - Judge question: {question}\n\
             - Expected behavior: {expected}\n\
             \n\
             MODEL ANSWER:\n\
             {answer}\n\
             \n\
             Score the answer on a scale of 1 to 5, where:\n\
             1 = Very poor\n\
             2 = Weak\n\
             3 = Acceptable\n\
             4 = Good\n\
             5 = Excellent\n\
             \n\
             Return ONLY a JSON object with:\n\
             - \"score\": number (1-5)\n\
             - \"rationale\": short explanation\n",
            rubric = self.rubric_id,
            question = testcase.judge_question,
            expected = testcase.expected_behavior,
            answer = answer.trim(),
        )
    }
}

#[async_trait]
impl ScoringPack for JudgeScorePack {
    fn name(&self) -> &str {
        "judge_score"
    }

    async fn evaluate(
        &self,
        testcase: &Testcase,
        response: &SubjectResponse,
        _spec: &SubjectSpec,
    ) -> Result<Vec<MetricResult>> {
        if !self.filter.wants_judge_score() {
            return Ok(Vec::new());
        }
        if self.disabled {
            info!(
                testcase_id = %testcase.id,
                "judge metric disabled, skipping"
            );
            return Ok(Vec::new());
        }

        let prompt = self.build_prompt(testcase, &response.answer);
        let raw = self.judge.score(&prompt).await?;
        debug!(testcase_id = %testcase.id, raw_len = raw.len(), "judge responded");

        let verdict = parse_judge_verdict(&raw);
        Ok(vec![MetricResult::new(
            JUDGE_SCORE,
            verdict.score,
            MetricKind::Judge,
        )
        .with_detail("reasoning", verdict.rationale)
        .with_detail("model", self.model.clone())
        .with_detail("rubric_id", self.rubric_id.clone())
        .with_detail("raw_response", verdict.raw)])
    }
}

//! Structured observability hooks for the evaluation lifecycle.
//!
//! Emission functions for the key events: run start, per-case result,
//! pack failure, run finish, changeset apply. Plus an eval-scoped tracing
//! span via the `EvalSpan` RAII guard.
//!
//! Events are emitted at `info!` level; pack failures at `warn!`.

use tracing::{info, warn};

/// RAII guard that enters an eval-scoped tracing span.
///
/// While held, all tracing calls carry `subject_id` and `version_id`.
pub struct EvalSpan {
    _span: tracing::span::EnteredSpan,
}

impl EvalSpan {
    pub fn enter(subject_id: &str, version_id: &str) -> Self {
        let span = tracing::info_span!(
            "evalops.run",
            subject_id = %subject_id,
            version_id = %version_id,
        );
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: full evaluation started.
pub fn emit_eval_started(subject_id: &str, version_id: &str, num_testcases: usize) {
    info!(
        event = "eval.started",
        subject_id = %subject_id,
        version_id = %version_id,
        num_testcases = num_testcases,
    );
}

/// Emit event: one case evaluated.
pub fn emit_case_evaluated(eval_id: &str, metric_count: usize) {
    info!(event = "case.evaluated", eval_id = %eval_id, metrics = metric_count);
}

/// Emit event: a scoring pack failed for one case (warning level).
pub fn emit_pack_failed(pack: &str, testcase_id: &str, error: &dyn std::fmt::Display) {
    warn!(
        event = "pack.failed",
        pack = %pack,
        testcase_id = %testcase_id,
        error = %error,
    );
}

/// Emit event: full evaluation finished with aggregate numbers.
pub fn emit_eval_finished(
    subject_id: &str,
    version_id: &str,
    num_testcases: usize,
    task_success_rate: Option<f64>,
) {
    info!(
        event = "eval.finished",
        subject_id = %subject_id,
        version_id = %version_id,
        num_testcases = num_testcases,
        task_success_rate = task_success_rate,
    );
}

/// Emit event: changeset applied.
pub fn emit_changeset_applied(new_config_path: &str, patches: usize, testcases: usize) {
    info!(
        event = "changeset.applied",
        new_config_path = %new_config_path,
        patches = patches,
        testcases = testcases,
    );
}

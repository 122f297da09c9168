//! Domain models for evalops.
//!
//! Canonical definitions for the core entities:
//! - `Testcase`: one golden row driven through the subject
//! - `MetricResult`: one scored metric from a scoring pack
//! - `EvalRecord` / `AggregatedSummary`: per-case and per-run results
//! - `SubjectSpec`: on-disk description of the subject under test

pub mod error;
pub mod metric;
pub mod record;
pub mod subject_spec;
pub mod testcase;

pub use error::{EvalOpsError, Result};
pub use metric::{MetricKind, MetricResult, MetricValue};
pub use record::{AggregatedSummary, EvalRecord, ResponseMeta, SubjectOutput, SummaryMetrics};
pub use subject_spec::{EvaluationConfig, JudgeConfig, RuntimeConfig, SubjectSpec};
pub use testcase::{load_golden_set, Testcase, GOLDEN_COLUMNS};

//! evalops Core Library
//!
//! Automated quality checks for black-box agents: an evaluation engine
//! driving golden testcases through pluggable scoring packs, append-only
//! trace and memory stores, and a changeset engine for versioned
//! configuration changes.

pub mod changeset;
pub mod domain;
pub mod engine;
pub mod obs;
pub mod packs;
pub mod planner;
pub mod reporting;
pub mod stats;
pub mod store;
pub mod subject;
pub mod telemetry;

pub use domain::{
    load_golden_set, AggregatedSummary, EvalOpsError, EvalRecord, EvaluationConfig, JudgeConfig,
    MetricKind, MetricResult, MetricValue, ResponseMeta, Result, RuntimeConfig, SubjectOutput,
    SubjectSpec, SummaryMetrics, Testcase,
};

pub use changeset::{
    apply_patches, set_by_dot_path, Changeset, ChangesetEngine, ChangesetOutcome, ConfigPatch,
    NewTestcase, SET_OP,
};

pub use engine::{aggregate, EvaluationEngine};

pub use packs::{
    parse_judge_verdict, AnswerRulePack, JudgeClient, JudgeScorePack, JudgeVerdict, MetricFilter,
    ScoringPack, JUDGE_SCORE, TASK_SUCCESS,
};

pub use planner::ChangesetPlanner;

pub use reporting::{render_metrics_md, summarize_traces, write_summary_json, VersionMetrics};

pub use store::{
    BestPractice, JsonlStore, MemoryEntryKind, MemoryFilter, MemoryStore, PromptTweak, TraceStore,
};

pub use subject::{SubjectClient, SubjectResponse, ToolCall};

pub use obs::{
    emit_case_evaluated, emit_changeset_applied, emit_eval_finished, emit_eval_started,
    emit_pack_failed, EvalSpan,
};
pub use telemetry::{init_tracing, LogFormat};

/// evalops version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

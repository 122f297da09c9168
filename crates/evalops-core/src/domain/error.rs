//! Domain-level error taxonomy for evalops.

use std::path::PathBuf;

/// evalops domain errors.
#[derive(Debug, thiserror::Error)]
pub enum EvalOpsError {
    #[error("golden set not found: {path}")]
    GoldenSetMissing { path: PathBuf },

    #[error("golden set has no testcases: {path}")]
    GoldenSetEmpty { path: PathBuf },

    #[error("invalid subject spec: {0}")]
    InvalidSubjectSpec(String),

    #[error("subject client error: {0}")]
    Subject(String),

    #[error("judge client error: {0}")]
    Judge(String),

    #[error("changeset schema error: {0}")]
    PatchSchema(String),

    #[error("unsupported patch op: {op}")]
    UnsupportedPatchOp { op: String },

    #[error("new testcase {testcase} missing required field: {field}")]
    RequiredFieldMissing { testcase: String, field: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for evalops domain operations.
pub type Result<T> = std::result::Result<T, EvalOpsError>;

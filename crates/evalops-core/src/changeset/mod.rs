//! Versioned configuration changesets.
//!
//! One canonical [`Changeset`] type consolidates the loosely-shaped
//! proposals an external planner emits. Validation happens at the
//! boundary ([`Changeset::from_value`]) with descriptive errors; the
//! engine ([`ChangesetEngine`]) only applies what it is given.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{EvalOpsError, Result};

pub mod engine;
pub mod golden;
pub mod merge;

pub use engine::{ChangesetEngine, ChangesetOutcome};
pub use golden::{append_testcases, next_auto_id, read_table, GoldenTable, REQUIRED_FIELDS};
pub use merge::{apply_patches, set_by_dot_path};

/// The only patch operation currently supported.
pub const SET_OP: &str = "set";

fn default_op() -> String {
    SET_OP.to_string()
}

/// A single config update on a JSON config using dot-path syntax.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigPatch {
    /// e.g. `"planning.clarification.enabled"`.
    pub path: String,

    #[serde(default = "default_op")]
    pub op: String,

    #[serde(default)]
    pub value: Value,
}

/// A proposed golden row. Required fields stay optional here so a sparse
/// proposal parses; the golden append step validates presence and fails
/// the whole batch on a gap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewTestcase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judge_question: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_behavior: Option<String>,

    /// Any further columns, preserved into the table.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl NewTestcase {
    pub fn new(
        input: impl Into<String>,
        judge_question: impl Into<String>,
        expected_behavior: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            input: Some(input.into()),
            judge_question: Some(judge_question.into()),
            expected_behavior: Some(expected_behavior.into()),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Required field by name, `None` when absent.
    pub fn required_field(&self, field: &str) -> Option<&str> {
        match field {
            "input" => self.input.as_deref(),
            "judge_question" => self.judge_question.as_deref(),
            "expected_behavior" => self.expected_behavior.as_deref(),
            _ => None,
        }
    }
}

/// A version upgrade proposal: config patches plus golden-set growth.
///
/// Ephemeral until [`ChangesetEngine::apply`] writes the derived config
/// and the appended rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Changeset {
    pub base_config_path: PathBuf,
    pub new_config_path: PathBuf,
    pub golden_set_path: PathBuf,

    #[serde(default)]
    pub config_patches: Vec<ConfigPatch>,

    #[serde(default)]
    pub new_testcases: Vec<NewTestcase>,

    #[serde(default)]
    pub notes: String,
}

impl Changeset {
    /// Validate and convert a loosely-typed proposal.
    ///
    /// Fails fast with a descriptive [`EvalOpsError::PatchSchema`] instead
    /// of letting a missing key surface deep inside file-writing code.
    pub fn from_value(value: Value) -> Result<Changeset> {
        let obj = value
            .as_object()
            .ok_or_else(|| EvalOpsError::PatchSchema("changeset must be a JSON object".into()))?;

        for key in ["base_config_path", "new_config_path", "golden_set_path"] {
            match obj.get(key) {
                Some(Value::String(_)) => {}
                Some(_) => {
                    return Err(EvalOpsError::PatchSchema(format!(
                        "changeset key '{key}' must be a string path"
                    )))
                }
                None => {
                    return Err(EvalOpsError::PatchSchema(format!(
                        "changeset missing required path key: {key}"
                    )))
                }
            }
        }

        if let Some(patches) = obj.get("config_patches") {
            let patches = patches.as_array().ok_or_else(|| {
                EvalOpsError::PatchSchema("changeset 'config_patches' must be an array".into())
            })?;
            for (index, patch) in patches.iter().enumerate() {
                let patch = patch.as_object().ok_or_else(|| {
                    EvalOpsError::PatchSchema(format!("config patch #{index} must be an object"))
                })?;
                if !matches!(patch.get("path"), Some(Value::String(_))) {
                    return Err(EvalOpsError::PatchSchema(format!(
                        "config patch #{index} missing string 'path'"
                    )));
                }
            }
        }

        if let Some(testcases) = obj.get("new_testcases") {
            if !testcases.is_array() {
                return Err(EvalOpsError::PatchSchema(
                    "changeset 'new_testcases' must be an array".into(),
                ));
            }
        }

        serde_json::from_value(value).map_err(|e| EvalOpsError::PatchSchema(e.to_string()))
    }

    /// Load a changeset from a JSON file via [`Changeset::from_value`].
    pub fn from_file(path: &std::path::Path) -> Result<Changeset> {
        let text = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&text)?;
        Self::from_value(value)
    }
}

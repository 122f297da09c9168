//! On-disk description of a subject under test.
//!
//! A `SubjectSpec` is a single JSON document carrying the subject's
//! identity, an opaque runtime section (endpoint, entrypoint, whatever the
//! client implementation needs), and the evaluation configuration (metric
//! selection, judge settings, golden set location).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::{EvalOpsError, Result};

fn default_version() -> String {
    "v1".to_string()
}

/// Opaque runtime description. The core never interprets `config`; client
/// implementations read what they need from it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RuntimeConfig {
    /// Runtime flavor, e.g. `"http"`.
    #[serde(default)]
    pub kind: String,

    #[serde(default)]
    pub config: BTreeMap<String, serde_json::Value>,
}

/// Judge collaborator settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JudgeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rubric_id: Option<String>,
}

/// Evaluation configuration for a subject.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EvaluationConfig {
    /// Desired metric names. `None` means "compute everything available";
    /// an explicit empty list computes nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Vec<String>>,

    #[serde(default)]
    pub judge: JudgeConfig,

    /// Golden set location, resolved against the engine's base directory
    /// when relative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub golden_path: Option<PathBuf>,
}

/// Complete subject description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubjectSpec {
    pub subject_id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub runtime: RuntimeConfig,

    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

impl SubjectSpec {
    /// Minimal spec for a subject id, defaults everywhere else.
    pub fn new(subject_id: impl Into<String>) -> Self {
        let subject_id = subject_id.into();
        Self {
            name: subject_id.clone(),
            subject_id,
            version: default_version(),
            description: String::new(),
            runtime: RuntimeConfig::default(),
            evaluation: EvaluationConfig::default(),
        }
    }

    /// Load and validate a spec from a JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut spec: SubjectSpec = serde_json::from_str(&text)?;
        spec.validate()?;
        if spec.name.is_empty() {
            spec.name = spec.subject_id.clone();
        }
        Ok(spec)
    }

    fn validate(&self) -> Result<()> {
        if self.subject_id.trim().is_empty() {
            return Err(EvalOpsError::InvalidSubjectSpec(
                "subject_id must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Runtime config value by key, when present and a string.
    pub fn runtime_str(&self, key: &str) -> Option<&str> {
        self.runtime.config.get(key).and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_load_from_file_fills_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("subject.json");
        let mut f = std::fs::File::create(&path).expect("create");
        f.write_all(br#"{"subject_id": "travel_planner"}"#)
            .expect("write");

        let spec = SubjectSpec::load_from_file(&path).expect("load");
        assert_eq!(spec.subject_id, "travel_planner");
        assert_eq!(spec.name, "travel_planner");
        assert_eq!(spec.version, "v1");
        assert!(spec.evaluation.metrics.is_none());
    }

    #[test]
    fn test_load_rejects_empty_subject_id() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("subject.json");
        std::fs::write(&path, br#"{"subject_id": "  "}"#).expect("write");

        match SubjectSpec::load_from_file(&path) {
            Err(EvalOpsError::InvalidSubjectSpec(msg)) => {
                assert!(msg.contains("subject_id"));
            }
            other => panic!("expected InvalidSubjectSpec, got {:?}", other),
        }
    }

    #[test]
    fn test_full_spec_roundtrip() {
        let json = serde_json::json!({
            "subject_id": "travel_planner",
            "name": "Travel Planner",
            "version": "v2",
            "runtime": {
                "kind": "http",
                "config": {"endpoint": "http://localhost:8080/run"}
            },
            "evaluation": {
                "metrics": ["task_success", "judge_score_p95"],
                "judge": {"model": "judge-v1", "rubric_id": "travel_itinerary_v1"},
                "golden_path": "data/golden/travel_golden_v1.csv"
            }
        });
        let spec: SubjectSpec = serde_json::from_value(json).expect("deserialize");
        assert_eq!(spec.runtime_str("endpoint"), Some("http://localhost:8080/run"));
        assert_eq!(
            spec.evaluation.golden_path,
            Some(PathBuf::from("data/golden/travel_golden_v1.csv"))
        );

        let back: SubjectSpec =
            serde_json::from_str(&serde_json::to_string(&spec).expect("serialize"))
                .expect("reparse");
        assert_eq!(spec, back);
    }
}

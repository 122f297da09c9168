//! Long-term memory bank: curated facts that outlive a single run.
//!
//! Not chat history. The bank holds best practices, observed failure
//! patterns, applied config changes, eval outcomes, and planned prompt
//! tweaks, so the planner and the engine can correlate changes with
//! results across runs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{EvalRecord, Result};

use super::jsonl::JsonlStore;

/// Default memory bank location relative to the data directory.
pub const MEMORY_FILE: &str = "memory/bank.jsonl";

/// Discriminator stored in each entry's `type` field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MemoryEntryKind {
    BestPractice,
    FailurePattern,
    ConfigChange,
    EvalOutcome,
    PromptTweak,
}

impl MemoryEntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryEntryKind::BestPractice => "best_practice",
            MemoryEntryKind::FailurePattern => "failure_pattern",
            MemoryEntryKind::ConfigChange => "config_change",
            MemoryEntryKind::EvalOutcome => "eval_outcome",
            MemoryEntryKind::PromptTweak => "prompt_tweak",
        }
    }
}

impl std::str::FromStr for MemoryEntryKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "best_practice" => Ok(MemoryEntryKind::BestPractice),
            "failure_pattern" => Ok(MemoryEntryKind::FailurePattern),
            "config_change" => Ok(MemoryEntryKind::ConfigChange),
            "eval_outcome" => Ok(MemoryEntryKind::EvalOutcome),
            "prompt_tweak" => Ok(MemoryEntryKind::PromptTweak),
            other => Err(format!("unknown memory entry kind: {other}")),
        }
    }
}

/// Load-time filters, applied after parsing.
#[derive(Debug, Clone, Default)]
pub struct MemoryFilter {
    pub kind: Option<MemoryEntryKind>,
    pub subject_id: Option<String>,
    /// Keep only the most recently appended N entries (tail semantics).
    pub limit: Option<usize>,
}

impl MemoryFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: MemoryEntryKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_subject(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A curated piece of guidance on agent design, prompts, or evals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BestPractice {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

fn default_category() -> String {
    "general".to_string()
}

/// A planned behavior change, recorded so later eval outcomes can be
/// correlated with it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptTweak {
    pub subject_id: String,
    pub base_version: String,
    pub new_version: String,
    pub description: String,
    pub expected_impact: String,
}

/// Append-only memory bank over a JSONL log.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: JsonlStore,
}

impl MemoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: JsonlStore::new(path, "memory_id"),
        }
    }

    /// Conventional store under a data directory (`<dir>/memory/bank.jsonl`).
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(MEMORY_FILE))
    }

    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Append an entry of the given kind. The `type` discriminator is set
    /// here; all other fields are the caller's. Returns the memory id.
    pub fn append_entry(&self, kind: MemoryEntryKind, fields: &Map<String, Value>) -> Result<String> {
        let mut entry = Map::with_capacity(fields.len() + 1);
        entry.insert(
            "type".to_string(),
            Value::String(kind.as_str().to_string()),
        );
        for (key, value) in fields {
            if key != "type" {
                entry.insert(key.clone(), value.clone());
            }
        }
        self.inner.append(&entry)
    }

    /// Load entries, applying the filter after parsing.
    pub fn load(&self, filter: &MemoryFilter) -> Result<Vec<Map<String, Value>>> {
        let mut entries: Vec<Map<String, Value>> = self
            .inner
            .load()?
            .into_iter()
            .filter(|entry| {
                if let Some(kind) = filter.kind {
                    if entry.get("type").and_then(Value::as_str) != Some(kind.as_str()) {
                        return false;
                    }
                }
                if let Some(subject_id) = &filter.subject_id {
                    if entry.get("subject_id").and_then(Value::as_str) != Some(subject_id.as_str())
                    {
                        return false;
                    }
                }
                true
            })
            .collect();

        if let Some(limit) = filter.limit {
            if entries.len() > limit {
                entries.drain(..entries.len() - limit);
            }
        }
        Ok(entries)
    }

    /// Persist the outcome of one evaluation record.
    pub fn record_eval_outcome(&self, record: &EvalRecord) -> Result<String> {
        let mut fields = Map::new();
        fields.insert(
            "subject_id".to_string(),
            Value::String(record.subject_id.clone()),
        );
        fields.insert(
            "version_id".to_string(),
            Value::String(record.version_id.clone()),
        );
        fields.insert("eval_id".to_string(), Value::String(record.eval_id.clone()));
        fields.insert(
            "testcase_id".to_string(),
            Value::String(record.testcase.id.clone()),
        );
        if let Some(score) = record.judge_score() {
            fields.insert("judge_score".to_string(), Value::from(score));
        }
        if let Some(success) = record.task_success() {
            fields.insert("task_success".to_string(), Value::Bool(success));
        }
        self.append_entry(MemoryEntryKind::EvalOutcome, &fields)
    }

    /// Persist an applied config change.
    pub fn record_config_change(
        &self,
        subject_id: Option<&str>,
        base_config: &Path,
        new_config: &Path,
        patch_count: usize,
        notes: &str,
    ) -> Result<String> {
        let mut fields = Map::new();
        if let Some(subject_id) = subject_id {
            fields.insert(
                "subject_id".to_string(),
                Value::String(subject_id.to_string()),
            );
        }
        fields.insert(
            "base_config_path".to_string(),
            Value::String(base_config.display().to_string()),
        );
        fields.insert(
            "new_config_path".to_string(),
            Value::String(new_config.display().to_string()),
        );
        fields.insert("patch_count".to_string(), Value::from(patch_count));
        if !notes.is_empty() {
            fields.insert("notes".to_string(), Value::String(notes.to_string()));
        }
        self.append_entry(MemoryEntryKind::ConfigChange, &fields)
    }

    /// Persist an observed failure pattern for a subject.
    pub fn record_failure_pattern(&self, subject_id: &str, description: &str) -> Result<String> {
        let mut fields = Map::new();
        fields.insert(
            "subject_id".to_string(),
            Value::String(subject_id.to_string()),
        );
        fields.insert(
            "description".to_string(),
            Value::String(description.to_string()),
        );
        self.append_entry(MemoryEntryKind::FailurePattern, &fields)
    }

    /// Persist a best practice.
    pub fn record_best_practice(&self, practice: &BestPractice) -> Result<String> {
        let fields = to_map(practice)?;
        self.append_entry(MemoryEntryKind::BestPractice, &fields)
    }

    /// Persist a planned prompt/config tweak.
    pub fn record_prompt_tweak(&self, tweak: &PromptTweak) -> Result<String> {
        let fields = to_map(tweak)?;
        self.append_entry(MemoryEntryKind::PromptTweak, &fields)
    }

    /// Best practices currently in the bank, optionally by category.
    pub fn list_best_practices(&self, category: Option<&str>) -> Result<Vec<BestPractice>> {
        let entries = self.load(&MemoryFilter::all().with_kind(MemoryEntryKind::BestPractice))?;
        let mut practices = Vec::new();
        for entry in entries {
            if let Ok(practice) =
                serde_json::from_value::<BestPractice>(Value::Object(entry))
            {
                if category.is_none() || category == Some(practice.category.as_str()) {
                    practices.push(practice);
                }
            }
        }
        Ok(practices)
    }

    /// Planned tweaks currently in the bank.
    pub fn list_prompt_tweaks(&self) -> Result<Vec<PromptTweak>> {
        let entries = self.load(&MemoryFilter::all().with_kind(MemoryEntryKind::PromptTweak))?;
        let mut tweaks = Vec::new();
        for entry in entries {
            if let Ok(tweak) = serde_json::from_value::<PromptTweak>(Value::Object(entry)) {
                tweaks.push(tweak);
            }
        }
        Ok(tweaks)
    }

    /// Render best practices as a text block for prompt assembly. Empty
    /// string when the bank has none in the category.
    pub fn best_practices_block(&self, category: Option<&str>) -> Result<String> {
        let practices = self.list_best_practices(category)?;
        if practices.is_empty() {
            return Ok(String::new());
        }
        let mut lines = vec!["Best practices to consider:".to_string()];
        for practice in &practices {
            lines.push(format!("- {}: {}", practice.title, practice.description));
        }
        Ok(lines.join("\n"))
    }
}

fn to_map<T: Serialize>(value: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn practice(id: &str, category: &str) -> BestPractice {
        BestPractice {
            id: id.to_string(),
            title: format!("practice {id}"),
            description: "keep golden sets small and sharp".to_string(),
            category: category.to_string(),
            source: None,
        }
    }

    #[test]
    fn test_append_entry_sets_type_discriminator() {
        let dir = tempdir().expect("tempdir");
        let store = MemoryStore::in_dir(dir.path());

        let mut fields = Map::new();
        fields.insert("subject_id".to_string(), json!("travel"));
        store
            .append_entry(MemoryEntryKind::FailurePattern, &fields)
            .expect("append");

        let loaded = store.load(&MemoryFilter::all()).expect("load");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0]["type"], json!("failure_pattern"));
        assert!(loaded[0].contains_key("memory_id"));
        assert!(loaded[0].contains_key("timestamp"));
    }

    #[test]
    fn test_load_filters_by_kind_and_subject() {
        let dir = tempdir().expect("tempdir");
        let store = MemoryStore::in_dir(dir.path());

        store
            .record_failure_pattern("travel", "forgets budget limits")
            .expect("append");
        store
            .record_failure_pattern("support", "hallucinates ticket ids")
            .expect("append");
        store
            .record_best_practice(&practice("bp-1", "evals"))
            .expect("append");

        let failures = store
            .load(
                &MemoryFilter::all()
                    .with_kind(MemoryEntryKind::FailurePattern)
                    .with_subject("travel"),
            )
            .expect("load");
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0]["description"], json!("forgets budget limits"));
    }

    #[test]
    fn test_load_limit_is_tail() {
        let dir = tempdir().expect("tempdir");
        let store = MemoryStore::in_dir(dir.path());
        for n in 0..4 {
            store
                .record_failure_pattern("travel", &format!("pattern {n}"))
                .expect("append");
        }

        let tail = store
            .load(&MemoryFilter::all().with_limit(2))
            .expect("load");
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0]["description"], json!("pattern 2"));
        assert_eq!(tail[1]["description"], json!("pattern 3"));
    }

    #[test]
    fn test_best_practices_block_renders_bullets() {
        let dir = tempdir().expect("tempdir");
        let store = MemoryStore::in_dir(dir.path());
        assert_eq!(store.best_practices_block(None).expect("empty"), "");

        store
            .record_best_practice(&practice("bp-1", "evals"))
            .expect("append");
        store
            .record_best_practice(&practice("bp-2", "latency"))
            .expect("append");

        let block = store.best_practices_block(Some("evals")).expect("block");
        assert!(block.starts_with("Best practices to consider:"));
        assert!(block.contains("practice bp-1"));
        assert!(!block.contains("practice bp-2"));
    }

    #[test]
    fn test_list_prompt_tweaks_roundtrip() {
        let dir = tempdir().expect("tempdir");
        let store = MemoryStore::in_dir(dir.path());
        let tweak = PromptTweak {
            subject_id: "travel".to_string(),
            base_version: "v1".to_string(),
            new_version: "v2".to_string(),
            description: "enable clarification questions".to_string(),
            expected_impact: "higher judge scores on vague requests".to_string(),
        };
        store.record_prompt_tweak(&tweak).expect("append");

        let tweaks = store.list_prompt_tweaks().expect("list");
        assert_eq!(tweaks.len(), 1);
        assert_eq!(tweaks[0].new_version, "v2");
    }

    #[test]
    fn test_memory_entry_kind_parse() {
        use std::str::FromStr;
        assert_eq!(
            MemoryEntryKind::from_str("eval_outcome").unwrap(),
            MemoryEntryKind::EvalOutcome
        );
        assert!(MemoryEntryKind::from_str("nope").is_err());
    }
}

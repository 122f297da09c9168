//! Minimal log-structured JSONL store.
//!
//! One JSON object per line, append mode, one flush per call. No
//! compaction, no indexes; `load` is a linear scan tolerant of per-line
//! corruption. Every append is immediately durable and visible to
//! subsequent loads in the same process. Exactly one logical writer per
//! file is assumed; there is no cross-process coordination.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::Result;

/// Synthetic field holding the raw text of an unparseable line.
pub const RAW_LINE_FIELD: &str = "_raw_line";

/// Error value stored on synthetic corruption records.
pub const PARSE_ERROR_VALUE: &str = "failed_to_parse_json";

/// Append-only JSONL log with a configurable id field name.
#[derive(Debug, Clone)]
pub struct JsonlStore {
    path: PathBuf,
    id_field: &'static str,
}

impl JsonlStore {
    pub fn new(path: impl Into<PathBuf>, id_field: &'static str) -> Self {
        Self {
            path: path.into(),
            id_field,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record.
    ///
    /// Injects a freshly generated id and an RFC 3339 UTC timestamp
    /// (explicit `Z` suffix) into a copy of the input; the caller's fields
    /// are otherwise written as-is, with no domain validation. Returns the
    /// generated id.
    pub fn append(&self, record: &Map<String, Value>) -> Result<String> {
        let id = Uuid::new_v4().to_string();

        let mut stamped = Map::with_capacity(record.len() + 2);
        stamped.insert(self.id_field.to_string(), Value::String(id.clone()));
        stamped.insert(
            "timestamp".to_string(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
        );
        for (key, value) in record {
            if key != self.id_field && key != "timestamp" {
                stamped.insert(key.clone(), value.clone());
            }
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut line = serde_json::to_string(&Value::Object(stamped))?;
        line.push('\n');
        file.write_all(line.as_bytes())?;
        file.flush()?;

        Ok(id)
    }

    /// Load every record in append order.
    ///
    /// Blank lines are skipped. A line that fails to parse is retained as
    /// a synthetic record `{"_raw_line": ..., "error":
    /// "failed_to_parse_json"}` so corruption in one entry never hides the
    /// rest of the history. A missing backing file is an empty history,
    /// not an error.
    pub fn load(&self) -> Result<Vec<Map<String, Value>>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = std::fs::File::open(&self.path)?;
        let reader = BufReader::new(file);

        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<Map<String, Value>>(trimmed) {
                Ok(record) => entries.push(record),
                Err(_) => {
                    let mut synthetic = Map::new();
                    synthetic.insert(
                        RAW_LINE_FIELD.to_string(),
                        Value::String(trimmed.to_string()),
                    );
                    synthetic.insert(
                        "error".to_string(),
                        Value::String(PARSE_ERROR_VALUE.to_string()),
                    );
                    entries.push(synthetic);
                }
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(fields: &[(&str, Value)]) -> Map<String, Value> {
        fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_append_then_load_roundtrip() {
        let dir = tempdir().expect("tempdir");
        let store = JsonlStore::new(dir.path().join("log.jsonl"), "trace_id");

        let entry = record(&[
            ("version_id", Value::String("v1".to_string())),
            ("answer", Value::String("hello".to_string())),
        ]);
        let id = store.append(&entry).expect("append");

        let loaded = store.load().expect("load");
        assert_eq!(loaded.len(), 1);
        let first = &loaded[0];
        // Superset of the original fields plus provenance.
        assert_eq!(first["version_id"], Value::String("v1".to_string()));
        assert_eq!(first["answer"], Value::String("hello".to_string()));
        assert_eq!(first["trace_id"], Value::String(id));
        let ts = first["timestamp"].as_str().expect("timestamp string");
        assert!(ts.ends_with('Z'), "timestamp must carry a Z suffix: {ts}");
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().expect("tempdir");
        let store = JsonlStore::new(dir.path().join("absent.jsonl"), "id");
        assert!(store.load().expect("load").is_empty());
    }

    #[test]
    fn test_load_retains_corrupted_line() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("log.jsonl");
        let store = JsonlStore::new(&path, "id");

        store
            .append(&record(&[("n", Value::from(1))]))
            .expect("append 1");
        // Corrupt the middle of the log by hand.
        {
            let mut f = OpenOptions::new().append(true).open(&path).expect("open");
            writeln!(f, "{{not json").expect("write corrupt");
        }
        store
            .append(&record(&[("n", Value::from(2))]))
            .expect("append 2");

        let loaded = store.load().expect("load");
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[0]["n"], Value::from(1));
        assert_eq!(
            loaded[1]["error"],
            Value::String(PARSE_ERROR_VALUE.to_string())
        );
        assert_eq!(loaded[1][RAW_LINE_FIELD], Value::String("{not json".to_string()));
        assert_eq!(loaded[2]["n"], Value::from(2));
    }

    #[test]
    fn test_corrupted_first_line_does_not_hide_rest() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("log.jsonl");
        std::fs::write(&path, ">>>garbage\n").expect("seed corrupt");

        let store = JsonlStore::new(&path, "id");
        store
            .append(&record(&[("ok", Value::Bool(true))]))
            .expect("append");
        store
            .append(&record(&[("ok", Value::Bool(false))]))
            .expect("append");

        let loaded = store.load().expect("load");
        assert_eq!(loaded.len(), 3);
        assert_eq!(
            loaded[0]["error"],
            Value::String(PARSE_ERROR_VALUE.to_string())
        );
        assert_eq!(loaded[1]["ok"], Value::Bool(true));
    }

    #[test]
    fn test_appends_are_in_order() {
        let dir = tempdir().expect("tempdir");
        let store = JsonlStore::new(dir.path().join("log.jsonl"), "id");
        for n in 0..5 {
            store
                .append(&record(&[("seq", Value::from(n))]))
                .expect("append");
        }
        let loaded = store.load().expect("load");
        let seqs: Vec<i64> = loaded.iter().map(|e| e["seq"].as_i64().unwrap()).collect();
        assert_eq!(seqs, vec![0, 1, 2, 3, 4]);
    }
}

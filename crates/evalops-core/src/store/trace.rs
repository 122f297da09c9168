//! Durable trace log: one record per evaluation invocation.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::domain::Result;

use super::jsonl::JsonlStore;

/// Default trace log location relative to the data directory.
pub const TRACES_FILE: &str = "traces.jsonl";

/// Append-only store of evaluation trace events.
#[derive(Debug, Clone)]
pub struct TraceStore {
    inner: JsonlStore,
}

impl TraceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: JsonlStore::new(path, "trace_id"),
        }
    }

    /// Conventional store under a data directory (`<dir>/traces.jsonl`).
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(TRACES_FILE))
    }

    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Append a trace event, normalizing the loosely-shaped fields first:
    /// `tool_calls` always becomes an array (a lone object is wrapped) and
    /// `session_graph` always becomes an object. Returns the trace id.
    pub fn append_event(&self, event: &Map<String, Value>) -> Result<String> {
        let mut normalized = event.clone();

        let tool_calls = match normalized.remove("tool_calls") {
            Some(Value::Array(calls)) => Value::Array(calls),
            Some(Value::Object(call)) => Value::Array(vec![Value::Object(call)]),
            Some(Value::Null) | None => Value::Array(Vec::new()),
            Some(other) => Value::Array(vec![other]),
        };
        normalized.insert("tool_calls".to_string(), tool_calls);

        let session_graph = match normalized.remove("session_graph") {
            Some(Value::Object(graph)) => Value::Object(graph),
            _ => Value::Object(Map::new()),
        };
        normalized.insert("session_graph".to_string(), session_graph);

        self.inner.append(&normalized)
    }

    /// All trace events in append order.
    pub fn load(&self) -> Result<Vec<Map<String, Value>>> {
        self.inner.load()
    }

    /// The most recently appended `limit` events, oldest first.
    pub fn tail(&self, limit: usize) -> Result<Vec<Map<String, Value>>> {
        let mut entries = self.load()?;
        if entries.len() > limit {
            entries.drain(..entries.len() - limit);
        }
        Ok(entries)
    }
}

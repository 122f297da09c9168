//! Golden testcases and the tabular loader behind them.
//!
//! A golden set is a delimited file with required columns
//! `id, input, judge_question, expected_behavior`. Additional columns are
//! preserved in [`Testcase::extra`]. Rows with an empty `id` cell are
//! skipped.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::{EvalOpsError, Result};

/// Column names every golden set must carry.
pub const GOLDEN_COLUMNS: [&str; 4] = ["id", "input", "judge_question", "expected_behavior"];

/// A single golden testcase row.
///
/// Immutable once loaded into a run. `input` is opaque to the engine: the
/// tabular loader stores the raw cell as a JSON string and the engine
/// parses it when building the request payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Testcase {
    /// Unique identifier within the set.
    pub id: String,

    /// Opaque request payload. `Value::String` when loaded from a golden
    /// file; already-structured values are passed through untouched.
    pub input: serde_json::Value,

    /// Question posed to the judge collaborator.
    pub judge_question: String,

    /// Behavior the judge should expect from a good answer.
    pub expected_behavior: String,

    /// Columns beyond the required set, preserved as-is.
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

/// Load a golden set from a delimited file.
///
/// Returns [`EvalOpsError::GoldenSetMissing`] when the file is absent and
/// [`EvalOpsError::GoldenSetEmpty`] when it parses to zero usable rows;
/// both carry the resolved path for diagnostics.
pub fn load_golden_set(path: &Path) -> Result<Vec<Testcase>> {
    if !path.exists() {
        return Err(EvalOpsError::GoldenSetMissing {
            path: path.to_path_buf(),
        });
    }

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut cells: BTreeMap<String, String> = BTreeMap::new();
        for (header, cell) in headers.iter().zip(record.iter()) {
            cells.insert(header.to_string(), cell.to_string());
        }

        let id = cells.remove("id").unwrap_or_default();
        if id.is_empty() {
            continue;
        }

        let input = cells.remove("input").unwrap_or_default();
        let judge_question = cells.remove("judge_question").unwrap_or_default();
        let expected_behavior = cells.remove("expected_behavior").unwrap_or_default();

        rows.push(Testcase {
            id,
            input: serde_json::Value::String(input),
            judge_question,
            expected_behavior,
            extra: cells,
        });
    }

    if rows.is_empty() {
        return Err(EvalOpsError::GoldenSetEmpty {
            path: path.to_path_buf(),
        });
    }

    info!(
        count = rows.len(),
        path = %path.display(),
        "loaded golden testcases"
    );
    Ok(rows)
}

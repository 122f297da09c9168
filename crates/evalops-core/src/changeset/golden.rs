//! Golden-set growth: appending proposed testcases to the tabular file.
//!
//! The table is read whole, validated, extended, and written back in one
//! pass. Required fields are checked on every new row before anything is
//! written, so a bad row leaves the file untouched.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::info;

use crate::domain::{EvalOpsError, Result, GOLDEN_COLUMNS};

use super::NewTestcase;

/// Fields every new testcase must carry (id is auto-assigned when absent).
pub const REQUIRED_FIELDS: [&str; 3] = ["input", "judge_question", "expected_behavior"];

/// An in-memory golden table: ordered columns plus rows keyed by column.
#[derive(Debug, Clone)]
pub struct GoldenTable {
    pub columns: Vec<String>,
    pub rows: Vec<BTreeMap<String, String>>,
}

impl GoldenTable {
    fn empty() -> Self {
        Self {
            columns: GOLDEN_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }
}

/// Read the golden table. A missing file is an empty table with the
/// default column set, not an error.
pub fn read_table(path: &Path) -> Result<GoldenTable> {
    if !path.exists() {
        return Ok(GoldenTable::empty());
    }

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: BTreeMap<String, String> = columns
            .iter()
            .zip(record.iter())
            .map(|(column, cell)| (column.clone(), cell.to_string()))
            .collect();
        if row.get("id").map(|id| id.is_empty()).unwrap_or(true) {
            continue;
        }
        rows.push(row);
    }

    Ok(GoldenTable { columns, rows })
}

/// Next auto-assigned id: max integer-parseable existing id (default 0)
/// plus one. Non-numeric ids are ignored.
pub fn next_auto_id(rows: &[BTreeMap<String, String>]) -> u64 {
    let max_id = rows
        .iter()
        .filter_map(|row| row.get("id"))
        .filter_map(|id| id.trim().parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    max_id + 1
}

fn value_to_cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Append `new_testcases` to the golden table at `path`.
///
/// All-or-nothing: every row is validated for the required fields before
/// any write. Extra fields extend the column set dynamically; prior rows
/// keep their column order and are padded for columns they lack. A header
/// is written when the file is created. Returns the number of appended
/// rows.
pub fn append_testcases(path: &Path, new_testcases: &[NewTestcase]) -> Result<usize> {
    if new_testcases.is_empty() {
        return Ok(0);
    }

    let mut table = read_table(path)?;
    let mut next_id = next_auto_id(&table.rows);

    // Validate the whole batch before touching the table.
    for (index, testcase) in new_testcases.iter().enumerate() {
        let label = testcase
            .id
            .clone()
            .unwrap_or_else(|| format!("#{index}"));
        for field in REQUIRED_FIELDS {
            if testcase.required_field(field).is_none() {
                return Err(EvalOpsError::RequiredFieldMissing {
                    testcase: label,
                    field: field.to_string(),
                });
            }
        }
    }

    let mut appended = 0usize;
    for testcase in new_testcases {
        let mut row: BTreeMap<String, String> = BTreeMap::new();

        let id = match &testcase.id {
            Some(id) => id.clone(),
            None => {
                let id = next_id.to_string();
                next_id += 1;
                id
            }
        };
        row.insert("id".to_string(), id);

        for field in REQUIRED_FIELDS {
            // Presence was validated above.
            if let Some(value) = testcase.required_field(field) {
                row.insert(field.to_string(), value.to_string());
            }
        }

        for (key, value) in &testcase.extra {
            if !table.columns.iter().any(|c| c == key) {
                table.columns.push(key.clone());
            }
            row.insert(key.clone(), value_to_cell(value));
        }

        table.rows.push(row);
        appended += 1;
    }

    write_table(path, &table)?;
    info!(
        appended,
        path = %path.display(),
        "appended testcases to golden set"
    );
    Ok(appended)
}

fn write_table(path: &Path, table: &GoldenTable) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        let cells: Vec<&str> = table
            .columns
            .iter()
            .map(|column| row.get(column).map(String::as_str).unwrap_or(""))
            .collect();
        writer.write_record(&cells)?;
    }
    writer.flush()?;
    Ok(())
}

//! Applying a changeset: config merge step, then golden-set growth.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{info, warn};

use crate::domain::{EvalOpsError, Result};
use crate::obs::emit_changeset_applied;
use crate::store::MemoryStore;

use super::golden::append_testcases;
use super::merge::apply_patches;
use super::Changeset;

/// What one successful apply produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangesetOutcome {
    pub new_config_path: PathBuf,
    pub patches_applied: usize,
    pub testcases_appended: usize,
}

/// Applies changesets. Owns the merge/apply transaction for one changeset
/// but not the config files themselves; ownership passes to the
/// filesystem once written.
#[derive(Debug, Default)]
pub struct ChangesetEngine {
    memory: Option<MemoryStore>,
}

impl ChangesetEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record applied changes to a memory bank (best-effort).
    pub fn with_memory(mut self, memory: MemoryStore) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Apply the changeset: patch the config, then grow the golden set.
    ///
    /// The destination config is written only after the full in-memory
    /// merge succeeds, so a failed fold leaves no partial output. A golden
    /// step failure leaves the golden file untouched.
    pub fn apply(&self, changeset: &Changeset) -> Result<ChangesetOutcome> {
        let merged = self.merge_config(changeset)?;

        if let Some(parent) = changeset.new_config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(
            &changeset.new_config_path,
            serde_json::to_string_pretty(&merged)?,
        )?;
        info!(
            path = %changeset.new_config_path.display(),
            patches = changeset.config_patches.len(),
            "wrote merged config"
        );

        let appended = append_testcases(&changeset.golden_set_path, &changeset.new_testcases)?;

        if let Some(memory) = &self.memory {
            if let Err(e) = memory.record_config_change(
                None,
                &changeset.base_config_path,
                &changeset.new_config_path,
                changeset.config_patches.len(),
                &changeset.notes,
            ) {
                warn!(error = %e, "failed to record config change to memory");
            }
        }

        emit_changeset_applied(
            &changeset.new_config_path.display().to_string(),
            changeset.config_patches.len(),
            appended,
        );

        Ok(ChangesetOutcome {
            new_config_path: changeset.new_config_path.clone(),
            patches_applied: changeset.config_patches.len(),
            testcases_appended: appended,
        })
    }

    fn merge_config(&self, changeset: &Changeset) -> Result<Value> {
        if !changeset.base_config_path.exists() {
            return Err(EvalOpsError::Config(format!(
                "base config not found: {}",
                changeset.base_config_path.display()
            )));
        }
        let text = std::fs::read_to_string(&changeset.base_config_path)?;
        let base: Value = serde_json::from_str(&text)?;
        apply_patches(&base, &changeset.config_patches)
    }

    /// Derive a successor config path from the base.
    ///
    /// `.../name_v1.json` becomes `.../name_v2.json` (any `_v<n>` suffix is
    /// incremented); otherwise `<stem>_<version_id>_improved.json`.
    pub fn derive_new_config_path(base: &Path, version_id: &str) -> PathBuf {
        let stem = base
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let extension = base
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("json");

        let new_stem = match stem.rsplit_once("_v") {
            Some((prefix, digits)) if digits.chars().all(|c| c.is_ascii_digit()) => {
                match digits.parse::<u64>() {
                    Ok(n) => format!("{prefix}_v{}", n + 1),
                    Err(_) => format!("{stem}_{version_id}_improved"),
                }
            }
            _ => format!("{stem}_{version_id}_improved"),
        };

        base.with_file_name(format!("{new_stem}.{extension}"))
    }
}

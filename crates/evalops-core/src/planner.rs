//! The planner seam: an external collaborator proposing changesets.
//!
//! The planner decides *what* to change (which patches, which new
//! testcases) through an opaque process of its own, typically reading
//! eval history from the trace and memory stores it was constructed with.
//! The changeset engine only applies what a planner proposes; it never
//! second-guesses the content.

use async_trait::async_trait;

use crate::changeset::Changeset;
use crate::domain::{Result, SubjectSpec};

/// Proposes the content of a changeset for one subject version.
#[async_trait]
pub trait ChangesetPlanner: Send + Sync {
    /// Propose a changeset moving `version_id` to its successor.
    async fn propose(&self, spec: &SubjectSpec, version_id: &str) -> Result<Changeset>;
}

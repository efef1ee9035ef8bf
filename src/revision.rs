//! revision
//!
//! Revision resolution: turning a revision reference (branch name,
//! commit id, or other revspec) plus an open repository handle into a
//! concrete [`Commit`] payload.
//!
//! Resolution is purely read-only against the backend and is performed
//! per request; commits are never cached across calls. Absence is
//! reported with not-found-classified errors (see
//! [`GitError::is_not_found`]), which the HTTP layer maps to a
//! 404-equivalent response.

use serde::{Deserialize, Serialize};

use crate::core::types::BranchName;
use crate::git::{Commit, Git, GitError};

/// A branch materialized on demand: its name plus resolved head commit.
///
/// Branches are not standing objects; every resolution reflects current
/// on-disk ref state at call time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// The branch name
    pub name: BranchName,
    /// The branch's head commit
    pub commit: Commit,
}

/// Resolve a branch to its name and head commit.
///
/// # Errors
///
/// - [`GitError::BranchNotFound`] when the branch does not exist
pub fn resolve_branch(git: &Git, name: &BranchName) -> Result<Branch, GitError> {
    let commit = git.branch_head(name)?;
    Ok(Branch {
        name: name.clone(),
        commit,
    })
}

/// Resolve a revision string to a commit.
///
/// Accepts a commit id or any other absolute revspec the backend
/// understands.
///
/// # Errors
///
/// - [`GitError::RevisionNotFound`] when the backend reports the
///   revision does not exist
pub fn resolve_revision(git: &Git, revision: &str) -> Result<Commit, GitError> {
    git.resolve_revision(revision)
}

//! branches
//!
//! Branch lifecycle: get, list, create, delete, and per-branch commit
//! listing.
//!
//! Every operation is a self-contained transition against a per-request
//! [`Git`] handle; there is no long-lived branch object or cache.
//! Existence checks are explicit pre-conditions rather than relying on
//! backend error codes: the backend's taxonomy for "already exists" is
//! less precise than a direct probe, so one extra round-trip buys
//! clearer errors. The probes are not race-free guarantees; concurrent
//! creators are still arbitrated by the backend's ref-update semantics.

use thiserror::Error;

use crate::core::types::BranchName;
use crate::git::{Commit, Git, GitError};
use crate::revision::{self, Branch};

/// Errors from branch operations.
#[derive(Debug, Error)]
pub enum BranchError {
    /// A branch with the requested name already exists.
    #[error("branch already exists: {name}")]
    AlreadyExists {
        /// The conflicting branch name
        name: String,
    },

    /// The underlying Git operation failed.
    #[error(transparent)]
    Git(#[from] GitError),
}

impl BranchError {
    /// True iff the error means a referenced branch or revision is
    /// absent (the 404-equivalent set).
    pub fn is_not_found(&self) -> bool {
        matches!(self, BranchError::Git(e) if e.is_not_found())
    }

    /// True iff creation was refused because the name is taken.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, BranchError::AlreadyExists { .. })
    }
}

/// Result alias for branch operations.
pub type Result<T> = std::result::Result<T, BranchError>;

/// Get a single branch with its resolved head commit.
///
/// # Errors
///
/// Not-found classified when the branch is absent.
pub fn get(git: &Git, name: &BranchName) -> Result<Branch> {
    Ok(revision::resolve_branch(git, name)?)
}

/// List every branch with its resolved head commit.
///
/// Fail-fast: the first head-resolution failure aborts the listing. A
/// partial branch list is useless to the caller, unlike batch diffs
/// where partial success is the point.
pub fn list(git: &Git) -> Result<Vec<Branch>> {
    let names = git.list_branch_names()?;

    let mut branches = Vec::with_capacity(names.len());
    for name in names {
        branches.push(revision::resolve_branch(git, &name)?);
    }

    Ok(branches)
}

/// Create a branch named `name` from the head of `base`.
///
/// Pre-conditions are checked before any mutation: the name must be
/// free and the base must exist. On success the new branch is returned
/// with its own head commit resolved.
///
/// # Errors
///
/// - [`BranchError::AlreadyExists`] if `name` is taken
/// - Not-found classified if `base` does not exist
/// - [`GitError::Backend`] with context "create branch failed" if the
///   backend refuses the creation
pub fn create(git: &Git, name: &BranchName, base: &BranchName) -> Result<Branch> {
    if git.has_branch(name) {
        return Err(BranchError::AlreadyExists {
            name: name.to_string(),
        });
    }

    if !git.has_branch(base) {
        return Err(GitError::BranchNotFound {
            name: base.to_string(),
        }
        .into());
    }

    git.create_branch(name, base)?;

    Ok(revision::resolve_branch(git, name)?)
}

/// Delete the branch named `name`.
///
/// Returns no content on success.
///
/// # Errors
///
/// - Not-found classified if the branch does not exist
/// - [`GitError::Backend`] with context "delete branch failed"
pub fn delete(git: &Git, name: &BranchName) -> Result<()> {
    if !git.has_branch(name) {
        return Err(GitError::BranchNotFound {
            name: name.to_string(),
        }
        .into());
    }

    git.delete_branch(name)?;

    Ok(())
}

/// The first `page_size` commits reachable from a branch head, newest
/// first.
///
/// # Errors
///
/// Not-found classified if the branch does not exist.
pub fn commits_of_branch(git: &Git, name: &BranchName, page_size: usize) -> Result<Vec<Commit>> {
    if !git.has_branch(name) {
        return Err(GitError::BranchNotFound {
            name: name.to_string(),
        }
        .into());
    }

    Ok(git.commits_from_branch(name, page_size)?)
}

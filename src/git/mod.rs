//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **only doorway** to the version-control backend.
//! Every repository open, revision resolution, branch mutation, diff
//! computation, and blob read flows through [`Git`]; no other module
//! imports `git2`.
//!
//! # Error Classification
//!
//! Backend failures are normalized into the closed [`GitError`] variant
//! set. Callers never compare against backend-defined sentinel values:
//! "does this error mean the referenced object is absent?" is answered
//! by [`GitError::is_not_found`], a pattern match over the variants.
//!
//! # Responsibilities
//!
//! - Repository opening (per-request handles, never shared)
//! - Branch existence, listing, creation, deletion
//! - Revision resolution to commit payloads
//! - Blob reads at a (commit, path) coordinate
//! - Structured diffs between two branch tips

mod interface;

pub use interface::{
    Commit, DiffStatus, DiffSummary, FileDiff, Git, GitError, Signature,
};

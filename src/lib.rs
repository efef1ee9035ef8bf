//! Refgate - branch lifecycle and cross-revision diff/content core
//!
//! Refgate is the library that sits between an HTTP-facing layer and an
//! on-disk Git backend in a repository hosting service. It resolves
//! arbitrary revision references, manages branch existence, creation and
//! deletion, computes diffs between branches (single pair or batched
//! across many repositories), and fetches file content at two revisions
//! for side-by-side comparison.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`core`] - Domain types, repository store routing, and configuration
//! - [`git`] - Single interface for all Git operations
//! - [`revision`] - Revision resolution into commit payloads
//! - [`branches`] - Branch get/list/create/delete lifecycle
//! - [`diff`] - Branch-to-branch diffs, single and batched
//! - [`content`] - File content retrieval at two commits
//!
//! # Correctness Invariants
//!
//! Refgate maintains the following invariants:
//!
//! 1. All Git access flows through the [`git`] doorway; no other module
//!    imports `git2`
//! 2. Errors carry a closed classification: callers can always ask
//!    "is this a not-found condition?" without knowing backend details
//! 3. Batch operations isolate failures per item and preserve input order
//! 4. Repository handles are per-request values, never shared state

pub mod branches;
pub mod content;
pub mod core;
pub mod diff;
pub mod git;
pub mod revision;

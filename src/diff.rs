//! diff
//!
//! Branch-to-branch diffs: a single pair within one repository, or a
//! batch spanning many (owner, repository, branch-pair) triples.
//!
//! Batch processing uses a result-accumulator pattern: each item runs
//! inside its own failure boundary and any error becomes an inline,
//! human-readable message on that item's [`DiffResult`]. One item's
//! fault never unwinds the batch, and result order always equals
//! request order. Every item opens its own local repository handle;
//! nothing is shared across iterations.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::paths::RepoStore;
use crate::core::types::BranchName;
use crate::git::{DiffSummary, Git};

/// One item of a batch diff request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchDiffRequest {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// First branch of the comparison
    pub branch1: String,
    /// Second branch of the comparison
    pub branch2: String,
}

/// The outcome of comparing two branches.
///
/// Either `diff` or `error` is populated, never both: an error message
/// implies the diff content is absent. The owner, repository, and
/// branch labels are always present so clients can correlate results
/// even on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    /// Repository owner
    #[serde(default)]
    pub owner: String,
    /// Repository name
    #[serde(default)]
    pub repo: String,
    /// First branch of the comparison
    #[serde(default)]
    pub branch1: String,
    /// Second branch of the comparison
    #[serde(default)]
    pub branch2: String,
    /// Structured diff content, absent on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<DiffSummary>,
    /// User-facing error message, absent on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DiffResult {
    fn failure(
        owner: &str,
        repo: &str,
        branch1: &str,
        branch2: &str,
        error: String,
    ) -> Self {
        Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch1: branch1.to_string(),
            branch2: branch2.to_string(),
            diff: None,
            error: Some(error),
        }
    }
}

/// Computes branch-to-branch diffs against a repository store.
#[derive(Debug, Clone)]
pub struct DiffEngine {
    store: RepoStore,
}

impl DiffEngine {
    /// Create an engine routing repositories through the given store.
    pub fn new(store: RepoStore) -> Self {
        Self { store }
    }

    /// Diff two branches of an already-open repository.
    ///
    /// Never fails outright: a backend error is formatted into the
    /// result's `error` field, embedding the owner, repository, and
    /// both branch names, so batch callers need no error special-casing
    /// and clients can still correlate the response.
    pub fn diff_branches(
        &self,
        git: &Git,
        owner: &str,
        repo: &str,
        branch1: &str,
        branch2: &str,
    ) -> DiffResult {
        let names = match (BranchName::new(branch1), BranchName::new(branch2)) {
            (Ok(b1), Ok(b2)) => (b1, b2),
            (Err(e), _) | (_, Err(e)) => {
                return DiffResult::failure(
                    owner,
                    repo,
                    branch1,
                    branch2,
                    format!(
                        "diff failed for {owner}/{repo} between {branch1} and {branch2}: {e}"
                    ),
                )
            }
        };

        match git.diff_branches(&names.0, &names.1) {
            Ok(summary) => DiffResult {
                owner: owner.to_string(),
                repo: repo.to_string(),
                branch1: branch1.to_string(),
                branch2: branch2.to_string(),
                diff: Some(summary),
                error: None,
            },
            Err(e) => DiffResult::failure(
                owner,
                repo,
                branch1,
                branch2,
                format!("diff failed for {owner}/{repo} between {branch1} and {branch2}: {e}"),
            ),
        }
    }

    /// Diff every (owner, repo, branch-pair) in the batch, sequentially
    /// and in input order.
    ///
    /// Each request opens its own repository handle. An open failure
    /// synthesizes an error result for that item; processing always
    /// continues with the next item, and the output is index-aligned
    /// with the input.
    pub fn diff_branches_batch(&self, requests: &[BranchDiffRequest]) -> Vec<DiffResult> {
        let mut results = Vec::with_capacity(requests.len());

        for request in requests {
            let path = self.store.repo_path(&request.owner, &request.repo);
            let git = match Git::open(&path) {
                Ok(git) => git,
                Err(e) => {
                    warn!(
                        owner = %request.owner,
                        repo = %request.repo,
                        error = %e,
                        "open repository for batch diff failed"
                    );
                    results.push(DiffResult::failure(
                        &request.owner,
                        &request.repo,
                        &request.branch1,
                        &request.branch2,
                        format!(
                            "invalid repository {}/{} for diff of {} and {}: {e}",
                            request.owner, request.repo, request.branch1, request.branch2
                        ),
                    ));
                    continue;
                }
            };

            results.push(self.diff_branches(
                &git,
                &request.owner,
                &request.repo,
                &request.branch1,
                &request.branch2,
            ));
        }

        results
    }

    /// Parse a JSON batch payload and diff every item.
    ///
    /// The payload must be a JSON array of
    /// `{owner, repo, branch1, branch2}` objects. A malformed payload
    /// produces a single-element result carrying the parse error, since
    /// no items could be individually identified.
    pub fn diff_branches_batch_json(&self, payload: &str) -> Vec<DiffResult> {
        let requests: Vec<BranchDiffRequest> = match serde_json::from_str(payload) {
            Ok(requests) => requests,
            Err(e) => {
                return vec![DiffResult {
                    owner: String::new(),
                    repo: String::new(),
                    branch1: String::new(),
                    branch2: String::new(),
                    diff: None,
                    error: Some(format!("invalid branch list payload: {e}")),
                }]
            }
        };

        self.diff_branches_batch(&requests)
    }
}

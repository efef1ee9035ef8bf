//! git::interface
//!
//! Git interface implementation using git2.
//!
//! The [`Git`] struct is the only way to interact with a repository.
//! It exposes exactly the primitives the service layers consume: open,
//! branch existence/list/create/delete, revision resolution, blob reads
//! and branch-to-branch diffs, with every failure normalized into the
//! typed [`GitError`] categories.
//!
//! # Example
//!
//! ```ignore
//! use refgate::core::types::BranchName;
//! use refgate::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("/srv/git/alice/demo.git"))?;
//! let main = BranchName::new("main")?;
//! let head = git.branch_head(&main)?;
//! println!("main is at {}", head.id.short(7));
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{BranchName, Oid, TypeError};

/// Errors from Git operations.
///
/// This is a closed set: higher layers branch on the classification
/// methods below rather than on backend error identities, so re-wrapping
/// an unrelated error can never spuriously match "not found".
#[derive(Debug, Error)]
pub enum GitError {
    /// The path does not hold a Git repository.
    #[error("not a git repository: {path}")]
    NotARepository {
        /// The path that was opened
        path: PathBuf,
    },

    /// The named branch does not exist.
    #[error("branch not found: {name}")]
    BranchNotFound {
        /// The branch that was requested
        name: String,
    },

    /// The requested revision does not exist.
    #[error("revision not found: {revision}")]
    RevisionNotFound {
        /// The revision string that failed to resolve
        revision: String,
    },

    /// The path names a submodule rather than readable content at the
    /// given revision.
    #[error("submodule not found at {revision}: {path}")]
    SubmoduleNotFound {
        /// The submodule path
        path: String,
        /// The revision it was looked up at
        revision: String,
    },

    /// No tree entry at the given path in the given revision.
    #[error("path not found at {revision}: {path}")]
    PathNotFound {
        /// The file path that was looked up
        path: String,
        /// The revision it was looked up at
        revision: String,
    },

    /// The two commits share no common ancestor.
    #[error("no merge base between {ours} and {theirs}")]
    NoMergeBase {
        /// Commit id of the first branch tip
        ours: String,
        /// Commit id of the second branch tip
        theirs: String,
    },

    /// Any other backend failure.
    #[error("{context}: {message}")]
    Backend {
        /// What the caller was doing
        context: String,
        /// The backend's error message
        message: String,
    },
}

impl GitError {
    /// True iff the error means the referenced object (branch, revision,
    /// submodule, path) does not exist. The HTTP layer maps this set to
    /// a 404-equivalent response; everything else is a hard failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GitError::BranchNotFound { .. }
                | GitError::RevisionNotFound { .. }
                | GitError::SubmoduleNotFound { .. }
                | GitError::PathNotFound { .. }
        )
    }

    /// True iff the error means two commits share no common ancestor.
    pub fn is_no_merge_base(&self) -> bool {
        matches!(self, GitError::NoMergeBase { .. })
    }

    /// Wrap a git2 error as a backend failure with caller context.
    fn backend(context: impl Into<String>, err: &git2::Error) -> Self {
        GitError::Backend {
            context: context.into(),
            message: err.message().to_string(),
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        GitError::Backend {
            context: "validate backend value".into(),
            message: err.to_string(),
        }
    }
}

/// A commit author or committer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Name recorded in the commit
    pub name: String,
    /// Email recorded in the commit
    pub email: String,
    /// When the signature was made
    pub time: DateTime<Utc>,
}

/// A resolved commit.
///
/// Immutable once resolved; owned by the resolution caller and never
/// cached across requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// The commit id
    pub id: Oid,
    /// Commit author
    pub author: Signature,
    /// Commit committer
    pub committer: Signature,
    /// Full commit message
    pub message: String,
    /// First line of the commit message
    pub summary: String,
}

/// The kind of change a diff records for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffStatus {
    Added,
    Deleted,
    Modified,
    Renamed,
    Copied,
    Typechange,
}

/// One file's changes within a branch-to-branch diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    /// Path of the file after the change
    pub path: String,
    /// Previous path, present for renames and copies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,
    /// Kind of change
    pub status: DiffStatus,
    /// Lines added
    pub additions: usize,
    /// Lines deleted
    pub deletions: usize,
    /// Whether the backend classified the content as binary
    pub binary: bool,
}

/// Structured result of diffing two branches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    /// Common ancestor the comparison is rooted at
    pub merge_base: Oid,
    /// Per-file changes, in backend delta order
    pub files: Vec<FileDiff>,
    /// Number of changed files
    pub files_changed: usize,
    /// Total lines added
    pub additions: usize,
    /// Total lines deleted
    pub deletions: usize,
}

/// The Git interface.
///
/// A `Git` value is an open handle to one repository, owned by a single
/// request for its duration. Handles are cheap to open and are never
/// shared across requests; any races on the underlying ref store are
/// arbitrated by the backend's own ref-update semantics.
pub struct Git {
    repo: git2::Repository,
    path: PathBuf,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git").field("path", &self.path).finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Opening
    // =========================================================================

    /// Open the repository at the given path.
    ///
    /// The path must point directly at a repository (bare or with a
    /// worktree); there is no discovery walk, since store paths are
    /// routed exactly.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepository`] if the path holds no repository
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = match git2::Repository::open(path) {
            Ok(repo) => repo,
            Err(e) if e.code() == git2::ErrorCode::NotFound => {
                return Err(GitError::NotARepository {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => return Err(GitError::backend("open repository", &e)),
        };

        Ok(Self {
            repo,
            path: path.to_path_buf(),
        })
    }

    /// The path this handle was opened at.
    pub fn path(&self) -> &Path {
        &self.path
    }

    // =========================================================================
    // Branch Existence and Enumeration
    // =========================================================================

    /// Check whether a local branch exists.
    ///
    /// Reflects current on-disk ref state at call time; existence is
    /// never cached.
    pub fn has_branch(&self, name: &BranchName) -> bool {
        self.repo
            .find_branch(name.as_str(), git2::BranchType::Local)
            .is_ok()
    }

    /// List all local branch names.
    ///
    /// Branches whose names are not valid UTF-8 refnames are skipped.
    pub fn list_branch_names(&self) -> Result<Vec<BranchName>, GitError> {
        let branches = self
            .repo
            .branches(Some(git2::BranchType::Local))
            .map_err(|e| GitError::backend("list branches", &e))?;

        let mut names = Vec::new();
        for branch in branches {
            let (branch, _) = branch.map_err(|e| GitError::backend("list branches", &e))?;
            if let Some(name) = branch.name().ok().flatten() {
                if let Ok(branch_name) = BranchName::new(name) {
                    names.push(branch_name);
                }
            }
        }

        Ok(names)
    }

    // =========================================================================
    // Branch Mutation
    // =========================================================================

    /// Create a branch pointing at the head of `base`.
    ///
    /// # Errors
    ///
    /// - [`GitError::BranchNotFound`] if `base` does not exist
    /// - [`GitError::Backend`] with context "create branch failed" for
    ///   any backend refusal (including a concurrent creation racing
    ///   this one, which the backend's ref store arbitrates)
    pub fn create_branch(&self, name: &BranchName, base: &BranchName) -> Result<(), GitError> {
        let base_commit = self.branch_tip(base)?;

        self.repo
            .branch(name.as_str(), &base_commit, false)
            .map_err(|e| GitError::backend("create branch failed", &e))?;

        Ok(())
    }

    /// Delete a local branch.
    ///
    /// # Errors
    ///
    /// - [`GitError::BranchNotFound`] if the branch does not exist
    /// - [`GitError::Backend`] with context "delete branch failed"
    pub fn delete_branch(&self, name: &BranchName) -> Result<(), GitError> {
        let mut branch = self
            .repo
            .find_branch(name.as_str(), git2::BranchType::Local)
            .map_err(|e| match e.code() {
                git2::ErrorCode::NotFound => GitError::BranchNotFound {
                    name: name.to_string(),
                },
                _ => GitError::backend("delete branch failed", &e),
            })?;

        branch
            .delete()
            .map_err(|e| GitError::backend("delete branch failed", &e))?;

        Ok(())
    }

    // =========================================================================
    // Revision Resolution
    // =========================================================================

    /// Resolve a branch to its head commit.
    ///
    /// # Errors
    ///
    /// - [`GitError::BranchNotFound`] if the branch does not exist
    pub fn branch_head(&self, name: &BranchName) -> Result<Commit, GitError> {
        let tip = self.branch_tip(name)?;
        commit_payload(&tip)
    }

    /// Resolve a revision string (commit id, branch, tag, or other
    /// revspec) to a commit.
    ///
    /// # Errors
    ///
    /// - [`GitError::RevisionNotFound`] if the backend reports the
    ///   revision does not exist or the string is not a resolvable spec
    pub fn resolve_revision(&self, revision: &str) -> Result<Commit, GitError> {
        let object = self.repo.revparse_single(revision).map_err(|e| {
            match e.code() {
                git2::ErrorCode::NotFound | git2::ErrorCode::InvalidSpec => {
                    GitError::RevisionNotFound {
                        revision: revision.to_string(),
                    }
                }
                _ => GitError::backend("resolve revision", &e),
            }
        })?;

        let commit = object
            .peel_to_commit()
            .map_err(|_| GitError::RevisionNotFound {
                revision: revision.to_string(),
            })?;

        commit_payload(&commit)
    }

    /// The first `limit` commits reachable from a branch head, newest
    /// first.
    ///
    /// # Errors
    ///
    /// - [`GitError::BranchNotFound`] if the branch does not exist
    pub fn commits_from_branch(
        &self,
        name: &BranchName,
        limit: usize,
    ) -> Result<Vec<Commit>, GitError> {
        let tip = self.branch_tip(name)?;

        let mut revwalk = self
            .repo
            .revwalk()
            .map_err(|e| GitError::backend("walk commits", &e))?;
        revwalk
            .push(tip.id())
            .map_err(|e| GitError::backend("walk commits", &e))?;

        let mut commits = Vec::new();
        for oid in revwalk.take(limit) {
            let oid = oid.map_err(|e| GitError::backend("walk commits", &e))?;
            let commit = self
                .repo
                .find_commit(oid)
                .map_err(|e| GitError::backend("walk commits", &e))?;
            commits.push(commit_payload(&commit)?);
        }

        Ok(commits)
    }

    /// Resolve a branch to its tip as a backend commit.
    fn branch_tip(&self, name: &BranchName) -> Result<git2::Commit<'_>, GitError> {
        let branch = self
            .repo
            .find_branch(name.as_str(), git2::BranchType::Local)
            .map_err(|e| match e.code() {
                git2::ErrorCode::NotFound => GitError::BranchNotFound {
                    name: name.to_string(),
                },
                _ => GitError::backend("find branch", &e),
            })?;

        branch
            .get()
            .peel_to_commit()
            .map_err(|e| GitError::backend("resolve branch head", &e))
    }

    // =========================================================================
    // Blob Reads
    // =========================================================================

    /// Read the raw bytes of the file at `path` as stored in the commit
    /// named by `revision`.
    ///
    /// # Errors
    ///
    /// - [`GitError::RevisionNotFound`] if the commit does not exist
    /// - [`GitError::PathNotFound`] if the commit's tree has no entry at
    ///   the path
    /// - [`GitError::SubmoduleNotFound`] if the entry is a submodule
    ///   rather than readable content
    pub fn read_blob(&self, revision: &str, path: &str) -> Result<Vec<u8>, GitError> {
        let object = self
            .repo
            .revparse_single(revision)
            .map_err(|_| GitError::RevisionNotFound {
                revision: revision.to_string(),
            })?;
        let commit = object
            .peel_to_commit()
            .map_err(|_| GitError::RevisionNotFound {
                revision: revision.to_string(),
            })?;

        let tree = commit
            .tree()
            .map_err(|e| GitError::backend("read commit tree", &e))?;

        let entry = tree.get_path(Path::new(path)).map_err(|e| match e.code() {
            git2::ErrorCode::NotFound => GitError::PathNotFound {
                path: path.to_string(),
                revision: revision.to_string(),
            },
            _ => GitError::backend("look up tree entry", &e),
        })?;

        // A commit entry inside a tree is a submodule pointer; there is
        // no blob content to read at this revision.
        if entry.kind() == Some(git2::ObjectType::Commit) {
            return Err(GitError::SubmoduleNotFound {
                path: path.to_string(),
                revision: revision.to_string(),
            });
        }

        let blob = self
            .repo
            .find_blob(entry.id())
            .map_err(|e| GitError::backend("read blob", &e))?;

        Ok(blob.content().to_vec())
    }

    // =========================================================================
    // Diff Computation
    // =========================================================================

    /// Compute the structured diff between two branches.
    ///
    /// The comparison is rooted at the merge base of the two tips and
    /// runs to the tip of `branch2`, so the result lists what `branch2`
    /// changed since the branches diverged.
    ///
    /// # Errors
    ///
    /// - [`GitError::BranchNotFound`] if either branch does not exist
    /// - [`GitError::NoMergeBase`] if the branch histories are unrelated
    pub fn diff_branches(
        &self,
        branch1: &BranchName,
        branch2: &BranchName,
    ) -> Result<DiffSummary, GitError> {
        let tip1 = self.branch_tip(branch1)?;
        let tip2 = self.branch_tip(branch2)?;

        let base_oid = match self.repo.merge_base(tip1.id(), tip2.id()) {
            Ok(oid) => oid,
            Err(e) if e.code() == git2::ErrorCode::NotFound => {
                return Err(GitError::NoMergeBase {
                    ours: tip1.id().to_string(),
                    theirs: tip2.id().to_string(),
                })
            }
            Err(e) => return Err(GitError::backend("find merge base", &e)),
        };

        let base_tree = self
            .repo
            .find_commit(base_oid)
            .and_then(|c| c.tree())
            .map_err(|e| GitError::backend("read merge base tree", &e))?;
        let tip_tree = tip2
            .tree()
            .map_err(|e| GitError::backend("read branch tree", &e))?;

        let mut options = git2::DiffOptions::new();
        let mut diff = self
            .repo
            .diff_tree_to_tree(Some(&base_tree), Some(&tip_tree), Some(&mut options))
            .map_err(|e| GitError::backend("diff trees", &e))?;

        let mut find_options = git2::DiffFindOptions::new();
        diff.find_similar(Some(&mut find_options))
            .map_err(|e| GitError::backend("detect renames", &e))?;

        let mut files = Vec::new();
        let mut additions = 0;
        let mut deletions = 0;

        for (index, delta) in diff.deltas().enumerate() {
            let Some(status) = delta_status(delta.status()) else {
                continue;
            };

            let path = delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default();
            let old_path = match status {
                DiffStatus::Renamed | DiffStatus::Copied => delta
                    .old_file()
                    .path()
                    .map(|p| p.to_string_lossy().into_owned()),
                _ => None,
            };

            // A tree-to-tree diff only classifies content as binary
            // once it is loaded, which happens during patch generation;
            // the delta iterator's flags are not yet populated here.
            let patch = git2::Patch::from_diff(&diff, index)
                .map_err(|e| GitError::backend("load file patch", &e))?;
            let binary = match &patch {
                Some(patch) => patch.delta().flags().is_binary(),
                None => delta.flags().is_binary(),
            };
            let (file_additions, file_deletions) = match (&patch, binary) {
                (Some(patch), false) => {
                    let (_, add, del) = patch
                        .line_stats()
                        .map_err(|e| GitError::backend("count diff lines", &e))?;
                    (add, del)
                }
                _ => (0, 0),
            };

            additions += file_additions;
            deletions += file_deletions;
            files.push(FileDiff {
                path,
                old_path,
                status,
                additions: file_additions,
                deletions: file_deletions,
                binary,
            });
        }

        Ok(DiffSummary {
            merge_base: Oid::new(base_oid.to_string())?,
            files_changed: files.len(),
            additions,
            deletions,
            files,
        })
    }
}

/// Map a backend delta status to the wire status, skipping
/// unmodified/untracked noise deltas.
fn delta_status(status: git2::Delta) -> Option<DiffStatus> {
    match status {
        git2::Delta::Added => Some(DiffStatus::Added),
        git2::Delta::Deleted => Some(DiffStatus::Deleted),
        git2::Delta::Modified => Some(DiffStatus::Modified),
        git2::Delta::Renamed => Some(DiffStatus::Renamed),
        git2::Delta::Copied => Some(DiffStatus::Copied),
        git2::Delta::Typechange => Some(DiffStatus::Typechange),
        _ => None,
    }
}

/// Convert a backend commit into the serializable payload.
fn commit_payload(commit: &git2::Commit<'_>) -> Result<Commit, GitError> {
    Ok(Commit {
        id: Oid::new(commit.id().to_string())?,
        author: signature_payload(&commit.author()),
        committer: signature_payload(&commit.committer()),
        message: commit.message().unwrap_or("").to_string(),
        summary: commit.summary().unwrap_or("").to_string(),
    })
}

fn signature_payload(signature: &git2::Signature<'_>) -> Signature {
    let time = DateTime::from_timestamp(signature.when().seconds(), 0)
        .unwrap_or(DateTime::UNIX_EPOCH)
        .with_timezone(&Utc);

    Signature {
        name: signature.name().unwrap_or("").to_string(),
        email: signature.email().unwrap_or("").to_string(),
        time,
    }
}

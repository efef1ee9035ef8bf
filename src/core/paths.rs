//! core::paths
//!
//! Centralized routing from (owner, repository) pairs to on-disk
//! repository storage.
//!
//! All repository locations are computed through [`RepoStore`]; no code
//! outside this module may join store paths itself. The layout mirrors
//! the hosting service's storage convention:
//!
//! ```text
//! <root>/<owner>/<repository>.git
//! ```
//!
//! Owner and repository names are lowercased, so routing is
//! case-insensitive regardless of how a request spells them.
//!
//! # Example
//!
//! ```
//! use refgate::core::paths::RepoStore;
//! use std::path::PathBuf;
//!
//! let store = RepoStore::new("/srv/repositories");
//! assert_eq!(
//!     store.repo_path("Alice", "Demo"),
//!     PathBuf::from("/srv/repositories/alice/demo.git")
//! );
//! ```

use std::path::{Path, PathBuf};

/// Routes (owner, repository) pairs to bare repository paths.
///
/// A `RepoStore` is pure path computation: it never touches the
/// filesystem. Whether a routed path actually holds a repository is
/// decided by the Git doorway when a handle is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoStore {
    root: PathBuf,
}

impl RepoStore {
    /// Create a store rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The store root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the owner's directory.
    pub fn owner_path(&self, owner: &str) -> PathBuf {
        self.root.join(owner.to_lowercase())
    }

    /// Path to a repository's bare storage.
    pub fn repo_path(&self, owner: &str, repo: &str) -> PathBuf {
        self.owner_path(owner)
            .join(format!("{}.git", repo.to_lowercase()))
    }
}

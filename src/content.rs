//! content
//!
//! File content retrieval for side-by-side comparison: given file
//! descriptors naming a path at a base and a target commit, fetch both
//! byte payloads.
//!
//! Binary files are short-circuited to a placeholder without touching
//! the backend, so large blobs are never loaded for a view that cannot
//! render them. Read failures are observed (logged) but never abort the
//! descriptor or its siblings; the affected content field is simply
//! left empty.

use std::borrow::Cow;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use tracing::warn;

use crate::core::paths::RepoStore;
use crate::git::Git;

/// Default placeholder returned in place of binary content.
pub const DEFAULT_BINARY_PLACEHOLDER: &str = "[refgate] binary content is not displayed.";

/// Raw file bytes, kept lossless in memory.
///
/// Text files are not required to be UTF-8 (Latin-1 sources are
/// common), so fetching holds the exact blob bytes. JSON cannot carry
/// arbitrary bytes; the substitution of invalid sequences happens only
/// when a value is serialized, never inside the retriever.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileContent(Vec<u8>);

impl FileContent {
    /// Wrap raw blob bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// The empty content, used when nothing could be read.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// The exact bytes as fetched.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The wire form: UTF-8 with invalid sequences substituted.
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl From<&str> for FileContent {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl PartialEq<&str> for FileContent {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl Serialize for FileContent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string_lossy())
    }
}

impl<'de> Deserialize<'de> for FileContent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self(String::deserialize(deserializer)?.into_bytes()))
    }
}

/// Errors from content retrieval.
///
/// Per-descriptor read failures are not errors; only a malformed batch
/// payload fails the call.
#[derive(Debug, Error)]
pub enum ContentError {
    /// The batch payload could not be parsed into descriptors.
    #[error("invalid file list payload: {0}")]
    InvalidPayload(String),
}

/// Identifies one file at two commits.
///
/// The binary flag is supplied by the caller and is not independently
/// verified here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Repository owner
    pub owner: String,
    /// Repository (project) name
    pub project: String,
    /// File path within the repository
    pub path: String,
    /// Commit id of the base side
    #[serde(rename = "baseCommitID")]
    pub base_commit_id: String,
    /// Commit id of the target side
    #[serde(rename = "targetCommitID")]
    pub target_commit_id: String,
    /// Whether the caller classified the file as binary
    #[serde(rename = "isBinary")]
    pub is_binary: bool,
}

/// A descriptor paired with the content found at each commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffFileContent {
    /// The descriptor this content answers
    pub descriptor: FileDescriptor,
    /// Content at the base commit (placeholder for binary files)
    #[serde(rename = "baseContent")]
    pub base_content: FileContent,
    /// Content at the target commit (empty for binary files)
    #[serde(rename = "targetContent")]
    pub target_content: FileContent,
}

/// Fetches file content at two commits per descriptor.
#[derive(Debug, Clone)]
pub struct ContentRetriever {
    store: RepoStore,
    placeholder: String,
}

impl ContentRetriever {
    /// Create a retriever routing repositories through the given store.
    pub fn new(store: RepoStore) -> Self {
        Self {
            store,
            placeholder: DEFAULT_BINARY_PLACEHOLDER.to_string(),
        }
    }

    /// Override the binary-content placeholder (deployments localize
    /// this via configuration).
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Fetch base and target content for every descriptor, in input
    /// order.
    ///
    /// A failure on one descriptor never affects the others, and the
    /// call as a whole never fails: unreadable content comes back
    /// empty.
    pub fn fetch_diff_files(&self, descriptors: &[FileDescriptor]) -> Vec<DiffFileContent> {
        descriptors
            .iter()
            .map(|descriptor| self.fetch_one(descriptor))
            .collect()
    }

    /// Parse a JSON array of descriptors and fetch their content.
    ///
    /// # Errors
    ///
    /// [`ContentError::InvalidPayload`] when the payload is not a valid
    /// descriptor array; no per-descriptor failure reaches this level.
    pub fn fetch_diff_files_json(
        &self,
        payload: &str,
    ) -> Result<Vec<DiffFileContent>, ContentError> {
        let descriptors: Vec<FileDescriptor> = serde_json::from_str(payload)
            .map_err(|e| ContentError::InvalidPayload(e.to_string()))?;

        Ok(self.fetch_diff_files(&descriptors))
    }

    fn fetch_one(&self, descriptor: &FileDescriptor) -> DiffFileContent {
        if descriptor.is_binary {
            // Deliberate short-circuit: no backend read for content the
            // comparison view cannot render.
            return DiffFileContent {
                descriptor: descriptor.clone(),
                base_content: FileContent::from(self.placeholder.as_str()),
                target_content: FileContent::empty(),
            };
        }

        let path = self.store.repo_path(&descriptor.owner, &descriptor.project);
        let git = match Git::open(&path) {
            Ok(git) => Some(git),
            Err(e) => {
                warn!(
                    owner = %descriptor.owner,
                    project = %descriptor.project,
                    error = %e,
                    "open repository for content fetch failed"
                );
                None
            }
        };

        let read = |revision: &str| -> FileContent {
            let Some(git) = git.as_ref() else {
                return FileContent::empty();
            };
            match git.read_blob(revision, &descriptor.path) {
                Ok(bytes) => FileContent::new(bytes),
                Err(e) => {
                    warn!(
                        path = %descriptor.path,
                        revision = %revision,
                        error = %e,
                        "read blob for content fetch failed"
                    );
                    FileContent::empty()
                }
            }
        };

        DiffFileContent {
            descriptor: descriptor.clone(),
            base_content: read(&descriptor.base_commit_id),
            target_content: read(&descriptor.target_commit_id),
        }
    }
}

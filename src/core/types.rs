//! core::types
//!
//! Strong types for core domain concepts.
//!
//! [`BranchName`] and [`Oid`] enforce validity at construction time, so
//! a malformed name or object id coming in over the wire is rejected at
//! the deserialization boundary instead of deep inside a Git call.
//!
//! # Examples
//!
//! ```
//! use refgate::core::types::{BranchName, Oid};
//!
//! let branch = BranchName::new("feature/my-branch").unwrap();
//! let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
//!
//! assert!(BranchName::new("invalid..name").is_err());
//! assert!(Oid::new("not-a-sha").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),
}

/// A validated Git branch name.
///
/// Branch names must conform to Git's refname rules (see
/// `git check-ref-format`): non-empty, no leading `.` or `-`, no
/// trailing `.lock` or `/`, no `..`, `@{`, `//`, spaces, control
/// characters, or the characters `~ ^ : \ ? * [`, and not exactly `@`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates Git's
    /// refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        let invalid = |msg: &str| Err(TypeError::InvalidBranchName(msg.into()));

        if name.is_empty() {
            return invalid("branch name cannot be empty");
        }
        if name == "@" {
            return invalid("branch name cannot be '@' (reserved)");
        }
        if name.starts_with('.') || name.starts_with('-') {
            return invalid("branch name cannot start with '.' or '-'");
        }
        if name.ends_with('/') {
            return invalid("branch name cannot end with '/'");
        }
        for pattern in ["..", "@{", "//"] {
            if name.contains(pattern) {
                return Err(TypeError::InvalidBranchName(format!(
                    "branch name cannot contain '{pattern}'"
                )));
            }
        }
        const INVALID_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
        for c in INVALID_CHARS {
            if name.contains(c) {
                return Err(TypeError::InvalidBranchName(format!(
                    "branch name cannot contain '{c}'"
                )));
            }
        }
        if name.chars().any(|c| c.is_ascii_control()) {
            return invalid("branch name cannot contain control characters");
        }
        for component in name.split('/') {
            if component.starts_with('.') {
                return invalid("path component cannot start with '.'");
            }
            if component.ends_with(".lock") {
                return invalid("path component cannot end with '.lock'");
            }
        }

        Ok(())
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The full ref name for this branch (`refs/heads/<name>`).
    pub fn to_ref(&self) -> String {
        format!("refs/heads/{}", self.0)
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A Git object identifier (SHA-1 or SHA-256), normalized to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not 40 or 64 hex
    /// characters.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(Self(oid))
    }

    /// Get an abbreviated form: the first `len` characters, or the whole
    /// id if `len` exceeds its length.
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

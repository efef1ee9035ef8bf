//! core::config
//!
//! Service configuration loaded from a toml file.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides
//! earlier):
//! 1. Default values
//! 2. Config file
//!
//! A missing file is not an error for [`Config::load_or_default`]; a
//! present-but-malformed file always is.
//!
//! # Example
//!
//! ```no_run
//! use refgate::core::config::Config;
//! use std::path::Path;
//!
//! let config = Config::load_or_default(Path::new("/etc/refgate.toml")).unwrap();
//! let store = config.repo_store();
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::paths::RepoStore;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    Parse { path: PathBuf, message: String },
}

/// Service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Repository store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Content retrieval settings.
    #[serde(default)]
    pub content: ContentConfig,
}

/// Settings for the on-disk repository store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Root directory holding `<owner>/<repo>.git` layouts.
    #[serde(default = "StoreConfig::default_root")]
    pub root: PathBuf,
}

impl StoreConfig {
    fn default_root() -> PathBuf {
        PathBuf::from("repositories")
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: Self::default_root(),
        }
    }
}

/// Settings for the content retriever.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContentConfig {
    /// Placeholder returned in place of binary file content. The
    /// deployment chooses the localized text; when unset the built-in
    /// default applies.
    #[serde(default)]
    pub binary_placeholder: Option<String>,
}

impl Config {
    /// Load configuration from the given file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` if the file cannot be read and
    /// `ConfigError::Parse` if it is not valid toml.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load configuration, falling back to defaults when the file does
    /// not exist.
    ///
    /// # Errors
    ///
    /// A present-but-unreadable or malformed file is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// The repository store routed by this configuration.
    pub fn repo_store(&self) -> RepoStore {
        RepoStore::new(self.store.root.clone())
    }
}

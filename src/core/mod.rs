//! core
//!
//! Domain types and request-independent plumbing:
//!
//! - [`types`] - Validated branch names and object ids
//! - [`paths`] - Routing from (owner, repository) to on-disk storage
//! - [`config`] - Service configuration loaded from toml

pub mod config;
pub mod paths;
pub mod types;

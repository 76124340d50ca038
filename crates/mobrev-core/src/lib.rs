//! Core types, configuration, and error handling for mobrev.
//!
//! This crate provides the shared foundation used by the other mobrev crates:
//! - [`MobrevError`] - unified error type using `thiserror`
//! - [`MobrevConfig`] - configuration from defaults, `.mobrev.toml` and the environment
//! - Shared types: [`PullRequest`], [`ChangedFile`], [`FileStatus`],
//!   [`PreparedFile`], [`RiskLevel`]

mod config;
mod error;
mod types;

pub use config::{
    AlertConfig, Credentials, GitHubConfig, LlmConfig, MobrevConfig, ReviewConfig,
    DEFAULT_CONFIG_FILE,
};
pub use error::MobrevError;
pub use types::{ChangedFile, FileStatus, PreparedFile, PullRequest, RiskLevel};

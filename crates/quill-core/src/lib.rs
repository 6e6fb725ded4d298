//! Core types, configuration, and error handling for Quill.
//!
//! This crate provides the shared foundation used by the other Quill crates:
//! - [`QuillError`]: unified error type using `thiserror`
//! - [`BotConfig`]: run configuration resolved from the environment
//! - Shared types: [`PullRequestRef`], [`BackendKind`]

mod config;
mod error;
mod types;

pub use config::{
    default_exclude_patterns, split_patterns, BotConfig, GeminiConfig, OllamaConfig,
    DEFAULT_EXCLUDE_PATTERNS, DEFAULT_GITHUB_API_URL,
};
pub use error::QuillError;
pub use types::{BackendKind, PullRequestRef};

/// A convenience `Result` type for Quill operations.
pub type Result<T> = std::result::Result<T, QuillError>;

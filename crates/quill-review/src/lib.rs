//! Review orchestration for Quill.
//!
//! Provides the GitHub client, the generation backends, prompt and comment
//! formatting, and the pipeline that ties them together.

pub mod backend;
pub mod github;
pub mod pipeline;
pub mod prompt;

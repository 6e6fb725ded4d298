/// Errors that can occur during a review run.
///
/// Each variant names the step that failed. Library crates return this type
/// directly; the binary reports it through `miette` and exits with status 1.
///
/// # Examples
///
/// ```
/// use quill_core::QuillError;
///
/// let err = QuillError::Config("GITHUB_TOKEN is not set".into());
/// assert!(err.to_string().contains("GITHUB_TOKEN"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum QuillError {
    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(code(quill::config))]
    Config(String),

    /// An exclude pattern could not be compiled.
    #[error("invalid exclude pattern '{pattern}': {reason}")]
    #[diagnostic(code(quill::pattern))]
    Pattern {
        /// The glob as supplied.
        pattern: String,
        /// Why the translated expression was rejected.
        reason: String,
    },

    /// Fetching the pull request or its diff failed.
    #[error("error fetching PR diff: {0}")]
    #[diagnostic(code(quill::fetch))]
    Fetch(String),

    /// The generation backend failed or answered with an error status.
    #[error("error calling {backend}: {message}")]
    #[diagnostic(code(quill::backend))]
    Backend {
        /// Human-readable backend name.
        backend: String,
        /// Failure detail.
        message: String,
    },

    /// Posting the review comment failed.
    #[error("error posting comment: {0}")]
    #[diagnostic(code(quill::publish))]
    Publish(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    #[diagnostic(code(quill::serialization))]
    Serialization(#[from] serde_json::Error),
}

impl QuillError {
    /// Shorthand for a [`QuillError::Backend`] error.
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }
}

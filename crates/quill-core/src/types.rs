use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QuillError;

/// Identifies one pull request on the hosting platform.
///
/// # Examples
///
/// ```
/// use quill_core::PullRequestRef;
///
/// let pr = PullRequestRef::from_github_env("octocat/hello-world", "refs/pull/42/merge").unwrap();
/// assert_eq!(pr.owner, "octocat");
/// assert_eq!(pr.repo, "hello-world");
/// assert_eq!(pr.number, 42);
/// assert_eq!(pr.to_string(), "octocat/hello-world#42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Pull request number within the repository.
    pub number: u64,
}

impl PullRequestRef {
    /// Build a reference from the `GITHUB_REPOSITORY` and `GITHUB_REF` values
    /// that GitHub Actions provides for `pull_request` events.
    ///
    /// `repository` is `"<owner>/<repo>"`. The pull request number is the
    /// third `/`-delimited segment of `git_ref` (`refs/pull/<n>/merge`).
    ///
    /// # Errors
    ///
    /// Returns [`QuillError::Config`] if either value is malformed.
    pub fn from_github_env(repository: &str, git_ref: &str) -> Result<Self, QuillError> {
        let Some((owner, repo)) = repository.split_once('/') else {
            return Err(QuillError::Config(format!(
                "invalid GITHUB_REPOSITORY '{repository}', expected owner/repo"
            )));
        };
        if owner.is_empty() || repo.is_empty() {
            return Err(QuillError::Config(format!(
                "invalid GITHUB_REPOSITORY '{repository}', expected owner/repo"
            )));
        }

        let Some(segment) = git_ref.split('/').nth(2) else {
            return Err(QuillError::Config(format!(
                "invalid GITHUB_REF '{git_ref}', expected refs/pull/<number>/merge"
            )));
        };
        let number: u64 = segment.parse().map_err(|_| {
            QuillError::Config(format!(
                "invalid pull request number '{segment}' in GITHUB_REF '{git_ref}'"
            ))
        })?;

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            number,
        })
    }
}

impl fmt::Display for PullRequestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

/// Which generation backend produces the review.
///
/// # Examples
///
/// ```
/// use quill_core::BackendKind;
///
/// let kind: BackendKind = "ollama".parse().unwrap();
/// assert_eq!(kind, BackendKind::Ollama);
/// assert_eq!(kind.heading(), "CodeLlama Review");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Google Gemini `generateContent` API.
    #[default]
    Gemini,
    /// A locally served model behind the Ollama API.
    Ollama,
}

impl BackendKind {
    /// Heading shown in bold at the top of the posted comment.
    pub fn heading(self) -> &'static str {
        match self {
            BackendKind::Gemini => "Gemini Review",
            BackendKind::Ollama => "CodeLlama Review",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Gemini => write!(f, "gemini"),
            BackendKind::Ollama => write!(f, "ollama"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(BackendKind::Gemini),
            "ollama" | "codellama" => Ok(BackendKind::Ollama),
            other => Err(format!(
                "unknown backend '{other}', expected 'gemini' or 'ollama'"
            )),
        }
    }
}

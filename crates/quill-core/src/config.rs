use serde::{Deserialize, Serialize};

use crate::error::QuillError;
use crate::types::{BackendKind, PullRequestRef};

/// Default GitHub REST API base.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Default exclude patterns applied to diff headers.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &["**/*.json", "**/*.md"];

/// Everything a review run needs, resolved once at startup.
///
/// Built from the environment (GitHub Actions variables plus backend settings)
/// and passed by reference into each step.
///
/// # Examples
///
/// ```
/// use quill_core::{BackendKind, BotConfig};
///
/// let env = |key: &str| match key {
///     "GITHUB_TOKEN" => Some("ghp_test".to_string()),
///     "GITHUB_REPOSITORY" => Some("octocat/hello-world".to_string()),
///     "GITHUB_REF" => Some("refs/pull/7/merge".to_string()),
///     "QUILL_BACKEND" => Some("ollama".to_string()),
///     _ => None,
/// };
/// let config = BotConfig::from_lookup(env).unwrap();
/// assert_eq!(config.pull_request.number, 7);
/// assert_eq!(config.backend, BackendKind::Ollama);
/// assert_eq!(config.ollama.address, "http://localhost:11434");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Pull request under review.
    pub pull_request: PullRequestRef,
    /// Token for the GitHub API.
    #[serde(skip_serializing)]
    pub github_token: String,
    /// GitHub REST API base URL.
    pub github_api_url: String,
    /// Selected generation backend.
    pub backend: BackendKind,
    /// Gemini settings, used when `backend` is [`BackendKind::Gemini`].
    pub gemini: GeminiConfig,
    /// Ollama settings, used when `backend` is [`BackendKind::Ollama`].
    pub ollama: OllamaConfig,
    /// Glob patterns whose diff headers are dropped before review.
    pub exclude_patterns: Vec<String>,
}

impl BotConfig {
    /// Resolve configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`BotConfig::from_lookup`].
    pub fn from_env() -> Result<Self, QuillError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`QuillError::Config`] if a required variable is missing, the
    /// pull request cannot be derived, the backend name is unknown, or the
    /// Gemini backend is selected without `GEMINI_API_KEY`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, QuillError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| QuillError::Config(format!("{key} is not set")))
        };

        let github_token = require("GITHUB_TOKEN")?;
        let repository = require("GITHUB_REPOSITORY")?;
        let git_ref = require("GITHUB_REF")?;
        let pull_request = PullRequestRef::from_github_env(&repository, &git_ref)?;

        let backend = match get("QUILL_BACKEND") {
            Some(name) => name.parse::<BackendKind>().map_err(QuillError::Config)?,
            None => BackendKind::default(),
        };

        let gemini = GeminiConfig {
            api_key: get("GEMINI_API_KEY"),
            model: get("GEMINI_MODEL").unwrap_or_else(default_gemini_model),
            endpoint: get("GEMINI_ENDPOINT").unwrap_or_else(default_gemini_endpoint),
        };
        let ollama = OllamaConfig {
            address: get("OLLAMA_ADDRESS").unwrap_or_else(default_ollama_address),
            model: get("OLLAMA_MODEL").unwrap_or_else(default_ollama_model),
        };

        let exclude_patterns = match get("QUILL_EXCLUDE") {
            Some(list) => split_patterns(&list),
            None => default_exclude_patterns(),
        };

        let config = Self {
            pull_request,
            github_token,
            github_api_url: get("GITHUB_API_URL")
                .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
            backend,
            gemini,
            ollama,
            exclude_patterns,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field requirements.
    ///
    /// # Errors
    ///
    /// Returns [`QuillError::Config`] if the Gemini backend is selected
    /// without an API key.
    pub fn validate(&self) -> Result<(), QuillError> {
        if self.backend == BackendKind::Gemini && self.gemini.api_key.is_none() {
            return Err(QuillError::Config(
                "GEMINI_API_KEY is required for the gemini backend".into(),
            ));
        }
        Ok(())
    }
}

/// Gemini `generateContent` settings.
///
/// # Examples
///
/// ```
/// use quill_core::GeminiConfig;
///
/// let config = GeminiConfig::default();
/// assert_eq!(config.model, "gemini-1.5-flash");
/// assert!(config.api_key.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key, sent as the `key` query parameter.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Model path segment.
    pub model: String,
    /// Base URL up to and including `/models`.
    pub endpoint: String,
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".into()
}

fn default_gemini_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models".into()
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            endpoint: default_gemini_endpoint(),
        }
    }
}

/// Ollama `/api/generate` settings.
///
/// # Examples
///
/// ```
/// use quill_core::OllamaConfig;
///
/// let config = OllamaConfig::default();
/// assert_eq!(config.address, "http://localhost:11434");
/// assert_eq!(config.model, "codellama");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL of the Ollama server.
    pub address: String,
    /// Model identifier passed in each request.
    pub model: String,
}

fn default_ollama_address() -> String {
    "http://localhost:11434".into()
}

fn default_ollama_model() -> String {
    "codellama".into()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            address: default_ollama_address(),
            model: default_ollama_model(),
        }
    }
}

/// The built-in exclude patterns as owned strings.
pub fn default_exclude_patterns() -> Vec<String> {
    DEFAULT_EXCLUDE_PATTERNS
        .iter()
        .map(|p| (*p).to_string())
        .collect()
}

/// Split a comma-separated pattern list, dropping blank entries.
///
/// # Examples
///
/// ```
/// use quill_core::split_patterns;
///
/// assert_eq!(split_patterns("**/*.lock, ,docs/**"), vec!["**/*.lock", "docs/**"]);
/// ```
pub fn split_patterns(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const BASE: &[(&str, &str)] = &[
        ("GITHUB_TOKEN", "ghp_test"),
        ("GITHUB_REPOSITORY", "octocat/hello-world"),
        ("GITHUB_REF", "refs/pull/42/merge"),
        ("GEMINI_API_KEY", "gem-key"),
    ];

    #[test]
    fn defaults_from_minimal_environment() {
        let config = BotConfig::from_lookup(lookup(BASE)).unwrap();
        assert_eq!(config.pull_request.to_string(), "octocat/hello-world#42");
        assert_eq!(config.github_api_url, "https://api.github.com");
        assert_eq!(config.backend, BackendKind::Gemini);
        assert_eq!(config.gemini.api_key.as_deref(), Some("gem-key"));
        assert_eq!(config.gemini.model, "gemini-1.5-flash");
        assert_eq!(config.ollama.address, "http://localhost:11434");
        assert_eq!(config.exclude_patterns, vec!["**/*.json", "**/*.md"]);
    }

    #[test]
    fn missing_token_is_config_error() {
        let env = lookup(&BASE[1..]);
        let err = BotConfig::from_lookup(env).unwrap_err();
        assert_eq!(err.to_string(), "configuration error: GITHUB_TOKEN is not set");
    }

    #[test]
    fn blank_value_counts_as_unset() {
        let mut pairs = BASE.to_vec();
        pairs.push(("GITHUB_TOKEN", "  "));
        let env = lookup(&pairs);
        assert!(BotConfig::from_lookup(env).is_err());
    }

    #[test]
    fn gemini_requires_api_key() {
        let env = lookup(&BASE[..3]);
        let err = BotConfig::from_lookup(env).unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn ollama_does_not_need_gemini_key() {
        let mut pairs = BASE[..3].to_vec();
        pairs.push(("QUILL_BACKEND", "ollama"));
        pairs.push(("OLLAMA_ADDRESS", "http://gpu-box:11434"));
        let config = BotConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.backend, BackendKind::Ollama);
        assert_eq!(config.ollama.address, "http://gpu-box:11434");
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let mut pairs = BASE.to_vec();
        pairs.push(("QUILL_BACKEND", "openai"));
        let err = BotConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(err.to_string().contains("unknown backend"));
    }

    #[test]
    fn exclude_list_overrides_defaults() {
        let mut pairs = BASE.to_vec();
        pairs.push(("QUILL_EXCLUDE", "**/*.lock,vendor/**"));
        let config = BotConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.exclude_patterns, vec!["**/*.lock", "vendor/**"]);
    }

    #[test]
    fn secrets_are_not_serialized() {
        let config = BotConfig::from_lookup(lookup(BASE)).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("ghp_test"));
        assert!(!json.contains("gem-key"));
    }
}

//! Pre-LLM diff filtering by exclude pattern.
//!
//! Drops the `diff --git` header lines of files matching an exclude glob
//! before the diff reaches the generation backend. Filtering works line by
//! line: the body lines that follow an excluded header are kept.

use quill_core::{BotConfig, QuillError};
use regex::Regex;
use tracing::debug;

const HEADER_PREFIX: &str = "diff --git a/";
const HEADER_SEPARATOR: &str = " b/";

/// Exclude patterns compiled for matching against diff header paths.
///
/// # Examples
///
/// ```
/// use quill_diff::filter::DiffFilter;
///
/// let filter = DiffFilter::new(&["**/*.json", "**/*.md"]).unwrap();
/// assert!(filter.is_excluded("package.json"));
/// assert!(filter.is_excluded("docs/guide.md"));
/// assert!(!filter.is_excluded("src/main.rs"));
/// ```
#[derive(Debug, Clone)]
pub struct DiffFilter {
    patterns: Vec<ExcludePattern>,
}

#[derive(Debug, Clone)]
struct ExcludePattern {
    glob: String,
    regex: Regex,
}

impl DiffFilter {
    /// Compile a filter from glob patterns.
    ///
    /// # Errors
    ///
    /// Returns [`QuillError::Pattern`] if a pattern is empty or its
    /// translated expression is rejected by the regex engine.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, QuillError> {
        let mut compiled = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let glob = pattern.as_ref();
            if glob.is_empty() {
                return Err(QuillError::Pattern {
                    pattern: String::new(),
                    reason: "pattern is empty".into(),
                });
            }
            let regex = Regex::new(&glob_to_regex(glob)).map_err(|e| QuillError::Pattern {
                pattern: glob.to_string(),
                reason: e.to_string(),
            })?;
            compiled.push(ExcludePattern {
                glob: glob.to_string(),
                regex,
            });
        }
        Ok(Self { patterns: compiled })
    }

    /// Create a filter from the run configuration's exclude patterns.
    ///
    /// # Errors
    ///
    /// Same as [`DiffFilter::new`].
    pub fn from_config(config: &BotConfig) -> Result<Self, QuillError> {
        Self::new(&config.exclude_patterns)
    }

    /// The glob patterns this filter was built from, in order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|p| p.glob.as_str())
    }

    /// Check whether a file path matches any exclude pattern.
    pub fn is_excluded(&self, path: &str) -> bool {
        self.matching_pattern(path).is_some()
    }

    fn matching_pattern(&self, path: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|p| p.regex.is_match(path))
            .map(|p| p.glob.as_str())
    }

    /// Remove header lines of excluded files from `diff`.
    ///
    /// Lines are split on `\n` and rejoined with `\n`, so a trailing newline
    /// survives. Only header lines are ever removed.
    ///
    /// # Examples
    ///
    /// ```
    /// use quill_diff::filter::DiffFilter;
    ///
    /// let filter = DiffFilter::new(&["**/*.md"]).unwrap();
    /// let result = filter.filter("diff --git a/x.md b/x.md\n+hello\n");
    /// assert_eq!(result.text, "+hello\n");
    /// assert_eq!(result.excluded, vec!["x.md"]);
    /// ```
    pub fn filter(&self, diff: &str) -> FilteredDiff {
        let mut kept: Vec<&str> = Vec::new();
        let mut excluded = Vec::new();

        for line in diff.split('\n') {
            if let Some(path) = header_path(line) {
                if let Some(glob) = self.matching_pattern(path) {
                    debug!(path, pattern = glob, "dropping excluded diff header");
                    excluded.push(path.to_string());
                    continue;
                }
            }
            kept.push(line);
        }

        FilteredDiff {
            text: kept.join("\n"),
            excluded,
        }
    }
}

/// Result of filtering a diff.
///
/// # Examples
///
/// ```
/// use quill_diff::filter::FilteredDiff;
///
/// let result = FilteredDiff {
///     text: String::new(),
///     excluded: vec!["package.json".into()],
/// };
/// assert!(result.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredDiff {
    /// Surviving diff text.
    pub text: String,
    /// `a/` paths of the headers that were dropped, in diff order.
    pub excluded: Vec<String>,
}

impl FilteredDiff {
    /// `true` when nothing is left to review.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Extract the `a/` path from a `diff --git a/<path> b/<path>` header line.
///
/// The path ends at the first ` b/` that leaves a non-empty `b/` side.
///
/// # Examples
///
/// ```
/// use quill_diff::filter::header_path;
///
/// assert_eq!(header_path("diff --git a/src/lib.rs b/src/lib.rs"), Some("src/lib.rs"));
/// assert_eq!(header_path("+diff --git a/x b/x"), None);
/// ```
pub fn header_path(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(HEADER_PREFIX)?;
    rest.match_indices(HEADER_SEPARATOR)
        .find(|(idx, _)| *idx > 0 && idx + HEADER_SEPARATOR.len() < rest.len())
        .map(|(idx, _)| &rest[..idx])
}

/// Translate a glob into an anchored regular expression.
///
/// `**/` matches zero or more leading directories, `**` matches any
/// characters, `*` matches any characters except `/`, `?` matches a single
/// character except `/`. Everything else is literal.
///
/// The match is rooted at the start of the path: `*.json` only matches
/// top-level files, so nested paths need a leading `**/`.
///
/// # Examples
///
/// ```
/// use quill_diff::filter::glob_to_regex;
///
/// assert_eq!(glob_to_regex("**/*.json"), r"^(?:.*/)?[^/]*\.json$");
/// ```
pub fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() * 2 + 2);
    out.push('^');

    let mut chars = glob.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("(?:.*/)?");
                } else {
                    out.push_str(".*");
                }
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            other => {
                let mut buf = [0u8; 4];
                out.push_str(&regex::escape(other.encode_utf8(&mut buf)));
            }
        }
    }

    out.push('$');
    out
}

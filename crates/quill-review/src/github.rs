use async_trait::async_trait;
use quill_core::{BotConfig, PullRequestRef, QuillError};
use tracing::{debug, info, instrument};

/// The hosting-platform operations a review run needs.
#[async_trait]
pub trait PullRequestHost: Send + Sync {
    /// Fetch the unified diff of `pr` as text.
    ///
    /// # Errors
    ///
    /// Returns [`QuillError::Fetch`] on any failure.
    async fn fetch_diff(&self, pr: &PullRequestRef) -> Result<String, QuillError>;

    /// Create a new comment on `pr` with `body`.
    ///
    /// # Errors
    ///
    /// Returns [`QuillError::Publish`] on any failure.
    async fn post_comment(&self, pr: &PullRequestRef, body: &str) -> Result<(), QuillError>;
}

/// GitHub client for fetching pull request diffs and posting comments.
///
/// Pull request metadata and comments go through the REST API; the diff
/// itself is downloaded from the `diff_url` the API reports.
///
/// # Examples
///
/// ```no_run
/// use quill_review::github::GitHubClient;
///
/// let client = GitHubClient::new("ghp_xxxx", "https://api.github.com").unwrap();
/// ```
pub struct GitHubClient {
    octocrab: octocrab::Octocrab,
    http: reqwest::Client,
}

impl GitHubClient {
    /// Create a client authenticated with `token` against `api_url`.
    ///
    /// # Errors
    ///
    /// Returns [`QuillError::Config`] if `api_url` is not a valid URI or the
    /// client cannot be built.
    pub fn new(token: &str, api_url: &str) -> Result<Self, QuillError> {
        Self::with_client(token, api_url, reqwest::Client::new())
    }

    /// Create a client that downloads diffs through `http`.
    ///
    /// # Errors
    ///
    /// Same as [`GitHubClient::new`].
    pub fn with_client(
        token: &str,
        api_url: &str,
        http: reqwest::Client,
    ) -> Result<Self, QuillError> {
        let octocrab = octocrab::Octocrab::builder()
            .personal_token(token.to_string())
            .base_uri(api_url)
            .map_err(|e| QuillError::Config(format!("invalid GitHub API URL '{api_url}': {e}")))?
            .build()
            .map_err(|e| QuillError::Config(format!("failed to create GitHub client: {e}")))?;

        Ok(Self { octocrab, http })
    }

    /// Create a client from the run configuration.
    ///
    /// # Errors
    ///
    /// Same as [`GitHubClient::new`].
    pub fn from_config(config: &BotConfig) -> Result<Self, QuillError> {
        Self::new(&config.github_token, &config.github_api_url)
    }

    /// Fetch the unified diff for a pull request.
    ///
    /// # Errors
    ///
    /// Returns [`QuillError::Fetch`] if the pull request cannot be read, has
    /// no diff URL, or the diff download fails.
    #[instrument(skip_all, fields(pr = %pr))]
    pub async fn get_pr_diff(&self, pr: &PullRequestRef) -> Result<String, QuillError> {
        let pull = self
            .octocrab
            .pulls(pr.owner.as_str(), pr.repo.as_str())
            .get(pr.number)
            .await
            .map_err(|e| QuillError::Fetch(format!("failed to get pull request {pr}: {e}")))?;

        let diff_url = pull
            .diff_url
            .ok_or_else(|| QuillError::Fetch(format!("pull request {pr} has no diff URL")))?;

        debug!("GET {diff_url}");
        let response = self
            .http
            .get(diff_url.as_str())
            .header("User-Agent", "quill")
            .send()
            .await
            .map_err(|e| QuillError::Fetch(format!("failed to download diff: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(240).collect();
            return Err(QuillError::Fetch(format!(
                "diff download returned {status}: {snippet}"
            )));
        }

        let diff = response
            .text()
            .await
            .map_err(|e| QuillError::Fetch(format!("failed to read diff response: {e}")))?;
        debug!(bytes = diff.len(), "fetched diff");
        Ok(diff)
    }

    /// Post `body` as a new issue comment on the pull request.
    ///
    /// # Errors
    ///
    /// Returns [`QuillError::Publish`] on API errors.
    #[instrument(skip_all, fields(pr = %pr))]
    pub async fn create_comment(&self, pr: &PullRequestRef, body: &str) -> Result<(), QuillError> {
        let comment = self
            .octocrab
            .issues(pr.owner.as_str(), pr.repo.as_str())
            .create_comment(pr.number, body)
            .await
            .map_err(|e| QuillError::Publish(e.to_string()))?;
        info!(url = %comment.html_url, "Review comment posted successfully.");
        Ok(())
    }
}

#[async_trait]
impl PullRequestHost for GitHubClient {
    async fn fetch_diff(&self, pr: &PullRequestRef) -> Result<String, QuillError> {
        self.get_pr_diff(pr).await
    }

    async fn post_comment(&self, pr: &PullRequestRef, body: &str) -> Result<(), QuillError> {
        self.create_comment(pr, body).await
    }
}

use quill_core::{PullRequestRef, QuillError};
use quill_diff::filter::DiffFilter;
use tracing::info;

use crate::backend::ReviewBackend;
use crate::github::PullRequestHost;
use crate::prompt;

/// How a review run ended.
///
/// # Examples
///
/// ```
/// use quill_review::pipeline::ReviewOutcome;
///
/// let outcome = ReviewOutcome::NothingToReview { excluded: vec!["package.json".into()] };
/// assert!(outcome.comment_body().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// Filtering left no text; neither backend nor host was called.
    NothingToReview {
        /// Paths whose headers were dropped.
        excluded: Vec<String>,
    },
    /// The review was posted as a comment.
    Posted {
        /// The comment body that was posted.
        body: String,
    },
    /// Dry run: the comment was built but not posted.
    DryRun {
        /// The comment body that would have been posted.
        body: String,
    },
}

impl ReviewOutcome {
    /// The comment body, if the run got as far as building one.
    pub fn comment_body(&self) -> Option<&str> {
        match self {
            ReviewOutcome::NothingToReview { .. } => None,
            ReviewOutcome::Posted { body } | ReviewOutcome::DryRun { body } => Some(body),
        }
    }
}

/// Review orchestrator: fetch diff, filter, generate review, post comment.
///
/// Every step is awaited in turn and the first error ends the run. The
/// pipeline never exits the process; callers decide what an error means.
pub struct ReviewPipeline<'a> {
    host: &'a dyn PullRequestHost,
    backend: &'a dyn ReviewBackend,
    filter: DiffFilter,
    dry_run: bool,
}

impl<'a> ReviewPipeline<'a> {
    /// Create a pipeline that posts its review.
    pub fn new(host: &'a dyn PullRequestHost, backend: &'a dyn ReviewBackend, filter: DiffFilter) -> Self {
        Self {
            host,
            backend,
            filter,
            dry_run: false,
        }
    }

    /// Build the comment but skip posting it.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run a review of `pr`.
    ///
    /// # Errors
    ///
    /// Returns [`QuillError::Fetch`], [`QuillError::Backend`], or
    /// [`QuillError::Publish`] from the step that failed. Later steps do
    /// not run.
    pub async fn run(&self, pr: &PullRequestRef) -> Result<ReviewOutcome, QuillError> {
        info!(%pr, backend = self.backend.name(), "reviewing pull request");

        let diff = self.host.fetch_diff(pr).await?;
        let filtered = self.filter.filter(&diff);
        if !filtered.excluded.is_empty() {
            info!(count = filtered.excluded.len(), "excluded file headers from review");
        }

        if filtered.is_empty() {
            info!("No reviewable changes after filtering.");
            return Ok(ReviewOutcome::NothingToReview {
                excluded: filtered.excluded,
            });
        }

        let review = self.backend.generate_review(&filtered.text).await?;
        let body = prompt::format_comment_body(self.backend.kind(), &review);

        if self.dry_run {
            info!("dry run, not posting comment");
            return Ok(ReviewOutcome::DryRun { body });
        }

        self.host.post_comment(pr, &body).await?;
        Ok(ReviewOutcome::Posted { body })
    }
}

use quill_core::BackendKind;

const REVIEW_INSTRUCTIONS: &str = "Review the following code diff and provide detailed feedback \
on potential issues, best practices, and improvements:";

/// Build the prompt sent to the generation backend.
///
/// # Examples
///
/// ```
/// use quill_review::prompt::build_review_prompt;
///
/// let prompt = build_review_prompt("+new line");
/// assert!(prompt.starts_with("Review the following code diff"));
/// assert!(prompt.ends_with("\n\n+new line"));
/// ```
pub fn build_review_prompt(diff: &str) -> String {
    format!("{REVIEW_INSTRUCTIONS}\n\n{diff}")
}

/// Format the pull request comment: bold backend heading, blank line, review.
///
/// # Examples
///
/// ```
/// use quill_core::BackendKind;
/// use quill_review::prompt::format_comment_body;
///
/// let body = format_comment_body(BackendKind::Gemini, "Looks fine.");
/// assert_eq!(body, "**Gemini Review**\n\nLooks fine.");
/// ```
pub fn format_comment_body(kind: BackendKind, review: &str) -> String {
    format!("**{}**\n\n{review}", kind.heading())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_diff_verbatim() {
        let diff = "diff --git a/x b/x\n+  indented\n";
        let prompt = build_review_prompt(diff);
        assert!(prompt.contains("potential issues, best practices, and improvements:\n\n"));
        assert!(prompt.ends_with(diff));
    }

    #[test]
    fn ollama_comment_uses_codellama_heading() {
        let body = format_comment_body(BackendKind::Ollama, "Rename x.");
        assert_eq!(body, "**CodeLlama Review**\n\nRename x.");
    }
}

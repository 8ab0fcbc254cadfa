//! Change-request prompt assembly.

use crate::error::Result;
use crate::github::IssueRecord;

/// Fixed instruction placed ahead of the serialized repository
pub const PREAMBLE: &str = "You are a software developer. Below is the Code, issues and User request to make changes. Make sure to make changes in the code given according to the issue given by fixing the issue:\n\n\n";

/// A composed prompt, sent once to the completion service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptDocument(String);

impl PromptDocument {
    /// Borrow the prompt text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Builds the prompt from a serialized repository, its issues and the user's instructions
///
/// A `target` that matches no issue number is ignored.
pub fn compose(
    markdown: &str,
    issues: &[IssueRecord],
    target: Option<u64>,
    free_text: Option<&str>,
) -> Result<PromptDocument> {
    let mut prompt = String::with_capacity(PREAMBLE.len() + markdown.len() + 256);
    prompt.push_str(PREAMBLE);
    prompt.push_str(markdown);

    if !issues.is_empty() {
        prompt.push_str("\n\nIssues:\n");
        prompt.push_str(&serde_json::to_string(issues)?);
    }

    if let Some(text) = free_text.map(str::trim).filter(|t| !t.is_empty()) {
        prompt.push_str("\n\nCustom Changes:\n");
        prompt.push_str(text);
    }

    if let Some(issue) = target.and_then(|n| issues.iter().find(|i| i.number == n)) {
        prompt.push_str(&format!(
            "\n\nFix the given Issue: {}:\n{}\n{}",
            issue.number,
            issue.title,
            issue.body.as_deref().unwrap_or_default()
        ));
    }

    Ok(PromptDocument(prompt))
}

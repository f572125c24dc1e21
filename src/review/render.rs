use super::{Comment, ReviewResult};
use crate::analysis::Severity;

pub(crate) fn severity_symbol(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "❌",
        Severity::Warning => "⚠️",
        Severity::Info => "ℹ️",
    }
}

/// Render a review as a self-contained markdown report.
///
/// Deterministic given the review: files appear in first-seen order and
/// comments keep their input order within each file.
pub fn markdown_report(review: &ReviewResult) -> String {
    let mut lines: Vec<String> = Vec::new();
    let metadata = &review.metadata;

    lines.push("# PR Review Report".to_string());
    lines.push(String::new());

    lines.push("## Summary".to_string());
    lines.push(review.summary.clone());
    lines.push(String::new());

    lines.push("## Statistics".to_string());
    lines.push(format!("- **Total Issues:** {}", metadata.total_findings));
    lines.push(format!("- **Errors:** {}", metadata.severity_breakdown.error));
    lines.push(format!("- **Warnings:** {}", metadata.severity_breakdown.warning));
    lines.push(format!("- **Suggestions:** {}", metadata.severity_breakdown.info));
    lines.push(String::new());

    if !metadata.most_problematic_files.is_empty() {
        lines.push("## Files with Most Issues".to_string());
        for entry in &metadata.most_problematic_files {
            lines.push(format!("- `{}`: {} issues", entry.file, entry.issues));
        }
        lines.push(String::new());
    }

    if !review.comments.is_empty() {
        lines.push("## Detailed Findings".to_string());
        lines.push(String::new());

        for (file, comments) in group_by_file(&review.comments) {
            lines.push(format!("### `{}`", file));
            lines.push(String::new());

            for comment in comments {
                lines.push(format!(
                    "**Line {}** {} {}",
                    comment.line,
                    severity_symbol(comment.severity),
                    comment.severity.as_str().to_uppercase()
                ));
                lines.push(format!("- **Issue:** {}", comment.message));
                if let Some(rule) = &comment.rule {
                    lines.push(format!("- **Rule:** `{}`", rule));
                }
                if let Some(suggestion) = &comment.suggestion {
                    lines.push(format!("- **Suggestion:** {}", suggestion));
                }
                if !comment.tool.is_empty() {
                    lines.push(format!("- **Tool:** {}", comment.tool));
                }
                lines.push(String::new());
            }
        }
    }

    lines.push("---".to_string());
    lines.push(format!("*Report generated on {}*", metadata.timestamp));

    lines.join("\n")
}

/// Group comments by file, preserving first-seen file order and input order
/// within each file.
fn group_by_file(comments: &[Comment]) -> Vec<(&str, Vec<&Comment>)> {
    let mut groups: Vec<(&str, Vec<&Comment>)> = Vec::new();
    for comment in comments {
        match groups.iter_mut().find(|(file, _)| *file == comment.file) {
            Some((_, group)) => group.push(comment),
            None => groups.push((comment.file.as_str(), vec![comment])),
        }
    }
    groups
}

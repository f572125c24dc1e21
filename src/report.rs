use std::path::Path;

use colored::{ColoredString, Colorize};

use crate::analysis::Severity;
use crate::provider::types::PrContext;
use crate::review::ReviewResult;
use crate::scoring::ScoreResult;

/// How many sample findings to show inline in the terminal.
const SAMPLE_FINDINGS: usize = 3;

/// Print the full review to the terminal with colors.
pub fn print_report(
    ctx: &PrContext,
    score: &ScoreResult,
    review: &ReviewResult,
    artifact_path: &Path,
) {
    println!();
    println!("PR #{}: \"{}\"", ctx.pr_number, ctx.title);
    println!(
        "{} | {} -> {} | Files changed: {} | +{} -{}",
        ctx.provider,
        ctx.head_ref,
        ctx.base_ref,
        ctx.files.len(),
        ctx.total_additions(),
        ctx.total_deletions()
    );
    println!();

    println!("═══ PR Quality Score ═══");
    println!(
        "Score: {}/100 ({})",
        colorize_score(score.score),
        score.grade.bold()
    );
    println!();

    println!("{}", review.summary);
    println!();

    let metrics = &score.metrics;
    println!("═══ Metrics ═══");
    println!("  Total findings: {}", metrics.total_findings);
    println!("  Errors: {}", metrics.error_count);
    println!("  Warnings: {}", metrics.warning_count);
    println!("  Suggestions: {}", metrics.info_count);
    println!("  Net lines: {:+}", metrics.net_lines);
    println!();

    if !score.recommendations.is_empty() {
        println!("═══ Recommendations ═══");
        for recommendation in &score.recommendations {
            println!("  • {}", recommendation);
        }
        println!();
    }

    if !review.comments.is_empty() {
        println!(
            "Found {} issues. Sample findings:",
            review.comments.len()
        );
        for comment in review.comments.iter().take(SAMPLE_FINDINGS) {
            println!();
            println!("  {}:{}", comment.file, comment.line);
            println!("     {}", colorize_message(&comment.message, comment.severity));
            if let Some(suggestion) = &comment.suggestion {
                println!("     {}", suggestion.dimmed());
            }
        }
        println!();
    }

    println!("Full report saved to: {}", artifact_path.display());
    println!();
}

fn colorize_score(score: f64) -> ColoredString {
    let text = format!("{}", score);
    if score >= 80.0 {
        text.green().bold()
    } else if score >= 60.0 {
        text.yellow().bold()
    } else {
        text.red().bold()
    }
}

fn colorize_message(message: &str, severity: Severity) -> ColoredString {
    match severity {
        Severity::Error => message.red().bold(),
        Severity::Warning => message.yellow(),
        Severity::Info => message.blue(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::types::FileChange;
    use crate::review::generate_review;
    use crate::scoring::{calculate_score, Weights};
    use crate::analysis::Finding;

    #[test]
    fn test_print_report_does_not_panic() {
        let ctx = PrContext {
            provider: "github".to_string(),
            owner: "org".to_string(),
            repo: "repo".to_string(),
            pr_number: 42,
            title: "Add OAuth2 login flow".to_string(),
            head_ref: "feature".to_string(),
            base_ref: "main".to_string(),
            head_sha: "abc".to_string(),
            files: vec![FileChange {
                path: "src/auth.rs".to_string(),
                additions: 10,
                deletions: 2,
                status: "modified".to_string(),
                patch: String::new(),
            }],
        };
        let findings = vec![Finding {
            file: "src/auth.rs".to_string(),
            severity: Severity::Warning,
            tool: "style".to_string(),
            message: "Trailing whitespace".to_string(),
            code: Some("W291".to_string()),
            suggestion: Some("Strip it".to_string()),
            ..Finding::default()
        }];
        let score = calculate_score(&findings, &ctx, &Weights::default());
        let review = generate_review(&findings, &ctx);
        print_report(&ctx, &score, &review, Path::new("artifacts/review_github_42.json"));
    }
}

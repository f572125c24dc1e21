use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

use crate::analysis::Severity;
use crate::provider::types::PrContext;
use crate::review::render::{markdown_report, severity_symbol};
use crate::review::{Comment, ReviewResult};
use crate::scoring::ScoreResult;

const ARTIFACT_VERSION: &str = "1.0";
/// GitHub caps review comments per submitted review.
const MAX_REVIEW_COMMENTS: usize = 20;
/// Above this many comments, info-severity ones are dropped from posting.
const LARGE_REVIEW_THRESHOLD: usize = 10;

#[derive(Debug, Error)]
pub enum CiError {
    #[error("Failed to write artifact: {0}")]
    FileWrite(#[from] std::io::Error),

    #[error("Failed to serialize artifact: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("GitHub API request failed: {0}")]
    Api(#[from] reqwest::Error),

    #[error("GitHub token not available for comment posting")]
    MissingToken,

    #[error("Comment posting is only supported for GitHub PRs")]
    UnsupportedProvider,
}

/// Everything persisted for one review run.
#[derive(Debug, Serialize, Deserialize)]
pub struct Artifact {
    pub pr_context: PrContext,
    pub review: ReviewResult,
    pub score: ScoreResult,
    pub version: String,
}

/// Write the JSON artifact and the markdown report into the output
/// directory, creating it as needed. Returns the JSON artifact path.
#[instrument(skip(review, score, ctx), fields(provider = %ctx.provider, pr = ctx.pr_number))]
pub fn save_artifacts(
    review: &ReviewResult,
    score: &ScoreResult,
    ctx: &PrContext,
    output_dir: &Path,
) -> Result<PathBuf, CiError> {
    fs::create_dir_all(output_dir)?;
    let stem = format!("review_{}_{}", ctx.provider, ctx.pr_number);

    let artifact = Artifact {
        pr_context: ctx.clone(),
        review: review.clone(),
        score: score.clone(),
        version: ARTIFACT_VERSION.to_string(),
    };
    let json_path = output_dir.join(format!("{}.json", stem));
    fs::write(&json_path, serde_json::to_string_pretty(&artifact)?)?;
    info!(path = %json_path.display(), "saved review artifact");

    let markdown_path = output_dir.join(format!("{}.md", stem));
    fs::write(&markdown_path, markdown_report(review))?;
    info!(path = %markdown_path.display(), "saved markdown report");

    Ok(json_path)
}

/// Post review comments back to the PR as one batched GitHub review.
/// Returns the number of comments posted.
#[instrument(skip(ctx, comments, token), fields(pr = ctx.pr_number))]
pub async fn post_review_comments(
    ctx: &PrContext,
    comments: &[Comment],
    token: Option<String>,
) -> Result<usize, CiError> {
    if ctx.provider != "github" {
        return Err(CiError::UnsupportedProvider);
    }
    let token = token.ok_or(CiError::MissingToken)?;

    let selected = select_comments(comments);
    if selected.is_empty() {
        info!("no comments to post");
        return Ok(0);
    }

    let review_comments: Vec<serde_json::Value> = selected
        .iter()
        .map(|comment| {
            serde_json::json!({
                "path": comment.file,
                "line": comment.line,
                "side": "RIGHT",
                "body": format_comment_body(comment),
            })
        })
        .collect();
    let body = serde_json::json!({
        "commit_id": ctx.head_sha,
        "body": "Automated code review by pr-reviewer",
        "event": "COMMENT",
        "comments": review_comments,
    });

    let url = format!(
        "https://api.github.com/repos/{}/{}/pulls/{}/reviews",
        ctx.owner, ctx.repo, ctx.pr_number
    );
    reqwest::Client::new()
        .post(&url)
        .header("User-Agent", "pr-reviewer")
        .header("Accept", "application/vnd.github+json")
        .header("X-GitHub-Api-Version", "2022-11-28")
        .bearer_auth(&token)
        .json(&body)
        .send()
        .await?
        .error_for_status()?;

    info!(count = selected.len(), "posted review comments");
    Ok(selected.len())
}

/// Drop info comments on large reviews and respect the per-review cap.
fn select_comments(comments: &[Comment]) -> Vec<&Comment> {
    let large = comments.len() > LARGE_REVIEW_THRESHOLD;
    comments
        .iter()
        .filter(|c| !(large && c.severity == Severity::Info))
        .take(MAX_REVIEW_COMMENTS)
        .collect()
}

fn format_comment_body(comment: &Comment) -> String {
    let mut parts = vec![
        format!(
            "{} **{}**",
            severity_symbol(comment.severity),
            comment.severity.as_str().to_uppercase()
        ),
        String::new(),
        comment.message.clone(),
    ];

    if let Some(suggestion) = &comment.suggestion {
        parts.push(String::new());
        parts.push("**Suggestion:**".to_string());
        parts.push(suggestion.clone());
    }
    if let Some(rule) = &comment.rule {
        parts.push(String::new());
        parts.push(format!("**Rule:** `{}`", rule));
    }
    parts.push(String::new());
    parts.push(format!("*Found by: {}*", comment.tool));

    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Finding;
    use crate::provider::types::FileChange;
    use crate::review::generate_review;
    use crate::scoring::{calculate_score, Weights};

    fn sample_context() -> PrContext {
        PrContext {
            provider: "github".to_string(),
            owner: "org".to_string(),
            repo: "repo".to_string(),
            pr_number: 42,
            title: "Add OAuth2 login flow".to_string(),
            head_ref: "feature/oauth".to_string(),
            base_ref: "main".to_string(),
            head_sha: "abc123".to_string(),
            files: vec![FileChange {
                path: "src/auth.rs".to_string(),
                additions: 20,
                deletions: 3,
                status: "modified".to_string(),
                patch: String::new(),
            }],
        }
    }

    fn comment(severity: Severity) -> Comment {
        Comment {
            file: "src/auth.rs".to_string(),
            line: 3,
            side: "right".to_string(),
            message: "issue".to_string(),
            severity,
            tool: "style".to_string(),
            code: String::new(),
            suggestion: None,
            rule: None,
            confidence: None,
            reasoning: None,
        }
    }

    #[test]
    fn test_save_artifacts_round_trip() {
        let ctx = sample_context();
        let findings = vec![Finding {
            file: "src/auth.rs".to_string(),
            severity: Severity::Error,
            tool: "security".to_string(),
            message: "Hardcoded password detected".to_string(),
            code: Some("B105".to_string()),
            ..Finding::default()
        }];
        let review = generate_review(&findings, &ctx);
        let score = calculate_score(&findings, &ctx, &Weights::default());

        let dir = std::env::temp_dir().join("pr_reviewer_artifact_test");
        let json_path = save_artifacts(&review, &score, &ctx, &dir).unwrap();
        assert!(json_path.exists());
        assert!(dir.join("review_github_42.md").exists());

        let content = fs::read_to_string(&json_path).unwrap();
        let artifact: Artifact = serde_json::from_str(&content).unwrap();
        assert_eq!(artifact.version, "1.0");
        assert_eq!(artifact.pr_context.pr_number, 42);
        assert_eq!(artifact.review.comments.len(), 1);
        assert_eq!(artifact.score.grade, score.grade);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_select_comments_keeps_small_reviews_intact() {
        let comments: Vec<Comment> = (0..5).map(|_| comment(Severity::Info)).collect();
        assert_eq!(select_comments(&comments).len(), 5);
    }

    #[test]
    fn test_select_comments_drops_info_on_large_reviews() {
        let mut comments: Vec<Comment> = (0..8).map(|_| comment(Severity::Info)).collect();
        comments.extend((0..4).map(|_| comment(Severity::Error)));
        let selected = select_comments(&comments);
        assert_eq!(selected.len(), 4);
        assert!(selected.iter().all(|c| c.severity == Severity::Error));
    }

    #[test]
    fn test_select_comments_caps_at_20() {
        let comments: Vec<Comment> = (0..40).map(|_| comment(Severity::Error)).collect();
        assert_eq!(select_comments(&comments).len(), 20);
    }

    #[test]
    fn test_format_comment_body() {
        let mut c = comment(Severity::Error);
        c.message = "Hardcoded password detected".to_string();
        c.suggestion = Some("Load it from the environment".to_string());
        c.rule = Some("B105".to_string());
        c.tool = "security".to_string();
        let body = format_comment_body(&c);
        assert!(body.contains("**ERROR**"));
        assert!(body.contains("Hardcoded password detected"));
        assert!(body.contains("**Suggestion:**"));
        assert!(body.contains("**Rule:** `B105`"));
        assert!(body.contains("*Found by: security*"));
    }

    #[tokio::test]
    async fn test_post_requires_github_provider() {
        let mut ctx = sample_context();
        ctx.provider = "gitlab".to_string();
        let result = post_review_comments(&ctx, &[], Some("token".to_string())).await;
        assert!(matches!(result, Err(CiError::UnsupportedProvider)));
    }

    #[tokio::test]
    async fn test_post_requires_token() {
        let ctx = sample_context();
        let result = post_review_comments(&ctx, &[comment(Severity::Error)], None).await;
        assert!(matches!(result, Err(CiError::MissingToken)));
    }
}

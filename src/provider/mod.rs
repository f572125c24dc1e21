pub mod diff;
pub mod github;
pub mod gitlab;
pub mod types;

pub use types::{PrContext, PrLocator};

use async_trait::async_trait;
use thiserror::Error;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider API request failed: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Invalid PR URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported provider host: {0}")]
    UnsupportedHost(String),
}

/// A git hosting provider able to fetch PR metadata and per-file patches.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider key, e.g. "github".
    fn name(&self) -> &str;

    /// Fetch the PR named by the locator, including its changed files.
    async fn fetch_pr(&self, locator: &PrLocator) -> Result<PrContext, ProviderError>;
}

/// Parse a PR/MR URL into its component parts.
///
/// Supported shapes:
///   https://github.com/{owner}/{repo}/pull/{number}
///   https://gitlab.com/{group...}/{repo}/-/merge_requests/{number}
pub fn parse_pr_url(url: &str) -> Result<PrLocator, ProviderError> {
    let invalid = || ProviderError::InvalidUrl(url.to_string());
    let parsed = reqwest::Url::parse(url).map_err(|_| invalid())?;
    let segments: Vec<&str> = parsed
        .path_segments()
        .ok_or_else(invalid)?
        .filter(|segment| !segment.is_empty())
        .collect();

    match parsed.host_str() {
        Some("github.com") => {
            if segments.len() != 4 || segments[2] != "pull" {
                return Err(invalid());
            }
            let pr_number = segments[3].parse::<u64>().map_err(|_| invalid())?;
            Ok(PrLocator {
                provider: "github".to_string(),
                owner: segments[0].to_string(),
                repo: segments[1].to_string(),
                pr_number,
            })
        }
        Some("gitlab.com") => {
            // The "-" segment separates the (possibly nested) project path
            // from the resource path.
            let dash = segments.iter().position(|s| *s == "-").ok_or_else(invalid)?;
            if dash < 2
                || segments.len() != dash + 3
                || segments[dash + 1] != "merge_requests"
            {
                return Err(invalid());
            }
            let pr_number = segments[dash + 2].parse::<u64>().map_err(|_| invalid())?;
            Ok(PrLocator {
                provider: "gitlab".to_string(),
                owner: segments[..dash - 1].join("/"),
                repo: segments[dash - 1].to_string(),
                pr_number,
            })
        }
        Some(host) => Err(ProviderError::UnsupportedHost(host.to_string())),
        None => Err(invalid()),
    }
}

/// Construct the provider matching the locator, wired with the configured
/// token for that provider.
pub fn for_locator(
    locator: &PrLocator,
    config: &Config,
) -> Result<Box<dyn Provider>, ProviderError> {
    match locator.provider.as_str() {
        "github" => Ok(Box::new(github::GithubProvider::new(config.github_token()))),
        "gitlab" => Ok(Box::new(gitlab::GitlabProvider::new(config.gitlab_token()))),
        other => Err(ProviderError::UnsupportedHost(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_github_pr_url() {
        let locator = parse_pr_url("https://github.com/org/repo/pull/42").unwrap();
        assert_eq!(locator.provider, "github");
        assert_eq!(locator.owner, "org");
        assert_eq!(locator.repo, "repo");
        assert_eq!(locator.pr_number, 42);
    }

    #[test]
    fn test_parse_gitlab_mr_url() {
        let locator =
            parse_pr_url("https://gitlab.com/group/repo/-/merge_requests/17").unwrap();
        assert_eq!(locator.provider, "gitlab");
        assert_eq!(locator.owner, "group");
        assert_eq!(locator.repo, "repo");
        assert_eq!(locator.pr_number, 17);
    }

    #[test]
    fn test_parse_gitlab_nested_group_url() {
        let locator =
            parse_pr_url("https://gitlab.com/group/subgroup/repo/-/merge_requests/3").unwrap();
        assert_eq!(locator.owner, "group/subgroup");
        assert_eq!(locator.repo, "repo");
    }

    #[test]
    fn test_parse_invalid_urls() {
        assert!(parse_pr_url("not-a-url").is_err());
        assert!(parse_pr_url("https://github.com/org/repo/pulls/42").is_err());
        assert!(parse_pr_url("https://github.com/org/repo/pull/abc").is_err());
        assert!(parse_pr_url("https://gitlab.com/repo/-/merge_requests/1").is_err());
        assert!(matches!(
            parse_pr_url("https://example.com/org/repo/pull/1"),
            Err(ProviderError::UnsupportedHost(_))
        ));
    }
}

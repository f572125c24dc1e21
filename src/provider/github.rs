use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::types::{FileChange, PrContext, PrLocator};
use super::{Provider, ProviderError};

const GITHUB_API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = "pr-reviewer";

/// GitHub provider using the REST pulls API.
pub struct GithubProvider {
    token: Option<String>,
    client: reqwest::Client,
}

impl GithubProvider {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token,
            client: reqwest::Client::new(),
        }
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }
}

#[derive(Deserialize)]
struct GitRef {
    #[serde(rename = "ref")]
    branch: String,
    sha: String,
}

#[derive(Deserialize)]
struct PullResponse {
    title: String,
    head: GitRef,
    base: GitRef,
}

#[derive(Deserialize)]
struct PullFile {
    filename: String,
    additions: usize,
    deletions: usize,
    status: String,
    /// Absent for binary files.
    #[serde(default)]
    patch: String,
}

#[async_trait]
impl Provider for GithubProvider {
    fn name(&self) -> &str {
        "github"
    }

    #[instrument(skip(self), fields(owner = %locator.owner, repo = %locator.repo, pr = locator.pr_number))]
    async fn fetch_pr(&self, locator: &PrLocator) -> Result<PrContext, ProviderError> {
        let base_url = format!(
            "{}/repos/{}/{}/pulls/{}",
            GITHUB_API_URL, locator.owner, locator.repo, locator.pr_number
        );

        debug!("fetching PR metadata");
        let metadata = self
            .get(&base_url)
            .send()
            .await?
            .error_for_status()?
            .json::<PullResponse>()
            .await?;
        debug!(title = %metadata.title, "received PR metadata");

        debug!("fetching changed files");
        let files = self
            .get(&format!("{}/files?per_page=100", base_url))
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<PullFile>>()
            .await?;
        debug!(files = files.len(), "received changed files");

        Ok(PrContext {
            provider: "github".to_string(),
            owner: locator.owner.clone(),
            repo: locator.repo.clone(),
            pr_number: locator.pr_number,
            title: metadata.title,
            head_ref: metadata.head.branch,
            base_ref: metadata.base.branch,
            head_sha: metadata.head.sha,
            files: files
                .into_iter()
                .map(|f| FileChange {
                    path: f.filename,
                    additions: f.additions,
                    deletions: f.deletions,
                    status: f.status,
                    patch: f.patch,
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pull_file_deserializes_without_patch() {
        let file: PullFile = serde_json::from_str(
            r#"{"filename": "logo.png", "additions": 0, "deletions": 0, "status": "added"}"#,
        )
        .unwrap();
        assert_eq!(file.filename, "logo.png");
        assert_eq!(file.patch, "");
    }

    #[test]
    fn test_provider_name() {
        assert_eq!(GithubProvider::new(None).name(), "github");
    }
}

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::diff;
use super::types::{FileChange, PrContext, PrLocator};
use super::{Provider, ProviderError};

const GITLAB_API_URL: &str = "https://gitlab.com/api/v4";

/// GitLab provider using the merge-requests changes API.
///
/// The changes endpoint carries the MR attributes and the per-file diffs in
/// one response; line counts are not included, so they are derived from the
/// diff text.
pub struct GitlabProvider {
    token: Option<String>,
    client: reqwest::Client,
}

impl GitlabProvider {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct ChangesResponse {
    title: String,
    source_branch: String,
    target_branch: String,
    #[serde(default)]
    sha: String,
    #[serde(default)]
    changes: Vec<Change>,
}

#[derive(Deserialize)]
struct Change {
    new_path: Option<String>,
    old_path: Option<String>,
    #[serde(default)]
    diff: String,
    #[serde(default)]
    new_file: bool,
    #[serde(default)]
    deleted_file: bool,
}

impl Change {
    fn status(&self) -> &'static str {
        if self.new_file {
            "added"
        } else if self.deleted_file {
            "deleted"
        } else {
            "modified"
        }
    }
}

/// URL-encode a (possibly nested) project path for the GitLab API.
fn encode_project_path(owner: &str, repo: &str) -> String {
    format!("{}/{}", owner, repo).replace('/', "%2F")
}

#[async_trait]
impl Provider for GitlabProvider {
    fn name(&self) -> &str {
        "gitlab"
    }

    #[instrument(skip(self), fields(owner = %locator.owner, repo = %locator.repo, mr = locator.pr_number))]
    async fn fetch_pr(&self, locator: &PrLocator) -> Result<PrContext, ProviderError> {
        let url = format!(
            "{}/projects/{}/merge_requests/{}/changes",
            GITLAB_API_URL,
            encode_project_path(&locator.owner, &locator.repo),
            locator.pr_number
        );

        debug!("fetching MR changes");
        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await?
            .error_for_status()?
            .json::<ChangesResponse>()
            .await?;
        debug!(title = %response.title, files = response.changes.len(), "received MR changes");

        let files = response
            .changes
            .iter()
            .map(|change| {
                let (additions, deletions) = diff::count_changes(&change.diff);
                FileChange {
                    path: change
                        .new_path
                        .clone()
                        .or_else(|| change.old_path.clone())
                        .unwrap_or_else(|| "unknown".to_string()),
                    additions,
                    deletions,
                    status: change.status().to_string(),
                    patch: change.diff.clone(),
                }
            })
            .collect();

        Ok(PrContext {
            provider: "gitlab".to_string(),
            owner: locator.owner.clone(),
            repo: locator.repo.clone(),
            pr_number: locator.pr_number,
            title: response.title,
            head_ref: response.source_branch,
            base_ref: response.target_branch,
            head_sha: response.sha,
            files,
        })
    }
}

use serde::{Deserialize, Serialize};

/// The parsed components of a PR/MR URL.
#[derive(Debug, Clone)]
pub struct PrLocator {
    /// Provider key: "github" or "gitlab".
    pub provider: String,
    /// Repository owner. For GitLab this is the full (possibly nested)
    /// group path, e.g. "group/subgroup".
    pub owner: String,
    pub repo: String,
    pub pr_number: u64,
}

/// One changed file within the PR.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileChange {
    /// Repo-relative path.
    pub path: String,
    /// Lines added in this file.
    pub additions: usize,
    /// Lines deleted in this file.
    pub deletions: usize,
    /// Provider-reported status: "added", "modified", "deleted", ...
    #[serde(default)]
    pub status: String,
    /// Raw unified-diff patch for this file (hunk headers + lines).
    /// Empty when the provider omits it (e.g. binary files).
    #[serde(default)]
    pub patch: String,
}

/// Metadata for a pull request under review, fetched from the provider API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrContext {
    pub provider: String,
    pub owner: String,
    pub repo: String,
    pub pr_number: u64,
    pub title: String,
    /// PR head branch name.
    pub head_ref: String,
    /// PR base branch name.
    pub base_ref: String,
    /// Commit SHA of the PR head, needed when posting review comments.
    pub head_sha: String,
    pub files: Vec<FileChange>,
}

impl PrContext {
    /// Total lines added across all changed files.
    pub fn total_additions(&self) -> usize {
        self.files.iter().map(|f| f.additions).sum()
    }

    /// Total lines deleted across all changed files.
    pub fn total_deletions(&self) -> usize {
        self.files.iter().map(|f| f.deletions).sum()
    }
}

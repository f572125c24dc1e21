pub mod complexity;
pub mod finding;
pub mod llm;
pub mod security;
pub mod style;

pub use finding::{Finding, Severity};

use async_trait::async_trait;
use tracing::{debug, info_span, Instrument};

use crate::provider::diff;
use crate::provider::types::PrContext;

/// Core trait all analyzers implement.
///
/// Analyzers must be Send + Sync to run concurrently via tokio::join!, and
/// they never fail: internal errors are logged and produce no findings.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Short identifier of this analyzer, also used as the finding tool tag.
    fn name(&self) -> &str;

    /// Analyze the pull request and return findings. Must not print to
    /// stdout; results are aggregated by the caller.
    async fn analyze(&self, pr: &PrContext) -> Vec<Finding>;
}

/// Run the static analyzers and the optional LLM reviewer concurrently,
/// concatenating findings in analyzer order (style, security, complexity,
/// llm).
pub async fn run_all(pr: &PrContext, llm: Option<&llm::LlmReviewer>) -> Vec<Finding> {
    let style = style::StyleAnalyzer::new();
    let security = security::SecurityAnalyzer::new();
    let complexity = complexity::ComplexityAnalyzer::new();

    let (style_findings, security_findings, complexity_findings, llm_findings) = tokio::join!(
        style
            .analyze(pr)
            .instrument(info_span!("analyze", analyzer = "style")),
        security
            .analyze(pr)
            .instrument(info_span!("analyze", analyzer = "security")),
        complexity
            .analyze(pr)
            .instrument(info_span!("analyze", analyzer = "complexity")),
        async {
            match llm {
                Some(reviewer) => reviewer.analyze(pr).await,
                None => Vec::new(),
            }
        }
        .instrument(info_span!("analyze", analyzer = "llm")),
    );

    debug!(analyzer = style.name(), count = style_findings.len(), "analyzer finished");
    debug!(analyzer = security.name(), count = security_findings.len(), "analyzer finished");
    debug!(analyzer = complexity.name(), count = complexity_findings.len(), "analyzer finished");
    if let Some(reviewer) = llm {
        debug!(analyzer = reviewer.name(), count = llm_findings.len(), "analyzer finished");
    }

    let mut findings = style_findings;
    findings.extend(security_findings);
    findings.extend(complexity_findings);
    findings.extend(llm_findings);
    findings
}

/// The added lines of a per-file patch, paired with their line numbers in
/// the new version of the file.
pub(crate) fn added_lines(patch: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    for hunk in diff::parse_patch(patch) {
        let mut line_no = hunk.new_start;
        for line in &hunk.lines {
            if let Some(content) = line.strip_prefix('+') {
                lines.push((line_no, content.to_string()));
                line_no += 1;
            } else if line.starts_with(' ') || line.is_empty() {
                line_no += 1;
            }
        }
    }
    lines
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::provider::types::FileChange;

    /// Minimal PrContext for analyzer tests.
    pub fn test_context(files: Vec<FileChange>) -> PrContext {
        PrContext {
            provider: "github".to_string(),
            owner: "org".to_string(),
            repo: "repo".to_string(),
            pr_number: 1,
            title: "Test PR".to_string(),
            head_ref: "feature".to_string(),
            base_ref: "main".to_string(),
            head_sha: "abc123".to_string(),
            files,
        }
    }

    /// FileChange whose patch adds the given lines starting at line 1.
    pub fn added_file(path: &str, added: &[&str]) -> FileChange {
        let mut patch = format!("@@ -0,0 +1,{} @@\n", added.len());
        for line in added {
            patch.push('+');
            patch.push_str(line);
            patch.push('\n');
        }
        FileChange {
            path: path.to_string(),
            additions: added.len(),
            deletions: 0,
            status: "modified".to_string(),
            patch,
        }
    }

    #[test]
    fn test_added_lines_numbering() {
        let patch = "@@ -1,4 +10,5 @@\n context\n-removed\n+first added\n another\n+second added\n";
        let lines = added_lines(patch);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], (11, "first added".to_string()));
        assert_eq!(lines[1], (13, "second added".to_string()));
    }

    #[tokio::test]
    async fn test_run_all_without_llm_on_empty_pr() {
        let pr = test_context(vec![]);
        let findings = run_all(&pr, None).await;
        assert!(findings.is_empty());
    }

    #[tokio::test]
    async fn test_run_all_with_dirty_pr() {
        let pr = test_context(vec![added_file(
            "src/auth.py",
            &[
                "password = \"hunter2\"",
                "subprocess.run(cmd, shell=True)",
                "x = 1   ",
            ],
        )]);
        let findings = run_all(&pr, None).await;
        assert!(!findings.is_empty());
        // Aggregation keeps analyzer ordering: style findings precede security.
        let first_security = findings.iter().position(|f| f.tool == "security").unwrap();
        let last_style = findings.iter().rposition(|f| f.tool == "style").unwrap();
        assert!(last_style < first_security);
    }
}

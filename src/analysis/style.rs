use async_trait::async_trait;

use super::{added_lines, Analyzer, Finding, Severity};
use crate::provider::types::PrContext;
use crate::scoring::is_test_file;

const MAX_LINE_LENGTH: usize = 100;

/// Style analyzer.
///
/// Flags lint-level issues in added lines: overlong lines, trailing
/// whitespace, tab indentation, FIXME markers, and `.unwrap()` in non-test
/// Rust code. Rule codes follow the familiar E/W lint numbering.
pub struct StyleAnalyzer;

impl StyleAnalyzer {
    pub fn new() -> Self {
        Self
    }

    fn check_line_lengths(&self, pr: &PrContext) -> Vec<Finding> {
        let mut findings = Vec::new();
        for file in &pr.files {
            for (line, content) in added_lines(&file.patch) {
                if content.chars().count() > MAX_LINE_LENGTH {
                    findings.push(Finding {
                        file: file.path.clone(),
                        line,
                        severity: Severity::Warning,
                        tool: "style".to_string(),
                        message: format!(
                            "Line too long ({} > {} characters)",
                            content.chars().count(),
                            MAX_LINE_LENGTH
                        ),
                        code: Some("E501".to_string()),
                        ..Finding::default()
                    });
                }
            }
        }
        findings
    }

    fn check_whitespace(&self, pr: &PrContext) -> Vec<Finding> {
        let mut findings = Vec::new();
        for file in &pr.files {
            for (line, content) in added_lines(&file.patch) {
                if !content.trim().is_empty() && content.ends_with([' ', '\t']) {
                    findings.push(Finding {
                        file: file.path.clone(),
                        line,
                        severity: Severity::Warning,
                        tool: "style".to_string(),
                        message: "Trailing whitespace".to_string(),
                        code: Some("W291".to_string()),
                        ..Finding::default()
                    });
                }
                if content.starts_with('\t') {
                    findings.push(Finding {
                        file: file.path.clone(),
                        line,
                        severity: Severity::Warning,
                        tool: "style".to_string(),
                        message: "Indentation contains tabs".to_string(),
                        code: Some("W191".to_string()),
                        ..Finding::default()
                    });
                }
            }
        }
        findings
    }

    fn check_fixme_markers(&self, pr: &PrContext) -> Vec<Finding> {
        let mut findings = Vec::new();
        for file in &pr.files {
            for (line, content) in added_lines(&file.patch) {
                let trimmed = content.trim_start().to_uppercase();
                if trimmed.starts_with("// FIXME") || trimmed.starts_with("# FIXME") {
                    findings.push(Finding {
                        file: file.path.clone(),
                        line,
                        severity: Severity::Info,
                        tool: "style".to_string(),
                        message: "FIXME comment indicates a known unresolved issue".to_string(),
                        ..Finding::default()
                    });
                }
            }
        }
        findings
    }

    /// `.unwrap()` in non-test Rust code. Lines after a `#[cfg(test)]`
    /// marker in the same patch are skipped, as are test files entirely.
    fn check_unwrap_usage(&self, pr: &PrContext) -> Vec<Finding> {
        let mut findings = Vec::new();
        for file in &pr.files {
            if !file.path.ends_with(".rs") || is_test_file(&file.path) {
                continue;
            }
            let mut in_test_section = false;
            for (line, content) in added_lines(&file.patch) {
                if content.contains("#[cfg(test)]") {
                    in_test_section = true;
                }
                if in_test_section {
                    continue;
                }
                if content.contains(".unwrap()") {
                    findings.push(Finding {
                        file: file.path.clone(),
                        line,
                        severity: Severity::Warning,
                        tool: "style".to_string(),
                        message: "Use of .unwrap(); prefer the ? operator or .expect() with context"
                            .to_string(),
                        ..Finding::default()
                    });
                }
            }
        }
        findings
    }
}

#[async_trait]
impl Analyzer for StyleAnalyzer {
    fn name(&self) -> &str {
        "style"
    }

    async fn analyze(&self, pr: &PrContext) -> Vec<Finding> {
        let mut findings = Vec::new();
        findings.extend(self.check_line_lengths(pr));
        findings.extend(self.check_whitespace(pr));
        findings.extend(self.check_fixme_markers(pr));
        findings.extend(self.check_unwrap_usage(pr));
        findings
    }
}

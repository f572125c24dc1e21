use async_trait::async_trait;

use super::{added_lines, Analyzer, Finding, Severity};
use crate::provider::types::PrContext;

/// Cyclomatic complexity above which a function gets flagged.
const COMPLEXITY_THRESHOLD: usize = 10;
/// Complexity above which the finding is a warning instead of info.
const WARNING_THRESHOLD: usize = 15;
/// Indent levels (at 4 spaces each) beyond which code counts as deeply nested.
const MAX_INDENT_LEVELS: usize = 4;

/// Complexity analyzer.
///
/// Estimates cyclomatic complexity of functions introduced or modified in the
/// patch by counting branch points in added lines, and flags deeply nested
/// additions. Flagged functions carry a `COMPLEXITY_<N>` code that the scorer
/// tiers on.
pub struct ComplexityAnalyzer;

impl ComplexityAnalyzer {
    pub fn new() -> Self {
        Self
    }

    fn check_function_complexity(&self, pr: &PrContext) -> Vec<Finding> {
        let mut findings = Vec::new();
        for file in &pr.files {
            let mut current: Option<FunctionStats> = None;
            for (line, content) in added_lines(&file.patch) {
                if let Some(name) = function_header(&content) {
                    if let Some(stats) = current.take() {
                        findings.extend(stats.into_finding(&file.path));
                    }
                    current = Some(FunctionStats {
                        name,
                        line,
                        complexity: 1,
                    });
                } else if let Some(stats) = current.as_mut() {
                    stats.complexity += branch_points(&content);
                }
            }
            if let Some(stats) = current.take() {
                findings.extend(stats.into_finding(&file.path));
            }
        }
        findings
    }

    fn check_nesting_depth(&self, pr: &PrContext) -> Vec<Finding> {
        let mut findings = Vec::new();
        for file in &pr.files {
            for (line, content) in added_lines(&file.patch) {
                if content.trim().is_empty() {
                    continue;
                }
                let leading_spaces = content.len() - content.trim_start_matches(' ').len();
                let indent_level = leading_spaces / 4;
                if indent_level > MAX_INDENT_LEVELS {
                    findings.push(Finding {
                        file: file.path.clone(),
                        line,
                        severity: Severity::Info,
                        tool: "complexity".to_string(),
                        message: format!(
                            "Deeply nested code (indent level {}); consider refactoring",
                            indent_level
                        ),
                        ..Finding::default()
                    });
                }
            }
        }
        findings
    }
}

struct FunctionStats {
    name: String,
    line: usize,
    complexity: usize,
}

impl FunctionStats {
    fn into_finding(self, path: &str) -> Option<Finding> {
        if self.complexity <= COMPLEXITY_THRESHOLD {
            return None;
        }
        let severity = if self.complexity > WARNING_THRESHOLD {
            Severity::Warning
        } else {
            Severity::Info
        };
        Some(Finding {
            file: path.to_string(),
            line: self.line,
            severity,
            tool: "complexity".to_string(),
            message: format!(
                "High cyclomatic complexity ({}) in {}",
                self.complexity, self.name
            ),
            code: Some(format!("COMPLEXITY_{}", self.complexity)),
            ..Finding::default()
        })
    }
}

/// Name of a function defined on this line, if any. Covers Rust, Python,
/// and JavaScript-style headers.
fn function_header(content: &str) -> Option<String> {
    let trimmed = content.trim_start();
    const PREFIXES: &[&str] = &[
        "pub async fn ",
        "pub fn ",
        "async fn ",
        "fn ",
        "async def ",
        "def ",
        "function ",
    ];
    for prefix in PREFIXES {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            let name: String = rest
                .chars()
                .take_while(|c| c.is_alphanumeric() || *c == '_')
                .collect();
            if !name.is_empty() {
                return Some(name);
            }
        }
    }
    None
}

/// Branch points contributed by one line: branching keywords (word-bounded)
/// plus boolean operators.
fn branch_points(content: &str) -> usize {
    const KEYWORDS: &[&str] = &[
        "if", "elif", "for", "while", "match", "case", "except", "catch",
    ];
    let keyword_count = content
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|word| KEYWORDS.contains(word))
        .count();
    keyword_count + content.matches("&&").count() + content.matches("||").count()
}

#[async_trait]
impl Analyzer for ComplexityAnalyzer {
    fn name(&self) -> &str {
        "complexity"
    }

    async fn analyze(&self, pr: &PrContext) -> Vec<Finding> {
        let mut findings = Vec::new();
        findings.extend(self.check_function_complexity(pr));
        findings.extend(self.check_nesting_depth(pr));
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tests::{added_file, test_context};

    fn branchy_function(name: &str, branches: usize) -> Vec<String> {
        let mut lines = vec![format!("def {}(value):", name)];
        for i in 0..branches {
            lines.push(format!("    if value > {}:", i));
            lines.push(format!("        handle_{}(value)", i));
        }
        lines
    }

    #[tokio::test]
    async fn test_simple_function_not_flagged() {
        let pr = test_context(vec![added_file(
            "src/a.py",
            &["def add(a, b):", "    return a + b"],
        )]);
        assert!(ComplexityAnalyzer::new().analyze(&pr).await.is_empty());
    }

    #[tokio::test]
    async fn test_flags_complex_function_with_code() {
        let lines = branchy_function("process", 12);
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let pr = test_context(vec![added_file("src/proc.py", &refs)]);
        let findings = ComplexityAnalyzer::new().analyze(&pr).await;
        let finding = findings
            .iter()
            .find(|f| f.code.is_some())
            .expect("complexity finding");
        // Base 1 plus 12 branches.
        assert_eq!(finding.code.as_deref(), Some("COMPLEXITY_13"));
        assert_eq!(finding.severity, Severity::Info);
        assert!(finding.message.contains("process"));
        assert_eq!(finding.line, 1);
    }

    #[tokio::test]
    async fn test_very_complex_function_is_warning() {
        let lines = branchy_function("gnarly", 16);
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let pr = test_context(vec![added_file("src/gnarly.py", &refs)]);
        let findings = ComplexityAnalyzer::new().analyze(&pr).await;
        let finding = findings.iter().find(|f| f.code.is_some()).unwrap();
        assert_eq!(finding.code.as_deref(), Some("COMPLEXITY_17"));
        assert_eq!(finding.severity, Severity::Warning);
    }

    #[tokio::test]
    async fn test_complexity_resets_per_function() {
        let mut lines = branchy_function("first", 6);
        lines.extend(branchy_function("second", 6));
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let pr = test_context(vec![added_file("src/two.py", &refs)]);
        // Each function sits at complexity 7, below the threshold.
        let findings = ComplexityAnalyzer::new().analyze(&pr).await;
        assert!(findings.iter().all(|f| f.code.is_none()));
    }

    #[tokio::test]
    async fn test_detects_deep_nesting() {
        let deep = format!("{}call();", " ".repeat(24));
        let pr = test_context(vec![added_file("src/logic.rs", &[deep.as_str()])]);
        let findings = ComplexityAnalyzer::new().analyze(&pr).await;
        assert!(findings.iter().any(|f| f.message.contains("Deeply nested")));
    }

    #[test]
    fn test_branch_points() {
        assert_eq!(branch_points("if a && b || c:"), 3);
        assert_eq!(branch_points("    return a + b"), 0);
        assert_eq!(branch_points("} else if x {"), 1);
        assert_eq!(branch_points("for item in items:"), 1);
    }

    #[test]
    fn test_function_header() {
        assert_eq!(function_header("pub fn fetch_pr(url: &str) {"), Some("fetch_pr".to_string()));
        assert_eq!(function_header("    def handle(self):"), Some("handle".to_string()));
        assert_eq!(function_header("function doWork() {"), Some("doWork".to_string()));
        assert_eq!(function_header("let x = 1;"), None);
    }
}

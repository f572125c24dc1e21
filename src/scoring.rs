use serde::{Deserialize, Serialize};

use crate::analysis::{Finding, Severity};
use crate::provider::types::{FileChange, PrContext};

/// Scoring weights. Every key in the `[weights]` config table is optional;
/// absent keys fall back to the defaults below.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Weights {
    /// Starting score before penalties.
    pub base_score: f64,
    /// Per-issue penalty for style findings.
    pub style_issues: f64,
    /// Per-issue penalty for security findings, scaled by severity.
    pub security_findings: f64,
    /// Read from config for forward compatibility; complexity penalties use
    /// fixed tiers rather than this weight.
    #[allow(dead_code)]
    pub complexity: f64,
    /// Penalty per code file changed without any accompanying test file.
    pub test_coverage: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Weights {
            base_score: 100.0,
            style_issues: 5.0,
            security_findings: 15.0,
            complexity: 10.0,
            test_coverage: 8.0,
        }
    }
}

const STYLE_PENALTY_CAP: f64 = 15.0;
const SECURITY_PENALTY_CAP: f64 = 30.0;
const COMPLEXITY_PENALTY_CAP: f64 = 20.0;
const COVERAGE_PENALTY_CAP: f64 = 15.0;

/// Named penalty components that make up the final score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Breakdown {
    pub base_score: f64,
    pub style_penalty: f64,
    pub security_penalty: f64,
    pub complexity_penalty: f64,
    pub test_coverage_penalty: f64,
    pub size_penalty: f64,
    pub total_penalty: f64,
    pub final_score: f64,
}

/// Aggregate counts over the findings and file changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metrics {
    pub total_findings: usize,
    pub files_changed: usize,
    pub lines_added: usize,
    pub lines_removed: usize,
    pub net_lines: i64,
    pub error_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
}

/// Result of scoring one PR.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Final score rounded to one decimal, floored at 0.
    pub score: f64,
    pub grade: String,
    pub breakdown: Breakdown,
    /// Advisory messages, ordered: security recommendations come first.
    pub recommendations: Vec<String>,
    pub metrics: Metrics,
}

/// Calculate the PR quality score from findings and file-change metadata.
///
/// Pure and total: malformed findings contribute their field defaults, and
/// each penalty component is capped independently before summing.
pub fn calculate_score(
    findings: &[Finding],
    pr_context: &PrContext,
    weights: &Weights,
) -> ScoreResult {
    let style_penalty = style_penalty(findings, weights);
    let security_penalty = security_penalty(findings, weights);
    let complexity_penalty = complexity_penalty(findings);
    let test_coverage_penalty = test_coverage_penalty(&pr_context.files, weights);
    let size_penalty = size_penalty(&pr_context.files);

    let total_penalty = style_penalty
        + security_penalty
        + complexity_penalty
        + test_coverage_penalty
        + size_penalty;
    let final_score = (weights.base_score - total_penalty).max(0.0);

    let breakdown = Breakdown {
        base_score: weights.base_score,
        style_penalty,
        security_penalty,
        complexity_penalty,
        test_coverage_penalty,
        size_penalty,
        total_penalty,
        final_score,
    };

    ScoreResult {
        score: (final_score * 10.0).round() / 10.0,
        grade: score_to_grade(final_score).to_string(),
        recommendations: build_recommendations(&breakdown),
        metrics: build_metrics(findings, pr_context),
        breakdown,
    }
}

fn is_style_finding(finding: &Finding) -> bool {
    finding.tool == "style"
        || finding
            .code
            .as_deref()
            .is_some_and(|c| c.starts_with('E') || c.starts_with('W'))
}

fn is_security_finding(finding: &Finding) -> bool {
    finding.tool == "security" || finding.severity == Severity::Error
}

fn is_complexity_finding(finding: &Finding) -> bool {
    finding.tool == "complexity"
        || finding.code.as_deref().is_some_and(|c| c.contains("COMPLEXITY"))
}

fn style_penalty(findings: &[Finding], weights: &Weights) -> f64 {
    let count = findings.iter().filter(|f| is_style_finding(f)).count();
    (count as f64 * weights.style_issues).min(STYLE_PENALTY_CAP)
}

fn security_penalty(findings: &[Finding], weights: &Weights) -> f64 {
    let penalty: f64 = findings
        .iter()
        .filter(|f| is_security_finding(f))
        .map(|f| match f.severity {
            Severity::Error => weights.security_findings,
            Severity::Warning => weights.security_findings * 0.5,
            Severity::Info => weights.security_findings * 0.2,
        })
        .sum();
    penalty.min(SECURITY_PENALTY_CAP)
}

fn complexity_penalty(findings: &[Finding]) -> f64 {
    let penalty: f64 = findings
        .iter()
        .filter(|f| is_complexity_finding(f))
        .map(|f| complexity_tier(f.code.as_deref()))
        .sum();
    penalty.min(COMPLEXITY_PENALTY_CAP)
}

/// Tiered penalty for one complexity finding. Codes shaped like
/// `COMPLEXITY_<N>` are tiered on N; anything unparseable costs a flat 3.0.
fn complexity_tier(code: Option<&str>) -> f64 {
    let Some(code) = code else { return 3.0 };
    let Some(pos) = code.find("COMPLEXITY_") else {
        return 3.0;
    };
    match code[pos + "COMPLEXITY_".len()..].parse::<i64>() {
        Ok(n) if n > 20 => 8.0,
        Ok(n) if n > 15 => 5.0,
        Ok(_) => 2.0,
        Err(_) => 3.0,
    }
}

const CODE_EXTENSIONS: &[&str] = &[
    ".py", ".js", ".ts", ".java", ".go", ".rs", ".cpp", ".c", ".cs", ".php", ".rb",
];

const TEST_PATH_PATTERNS: &[&str] = &[
    "test_", "_test.", "/tests/", "/test/", "spec_", "_spec.", "/specs/", "/spec/",
];

/// Test-file heuristic over the path, case-insensitive substring match.
pub fn is_test_file(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    TEST_PATH_PATTERNS.iter().any(|p| lower.contains(p))
}

pub fn is_code_file(path: &str) -> bool {
    CODE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

fn test_coverage_penalty(files: &[FileChange], weights: &Weights) -> f64 {
    if files.is_empty() {
        return 0.0;
    }
    let code_files = files
        .iter()
        .filter(|f| is_code_file(&f.path) && !is_test_file(&f.path))
        .count();
    if code_files == 0 || files.iter().any(|f| is_test_file(&f.path)) {
        return 0.0;
    }
    (code_files as f64 * weights.test_coverage).min(COVERAGE_PENALTY_CAP)
}

fn size_penalty(files: &[FileChange]) -> f64 {
    let total_changes: usize = files.iter().map(|f| f.additions + f.deletions).sum();
    if total_changes > 1000 {
        10.0
    } else if total_changes > 500 {
        5.0
    } else if total_changes > 200 {
        2.0
    } else {
        0.0
    }
}

/// Fixed grade ladder: total and non-overlapping over [0, 100].
pub fn score_to_grade(score: f64) -> &'static str {
    if score >= 95.0 {
        "A+"
    } else if score >= 90.0 {
        "A"
    } else if score >= 85.0 {
        "A-"
    } else if score >= 80.0 {
        "B+"
    } else if score >= 75.0 {
        "B"
    } else if score >= 70.0 {
        "B-"
    } else if score >= 65.0 {
        "C+"
    } else if score >= 60.0 {
        "C"
    } else if score >= 55.0 {
        "C-"
    } else if score >= 50.0 {
        "D"
    } else {
        "F"
    }
}

fn build_recommendations(breakdown: &Breakdown) -> Vec<String> {
    let mut recommendations = Vec::new();

    if breakdown.security_penalty > 10.0 {
        recommendations.push("Address security issues before merging".to_string());
    } else if breakdown.security_penalty > 0.0 {
        recommendations.push("Review security findings".to_string());
    }

    if breakdown.complexity_penalty > 10.0 {
        recommendations.push("Simplify complex functions to improve maintainability".to_string());
    } else if breakdown.complexity_penalty > 0.0 {
        recommendations.push("Consider refactoring complex code sections".to_string());
    }

    if breakdown.style_penalty > 10.0 {
        recommendations.push("Fix style issues for better code consistency".to_string());
    } else if breakdown.style_penalty > 5.0 {
        recommendations.push("Address major style violations".to_string());
    }

    if breakdown.test_coverage_penalty > 0.0 {
        recommendations.push("Add tests for new code changes".to_string());
    }

    if breakdown.size_penalty > 5.0 {
        recommendations.push("Consider breaking large PR into smaller chunks".to_string());
    }

    let overall = if breakdown.final_score >= 90.0 {
        "Excellent code quality!"
    } else if breakdown.final_score >= 80.0 {
        "Good code quality with minor improvements needed"
    } else if breakdown.final_score >= 70.0 {
        "Moderate issues that should be addressed"
    } else {
        "Significant issues that need attention before merging"
    };
    recommendations.push(overall.to_string());

    recommendations
}

fn build_metrics(findings: &[Finding], pr_context: &PrContext) -> Metrics {
    let lines_added = pr_context.total_additions();
    let lines_removed = pr_context.total_deletions();
    let count_severity = |severity: Severity| -> usize {
        findings.iter().filter(|f| f.severity == severity).count()
    };

    Metrics {
        total_findings: findings.len(),
        files_changed: pr_context.files.len(),
        lines_added,
        lines_removed,
        net_lines: lines_added as i64 - lines_removed as i64,
        error_count: count_severity(Severity::Error),
        warning_count: count_severity(Severity::Warning),
        info_count: count_severity(Severity::Info),
    }
}

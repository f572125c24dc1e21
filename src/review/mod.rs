pub mod render;

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::analysis::{Finding, Severity};
use crate::provider::types::PrContext;

/// One inline review comment, converted 1:1 from a finding.
///
/// Optional fields are omitted from serialized output entirely rather than
/// null-filled, to keep posted payloads minimal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub file: String,
    pub line: usize,
    /// Diff side the comment anchors to; always the new code.
    pub side: String,
    pub message: String,
    pub severity: Severity,
    pub tool: String,
    /// Rule id; empty when the finding carried none.
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Mirrors `code` for consumers expecting a `rule` key; omitted when empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeverityBreakdown {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileIssues {
    pub file: String,
    pub issues: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrInfo {
    pub provider: String,
    pub pr_number: u64,
    pub files_changed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewMetadata {
    pub total_findings: usize,
    pub severity_breakdown: SeverityBreakdown,
    pub tool_breakdown: BTreeMap<String, usize>,
    pub file_breakdown: BTreeMap<String, usize>,
    /// Up to five files, sorted by issue count descending; ties keep
    /// first-encountered order.
    pub most_problematic_files: Vec<FileIssues>,
    /// Mean confidence across LLM findings; null when none carried one.
    pub avg_llm_confidence: Option<f64>,
    /// Generation time, ISO-8601 UTC.
    pub timestamp: String,
    pub pr_info: PrInfo,
}

/// A structured review: inline comments, a human-readable summary, and
/// aggregate metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewResult {
    pub comments: Vec<Comment>,
    pub summary: String,
    pub metadata: ReviewMetadata,
}

/// Generate a structured review from findings. Pure aside from the metadata
/// timestamp; comments preserve finding order.
pub fn generate_review(findings: &[Finding], pr_context: &PrContext) -> ReviewResult {
    ReviewResult {
        comments: findings.iter().map(to_comment).collect(),
        summary: build_summary(findings),
        metadata: build_metadata(findings, pr_context),
    }
}

fn to_comment(finding: &Finding) -> Comment {
    let code = finding.code.clone().unwrap_or_default();
    Comment {
        file: finding.file.clone(),
        line: finding.line,
        side: "right".to_string(),
        message: finding.message.clone(),
        severity: finding.severity,
        tool: finding.tool.clone(),
        rule: (!code.is_empty()).then(|| code.clone()),
        code,
        suggestion: finding.suggestion.clone().filter(|s| !s.is_empty()),
        confidence: finding.confidence,
        reasoning: finding.reasoning.clone(),
    }
}

fn build_summary(findings: &[Finding]) -> String {
    if findings.is_empty() {
        return "No issues found. This PR looks good!".to_string();
    }

    let severity = severity_breakdown(findings);
    let total = findings.len();
    let mut parts: Vec<String> = Vec::new();

    if severity.error > 0 {
        parts.push(format!("Found {} issues ({} errors)", total, severity.error));
    } else if severity.warning > 0 {
        parts.push(format!("Found {} issues ({} warnings)", total, severity.warning));
    } else {
        parts.push(format!("Found {} suggestions", total));
    }

    let mut breakdown: Vec<String> = Vec::new();
    if severity.error > 0 {
        breakdown.push(format!("{} errors", severity.error));
    }
    if severity.warning > 0 {
        breakdown.push(format!("{} warnings", severity.warning));
    }
    if severity.info > 0 {
        breakdown.push(format!("{} suggestions", severity.info));
    }
    parts.push(format!("Breakdown: {}", breakdown.join(", ")));

    let tools = count_first_seen(findings.iter().map(|f| f.tool.as_str()));
    if tools.len() > 1 {
        let sources: Vec<String> = tools
            .iter()
            .map(|(tool, count)| format!("{}: {}", tool, count))
            .collect();
        parts.push(format!("Sources: {}", sources.join(", ")));
    }

    if severity.error > 0 {
        parts.push("Please address all errors before merging.".to_string());
    } else if severity.warning > 5 {
        parts.push("Consider addressing the warnings for better code quality.".to_string());
    }

    parts.join("\n\n")
}

fn build_metadata(findings: &[Finding], pr_context: &PrContext) -> ReviewMetadata {
    let file_counts = count_first_seen(findings.iter().map(|f| f.file.as_str()));

    let confidences: Vec<f64> = findings.iter().filter_map(|f| f.confidence).collect();
    let avg_llm_confidence = if confidences.is_empty() {
        None
    } else {
        Some(confidences.iter().sum::<f64>() / confidences.len() as f64)
    };

    ReviewMetadata {
        total_findings: findings.len(),
        severity_breakdown: severity_breakdown(findings),
        tool_breakdown: count_first_seen(findings.iter().map(|f| f.tool.as_str()))
            .into_iter()
            .collect(),
        file_breakdown: file_counts.iter().cloned().collect(),
        most_problematic_files: top_files(file_counts, 5),
        avg_llm_confidence,
        timestamp: Utc::now().to_rfc3339(),
        pr_info: PrInfo {
            provider: pr_context.provider.clone(),
            pr_number: pr_context.pr_number,
            files_changed: pr_context.files.len(),
        },
    }
}

fn severity_breakdown(findings: &[Finding]) -> SeverityBreakdown {
    let mut breakdown = SeverityBreakdown::default();
    for finding in findings {
        match finding.severity {
            Severity::Error => breakdown.error += 1,
            Severity::Warning => breakdown.warning += 1,
            Severity::Info => breakdown.info += 1,
        }
    }
    breakdown
}

/// Count occurrences preserving first-seen order, which both the summary's
/// sources clause and the problem-file tie-breaking depend on.
fn count_first_seen<'a>(items: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(name, _)| name == item) {
            Some((_, count)) => *count += 1,
            None => counts.push((item.to_string(), 1)),
        }
    }
    counts
}

fn top_files(file_counts: Vec<(String, usize)>, limit: usize) -> Vec<FileIssues> {
    let mut sorted = file_counts;
    // Stable sort keeps first-encountered order among equal counts.
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    sorted
        .into_iter()
        .take(limit)
        .map(|(file, issues)| FileIssues { file, issues })
        .collect()
}

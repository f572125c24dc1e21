use serde::{Deserialize, Deserializer, Serialize};

/// Severity of a single finding. Declared in ascending order so `max()`
/// yields the worst severity present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Parse a severity string. Unrecognized values normalize to `info`.
    pub fn parse(raw: &str) -> Severity {
        match raw.to_ascii_lowercase().as_str() {
            "error" => Severity::Error,
            "warning" => Severity::Warning,
            _ => Severity::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Info
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Severity::parse(&raw))
    }
}

/// A single issue detected by a static analyzer or the LLM reviewer.
///
/// Findings can arrive from outside the process (saved artifacts, LLM
/// responses), so every field deserializes with a safe default: one sparse or
/// malformed finding must never sink the whole batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Repo-relative path the finding refers to.
    #[serde(default = "default_file")]
    pub file: String,
    /// 1-based line number in the new version of the file.
    #[serde(default = "default_line")]
    pub line: usize,
    #[serde(default)]
    pub severity: Severity,
    /// Identifier of the producing analyzer ("style", "security",
    /// "complexity", "llm", or a specific linter name).
    #[serde(default = "default_tool")]
    pub tool: String,
    #[serde(default)]
    pub message: String,
    /// Rule/check identifier, e.g. "E501", "B608", "COMPLEXITY_18".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// LLM self-reported confidence, clamped to [0, 1] on arrival.
    #[serde(
        default,
        deserialize_with = "clamped_confidence",
        skip_serializing_if = "Option::is_none"
    )]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl Default for Finding {
    fn default() -> Self {
        Finding {
            file: default_file(),
            line: default_line(),
            severity: Severity::default(),
            tool: default_tool(),
            message: String::new(),
            code: None,
            suggestion: None,
            confidence: None,
            reasoning: None,
        }
    }
}

fn default_file() -> String {
    "unknown".to_string()
}

fn default_line() -> usize {
    1
}

fn default_tool() -> String {
    "unknown".to_string()
}

fn clamped_confidence<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.map(|c| c.clamp(0.0, 1.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn test_severity_parse_normalizes_unknown_to_info() {
        assert_eq!(Severity::parse("error"), Severity::Error);
        assert_eq!(Severity::parse("WARNING"), Severity::Warning);
        assert_eq!(Severity::parse("critical"), Severity::Info);
        assert_eq!(Severity::parse(""), Severity::Info);
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Error.to_string(), "error");
        assert_eq!(Severity::Info.to_string(), "info");
    }

    #[test]
    fn test_finding_deserialize_defaults() {
        let finding: Finding = serde_json::from_str("{}").unwrap();
        assert_eq!(finding.file, "unknown");
        assert_eq!(finding.line, 1);
        assert_eq!(finding.severity, Severity::Info);
        assert_eq!(finding.tool, "unknown");
        assert!(finding.code.is_none());
    }

    #[test]
    fn test_finding_deserialize_unknown_severity() {
        let finding: Finding =
            serde_json::from_str(r#"{"file": "a.rs", "severity": "fatal"}"#).unwrap();
        assert_eq!(finding.severity, Severity::Info);
    }

    #[test]
    fn test_finding_confidence_clamped() {
        let finding: Finding = serde_json::from_str(r#"{"confidence": 1.7}"#).unwrap();
        assert_eq!(finding.confidence, Some(1.0));
        let finding: Finding = serde_json::from_str(r#"{"confidence": -0.2}"#).unwrap();
        assert_eq!(finding.confidence, Some(0.0));
    }

    #[test]
    fn test_finding_serialize_omits_absent_optionals() {
        let finding = Finding {
            file: "src/lib.rs".to_string(),
            line: 3,
            severity: Severity::Warning,
            tool: "style".to_string(),
            message: "line too long".to_string(),
            code: Some("E501".to_string()),
            ..Finding::default()
        };
        let value = serde_json::to_value(&finding).unwrap();
        assert_eq!(value["code"], "E501");
        assert!(value.get("suggestion").is_none());
        assert!(value.get("confidence").is_none());
        assert!(value.get("reasoning").is_none());
    }
}

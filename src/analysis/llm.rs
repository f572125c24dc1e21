use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, warn};

use super::{Analyzer, Finding, Severity};
use crate::config::LlmConfig;
use crate::provider::diff;
use crate::provider::types::{FileChange, PrContext};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const MAX_OUTPUT_TOKENS: u32 = 800;

/// LLM-backed reviewer using the Gemini REST API, one request per changed
/// file. Never fails the analysis: every request error is logged and simply
/// produces no finding.
pub struct LlmReviewer {
    api_key: String,
    model: String,
    temperature: f64,
    client: reqwest::Client,
}

impl LlmReviewer {
    /// Build a reviewer from config. Returns None (with a warning) when no
    /// API key is configured, so callers fall back to static analysis only.
    pub fn from_config(config: &LlmConfig) -> Option<LlmReviewer> {
        let Some(api_key) = config.api_key.clone() else {
            warn!("LLM API key not configured, skipping LLM analysis");
            return None;
        };
        Some(LlmReviewer {
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            client: reqwest::Client::new(),
        })
    }

    async fn review_file(&self, file: &FileChange) -> Option<Finding> {
        if file.patch.is_empty() {
            return None;
        }

        let body = json!({
            "contents": [{ "parts": [{ "text": build_review_prompt(&file.path, &file.patch) }] }],
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": MAX_OUTPUT_TOKENS,
                "responseMimeType": "application/json",
            }
        });
        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_BASE_URL, self.model, self.api_key
        );

        let response = match self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
        {
            Ok(response) => response,
            Err(err) => {
                error!(file = %file.path, error = %err, "LLM request failed");
                return None;
            }
        };

        let generated = match response.json::<GenerateResponse>().await {
            Ok(generated) => generated,
            Err(err) => {
                error!(file = %file.path, error = %err, "failed to decode LLM response");
                return None;
            }
        };

        let Some(text) = generated.first_text() else {
            warn!(file = %file.path, "empty LLM response");
            return None;
        };

        match parse_review_payload(&text) {
            Some(payload) => Some(payload.into_finding(file)),
            None => {
                error!(file = %file.path, "failed to parse LLM response as JSON");
                None
            }
        }
    }
}

#[async_trait]
impl Analyzer for LlmReviewer {
    fn name(&self) -> &str {
        "llm"
    }

    async fn analyze(&self, pr: &PrContext) -> Vec<Finding> {
        let mut findings = Vec::new();
        for file in &pr.files {
            debug!(file = %file.path, "requesting LLM review");
            if let Some(finding) = self.review_file(file).await {
                findings.push(finding);
            }
        }
        findings
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateResponse {
    fn first_text(&self) -> Option<String> {
        let text = self
            .candidates
            .first()?
            .content
            .parts
            .first()?
            .text
            .trim()
            .to_string();
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// The JSON shape the model is instructed to produce.
#[derive(Debug, Deserialize)]
struct ReviewPayload {
    #[serde(default)]
    comment: String,
    #[serde(default)]
    suggestion: String,
    #[serde(default)]
    severity: String,
    #[serde(default = "default_confidence")]
    confidence: f64,
    #[serde(default)]
    reasoning: String,
}

fn default_confidence() -> f64 {
    0.5
}

impl ReviewPayload {
    fn into_finding(self, file: &FileChange) -> Finding {
        let message = if self.comment.is_empty() {
            "No comment provided".to_string()
        } else {
            self.comment
        };
        Finding {
            file: file.path.clone(),
            line: first_changed_line(&file.patch),
            severity: Severity::parse(&self.severity),
            tool: "llm".to_string(),
            message,
            code: Some("LLM_REVIEW".to_string()),
            suggestion: (!self.suggestion.is_empty()).then_some(self.suggestion),
            confidence: Some(self.confidence.clamp(0.0, 1.0)),
            reasoning: (!self.reasoning.is_empty()).then_some(self.reasoning),
        }
    }
}

/// Parse the model output, tolerating ```json fences around the payload.
fn parse_review_payload(text: &str) -> Option<ReviewPayload> {
    let trimmed = text
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    serde_json::from_str(trimmed).ok()
}

/// A representative line number for a whole-file comment: the first changed
/// line of the patch.
fn first_changed_line(patch: &str) -> usize {
    diff::parse_patch(patch)
        .first()
        .map(|hunk| hunk.new_start)
        .unwrap_or(1)
}

fn build_review_prompt(path: &str, patch: &str) -> String {
    format!(
        "You are an expert code reviewer. Review this code change for quality, \
         security, performance, and best practices. Be constructive and avoid \
         nitpicking trivial issues.\n\n\
         File: {path}\n\nCode diff:\n{patch}\n\n\
         Respond with JSON only, no additional text, using these fields:\n\
         - \"comment\": brief, actionable feedback\n\
         - \"suggestion\": specific code improvement, or empty string\n\
         - \"severity\": \"error\", \"warning\", or \"info\"\n\
         - \"confidence\": number between 0 and 1\n\
         - \"reasoning\": brief explanation of the issue"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_file(patch: &str) -> FileChange {
        FileChange {
            path: "src/module.py".to_string(),
            additions: 1,
            deletions: 0,
            status: "modified".to_string(),
            patch: patch.to_string(),
        }
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let config = LlmConfig::default();
        assert!(LlmReviewer::from_config(&config).is_none());

        let config = LlmConfig {
            api_key: Some("key".to_string()),
            ..LlmConfig::default()
        };
        assert!(LlmReviewer::from_config(&config).is_some());
    }

    #[test]
    fn test_parse_review_payload_plain_json() {
        let payload = parse_review_payload(
            r#"{"comment": "Looks risky", "severity": "warning", "confidence": 0.8}"#,
        )
        .unwrap();
        assert_eq!(payload.comment, "Looks risky");
        assert_eq!(payload.severity, "warning");
        assert_eq!(payload.confidence, 0.8);
    }

    #[test]
    fn test_parse_review_payload_with_fences() {
        let text = "```json\n{\"comment\": \"ok\", \"severity\": \"info\"}\n```";
        let payload = parse_review_payload(text).unwrap();
        assert_eq!(payload.comment, "ok");
        // Absent confidence falls back to the neutral default.
        assert_eq!(payload.confidence, 0.5);
    }

    #[test]
    fn test_parse_review_payload_rejects_garbage() {
        assert!(parse_review_payload("the model rambled instead").is_none());
    }

    #[test]
    fn test_payload_normalization() {
        let payload = ReviewPayload {
            comment: String::new(),
            suggestion: String::new(),
            severity: "catastrophic".to_string(),
            confidence: 3.0,
            reasoning: "because".to_string(),
        };
        let finding = payload.into_finding(&sample_file("@@ -1,2 +4,3 @@\n+x = 1\n"));
        assert_eq!(finding.message, "No comment provided");
        assert_eq!(finding.severity, Severity::Info);
        assert_eq!(finding.confidence, Some(1.0));
        assert!(finding.suggestion.is_none());
        assert_eq!(finding.reasoning.as_deref(), Some("because"));
        assert_eq!(finding.tool, "llm");
        assert_eq!(finding.code.as_deref(), Some("LLM_REVIEW"));
        assert_eq!(finding.line, 4);
    }

    #[test]
    fn test_first_changed_line_defaults_to_1() {
        assert_eq!(first_changed_line(""), 1);
    }

    #[test]
    fn test_prompt_mentions_file_and_fields() {
        let prompt = build_review_prompt("src/a.py", "+x = 1");
        assert!(prompt.contains("src/a.py"));
        assert!(prompt.contains("\"confidence\""));
        assert!(prompt.contains("JSON only"));
    }
}

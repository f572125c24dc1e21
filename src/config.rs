use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::scoring::Weights;

const CONFIG_FILE: &str = ".pr-reviewer.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration loaded from .pr-reviewer.toml.
///
/// All fields are optional; the tool works with zero config. Provider tokens
/// and the LLM key fall back to environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: TokenConfig,

    #[serde(default)]
    pub gitlab: TokenConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub ci: CiConfig,

    /// Scoring weights, passed explicitly into the scoring call.
    #[serde(default)]
    pub weights: Weights,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenConfig {
    /// API token for the provider. When absent, the matching environment
    /// variable is used.
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Gemini API key; GEMINI_API_KEY env var when absent.
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        LlmConfig {
            api_key: None,
            model: "gemini-1.5-flash".to_string(),
            temperature: 0.3,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CiConfig {
    /// Post review comments back to the provider after a review.
    #[serde(default)]
    pub post_review: bool,
}

impl Config {
    /// Load configuration from .pr-reviewer.toml in the current directory,
    /// falling back to defaults when the file doesn't exist, then overlay
    /// token environment variables.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        let mut config = if path.exists() {
            Self::load_from(path)?
        } else {
            Config::default()
        };

        if config.github.token.is_none() {
            config.github.token = std::env::var("GITHUB_TOKEN").ok();
        }
        if config.gitlab.token.is_none() {
            config.gitlab.token = std::env::var("GITLAB_TOKEN").ok();
        }
        if config.llm.api_key.is_none() {
            config.llm.api_key = std::env::var("GEMINI_API_KEY").ok();
        }

        Ok(config)
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Resolve the GitHub token: config value first, env var second.
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
    }

    /// Resolve the GitLab token: config value first, env var second.
    pub fn gitlab_token(&self) -> Option<String> {
        self.gitlab
            .token
            .clone()
            .or_else(|| std::env::var("GITLAB_TOKEN").ok())
    }
}

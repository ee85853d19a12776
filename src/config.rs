use std::fs;
use std::path::Path;
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classifier::default_benign_patterns;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Missing required API key: {0}")]
    MissingApiKey(String),
}

/// Top-level configuration for the specforge system.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ForgeConfig {
    #[serde(default)]
    pub generator: GeneratorConfig,

    #[serde(default)]
    pub verifier: VerifierConfig,

    #[serde(default)]
    pub refinement: RefinementConfig,
}

impl ForgeConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: ForgeConfig = serde_yaml::from_str(&contents)?;
        Ok(config)
    }
}

/// Configuration for the LLM used to generate candidate annotations.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeneratorConfig {
    /// API key for the LLM service; falls back to OPENAI_API_KEY.
    pub api_key: Option<String>,

    /// Chat-completions endpoint.
    pub api_endpoint: Option<String>,

    /// Model to use.
    pub model: Option<String>,

    /// Temperature for generation (0.0-1.0).
    pub temperature: Option<f32>,

    /// Maximum tokens per response.
    pub max_tokens: Option<usize>,

    /// Retry cap for transient API failures.
    pub max_retries: Option<u32>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            api_key: None,
            api_endpoint: Some("https://api.openai.com/v1/chat/completions".to_string()),
            model: Some("gpt-4o".to_string()),
            temperature: Some(0.2),
            max_tokens: Some(4096),
            max_retries: Some(5),
        }
    }
}

impl GeneratorConfig {
    /// Get the API key, checking the environment if not in config.
    pub fn get_api_key(&self) -> Result<String, ConfigError> {
        if let Some(api_key) = &self.api_key {
            debug!("Using API key from config");
            return Ok(api_key.clone());
        }
        match std::env::var("OPENAI_API_KEY") {
            Ok(key) => Ok(key),
            Err(_) => Err(ConfigError::MissingApiKey(
                "OPENAI_API_KEY not set and no key in config".to_string(),
            )),
        }
    }
}

/// Configuration for the external verifier process.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VerifierConfig {
    /// Verifier executable, resolved through PATH or given as a path.
    pub command: String,

    /// Wall-clock timeout per invocation, in seconds.
    pub timeout_secs: u64,

    /// Benign diagnostic patterns filtered before classification.
    pub benign_patterns: Vec<String>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        VerifierConfig {
            command: "solc-verify.py".to_string(),
            timeout_secs: 300,
            benign_patterns: default_benign_patterns(),
        }
    }
}

impl VerifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Parameters of the refinement loop and the run harness.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefinementConfig {
    /// Attempt cap for the whole-artifact loop.
    pub max_attempts: u32,

    /// Attempt cap per function in the per-function loop.
    pub max_attempts_per_function: u32,

    /// Number of independent runs per experiment.
    pub runs: u32,

    /// Bounded worker pool size for concurrent runs.
    pub jobs: usize,

    /// Namespace token prepended to state-variable references in merged
    /// annotations.
    pub prefix: Option<String>,
}

impl Default for RefinementConfig {
    fn default() -> Self {
        RefinementConfig {
            max_attempts: 10,
            max_attempts_per_function: 5,
            runs: 10,
            jobs: 1,
            prefix: None,
        }
    }
}

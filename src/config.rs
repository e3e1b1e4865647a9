//! TOML configuration parsing and validation.
//!
//! Every section except `[server]` has defaults, so a minimal file only
//! needs a bind address:
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:5000"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub youtube: YouTubeConfig,
    #[serde(default)]
    pub selector: SelectorConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

/// Settings for the YouTube Data API retrieval adapter.
#[derive(Debug, Deserialize, Clone)]
pub struct YouTubeConfig {
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_youtube_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_youtube_base_url")]
    pub base_url: String,
    /// Page size requested from the search endpoint and the final
    /// truncation window.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_youtube_key_env(),
            base_url: default_youtube_base_url(),
            max_results: default_max_results(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_youtube_key_env() -> String {
    "YOUTUBE_API_KEY".to_string()
}
fn default_youtube_base_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}
fn default_max_results() -> usize {
    20
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    2
}

#[derive(Debug, Deserialize, Clone)]
pub struct SelectorConfig {
    /// `"heuristic"` (scoring engine) or `"llm"` (generative model pick).
    #[serde(default = "default_strategy")]
    pub strategy: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
        }
    }
}

fn default_strategy() -> String {
    "heuristic".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: default_llm_model(),
            api_key_env: default_llm_key_env(),
            base_url: default_llm_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_llm_provider() -> String {
    "disabled".to_string()
}
fn default_llm_model() -> String {
    "gemini-pro".to_string()
}
fn default_llm_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}
fn default_llm_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

impl LlmConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

impl Config {
    /// Config used by commands that can run without a config file.
    pub fn minimal() -> Self {
        Self {
            server: ServerConfig {
                bind: "127.0.0.1:5000".to_string(),
            },
            youtube: YouTubeConfig::default(),
            selector: SelectorConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if !(1..=50).contains(&config.youtube.max_results) {
        anyhow::bail!("youtube.max_results must be in [1, 50]");
    }

    match config.llm.provider.as_str() {
        "disabled" | "gemini" => {}
        other => anyhow::bail!(
            "Unknown llm provider: '{}'. Must be disabled or gemini.",
            other
        ),
    }

    match config.selector.strategy.as_str() {
        "heuristic" => {}
        "llm" => {
            if !config.llm.is_enabled() {
                anyhow::bail!("selector.strategy = 'llm' requires [llm] provider to be set");
            }
        }
        other => anyhow::bail!(
            "Unknown selector strategy: '{}'. Must be heuristic or llm.",
            other
        ),
    }

    Ok(())
}

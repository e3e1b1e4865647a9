//! Generative-model title picker.
//!
//! An alternative to the heuristic ranking engine: the candidate titles are
//! numbered in a prompt, the model is asked to reply with the number of the
//! best one, and the digits in its reply are read back as a 1-based index.
//! Any failure along the way falls back to the first candidate.
//!
//! The only backend is Google Gemini's `generateContent` endpoint. The API
//! key is read from the environment variable named in `[llm].api_key_env`.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::LlmConfig;

/// A text-in, text-out generative model.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    fn model_name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Build the numbered-title prompt sent to the model.
pub fn build_prompt(query: &str, titles: &[&str]) -> String {
    let mut prompt = format!(
        "You are an expert at picking the most relevant YouTube video for a user's search query. \
         The query is: '{}'.\nHere are the titles:\n",
        query
    );
    let numbered: Vec<String> = titles
        .iter()
        .enumerate()
        .map(|(i, title)| format!("{}. {}", i + 1, title))
        .collect();
    prompt.push_str(&numbered.join("\n"));
    prompt.push_str("\nReply ONLY with the number of the best video.");
    prompt
}

/// Turn a model reply into a 0-based candidate index.
///
/// Every ASCII digit in the reply is concatenated and read as a 1-based
/// position. No digits, overflow, zero, or a position past `len` all yield
/// index 0.
pub fn parse_choice(reply: &str, len: usize) -> usize {
    let digits: String = reply.trim().chars().filter(char::is_ascii_digit).collect();
    match digits.parse::<usize>() {
        Ok(n) if (1..=len).contains(&n) => n - 1,
        _ => 0,
    }
}

/// Gemini `generateContent` client. Built once at startup.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// # Errors
    ///
    /// Fails if the API key variable is unset or the HTTP client cannot be
    /// built.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| anyhow!("{} environment variable not set", config.api_key_env))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .context("Gemini request failed")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("Gemini API error {}: {}", status, text);
        }

        let json: serde_json::Value = response.json().await?;
        extract_text(&json)
    }
}

/// Pull `candidates[0].content.parts[*].text` out of a Gemini response.
fn extract_text(json: &serde_json::Value) -> Result<String> {
    let parts = json
        .pointer("/candidates/0/content/parts")
        .and_then(|p| p.as_array())
        .ok_or_else(|| anyhow!("Invalid Gemini response: missing content parts"))?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();

    if text.is_empty() {
        bail!("Invalid Gemini response: empty text");
    }
    Ok(text)
}

/// Create the configured model client, or `None` when the provider is
/// disabled.
pub fn create_model(config: &LlmConfig) -> Result<Option<Box<dyn GenerativeModel>>> {
    match config.provider.as_str() {
        "disabled" => Ok(None),
        "gemini" => {
            let model: Box<dyn GenerativeModel> = Box::new(GeminiClient::new(config)?);
            Ok(Some(model))
        }
        other => bail!("Unknown llm provider: {}", other),
    }
}

//! Strategies for choosing one video out of a candidate list.
//!
//! [`HeuristicSelector`] runs the scoring engine in [`crate::ranking`].
//! [`LlmSelector`] delegates the choice to a [`GenerativeModel`] and falls
//! back to the first candidate whenever the model cannot give a usable
//! answer. Which one the server uses is set by `[selector].strategy`.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Config;
use crate::llm::{build_prompt, create_model, parse_choice, GenerativeModel};
use crate::models::CandidateVideo;
use crate::ranking;

#[async_trait]
pub trait Selector: Send + Sync {
    fn name(&self) -> &str;

    /// Pick the best candidate. `None` only for an empty list.
    async fn select(&self, query: &str, candidates: &[CandidateVideo]) -> Option<CandidateVideo>;
}

pub struct HeuristicSelector;

#[async_trait]
impl Selector for HeuristicSelector {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn select(&self, query: &str, candidates: &[CandidateVideo]) -> Option<CandidateVideo> {
        ranking::select_best(query, candidates)
    }
}

pub struct LlmSelector {
    model: Arc<dyn GenerativeModel>,
}

impl LlmSelector {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Selector for LlmSelector {
    fn name(&self) -> &str {
        "llm"
    }

    async fn select(&self, query: &str, candidates: &[CandidateVideo]) -> Option<CandidateVideo> {
        let first = candidates.first()?;

        let titles: Vec<&str> = candidates.iter().map(|v| v.title.as_str()).collect();
        let prompt = build_prompt(query, &titles);

        match self.model.generate(&prompt).await {
            Ok(reply) => {
                let index = parse_choice(&reply, candidates.len());
                tracing::debug!(model = self.model.model_name(), %reply, index, "llm choice");
                candidates.get(index).cloned()
            }
            Err(e) => {
                tracing::warn!(error = %e, "llm selection failed, using first candidate");
                Some(first.clone())
            }
        }
    }
}

/// Build the selector named by `[selector].strategy`.
pub fn create_selector(config: &Config) -> Result<Arc<dyn Selector>> {
    match config.selector.strategy.as_str() {
        "heuristic" => Ok(Arc::new(HeuristicSelector)),
        "llm" => match create_model(&config.llm)? {
            Some(model) => Ok(Arc::new(LlmSelector::new(Arc::from(model)))),
            None => bail!("selector.strategy = 'llm' requires an enabled [llm] provider"),
        },
        other => bail!("Unknown selector strategy: {}", other),
    }
}

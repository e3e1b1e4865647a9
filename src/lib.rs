//! # Clip Scout
//!
//! Find the single best video for a free-text query.
//!
//! Clip Scout retrieves candidate videos from the YouTube Data API, scores
//! each one with a deterministic, explainable heuristic, and returns the
//! winner together with the full candidate list. An HTTP API and a CLI sit
//! on top of the same pipeline.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │    query     │──▶│  Retrieval   │──▶│   Selector   │──▶ best video
//! │              │   │  (YouTube)   │   │ ranking/LLM  │
//! └──────────────┘   └──────────────┘   └──────────────┘
//!                                              │
//!                      ┌───────────────────────┤
//!                      ▼                       ▼
//!                 ┌──────────┐           ┌──────────┐
//!                 │   CLI    │           │   HTTP   │
//!                 │ (scout)  │           │  (axum)  │
//!                 └──────────┘           └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export YOUTUBE_API_KEY=...
//! scout search "best laptop review 2024" --explain
//! scout rank "rust tutorial" --file candidates.json
//! scout serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Candidate and score types |
//! | [`parse`] | Parse-or-default field helpers |
//! | [`tokenize`] | Query/title normalization |
//! | [`ranking`] | Heuristic scoring and selection |
//! | [`llm`] | Generative-model title picker |
//! | [`selector`] | Selection strategies |
//! | [`youtube`] | YouTube Data API retrieval |
//! | [`search`] | CLI search and offline ranking |
//! | [`server`] | HTTP server |

pub mod config;
pub mod llm;
pub mod models;
pub mod parse;
pub mod ranking;
pub mod search;
pub mod selector;
pub mod server;
pub mod tokenize;
pub mod youtube;

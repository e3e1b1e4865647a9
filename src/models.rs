//! Core data models shared by retrieval, ranking and the HTTP layer.
//!
//! Field names on the wire follow the response shape the frontend expects
//! (`snippet`, `channelTitle`, `publishedAt`, `duration`). Candidate fields
//! deserialize leniently: a wrong-typed value becomes unknown or zero for
//! that field instead of rejecting the whole record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::parse;

/// One retrieved video eligible for ranking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateVideo {
    #[serde(default, deserialize_with = "parse::lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "parse::lenient_string")]
    pub url: String,
    #[serde(
        rename = "snippet",
        default,
        deserialize_with = "parse::lenient_string"
    )]
    pub description: String,
    #[serde(default, deserialize_with = "parse::lenient_string")]
    pub thumbnail: String,
    #[serde(
        rename = "channelTitle",
        default,
        deserialize_with = "parse::lenient_string"
    )]
    pub channel_title: String,
    /// Length in seconds as reported upstream. Negative means unknown.
    #[serde(
        rename = "duration",
        default,
        deserialize_with = "parse::lenient_duration"
    )]
    pub duration_seconds: Option<i64>,
    /// Raw ISO-8601 publish timestamp, parsed lazily.
    #[serde(
        rename = "publishedAt",
        default,
        deserialize_with = "parse::lenient_opt_string"
    )]
    pub published_at: Option<String>,
    /// Retrieval-stage pre-score, expected in `[0, 3]`.
    #[serde(default, deserialize_with = "parse::lenient_count")]
    pub priority: u32,
    /// Ranking score, set only on the selected candidate.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "parse::lenient_opt_count"
    )]
    pub score: Option<u32>,
}

impl CandidateVideo {
    pub fn thumbnail_present(&self) -> bool {
        !self.thumbnail.is_empty()
    }

    /// Duration in seconds, or `None` when absent or negative.
    pub fn known_duration(&self) -> Option<u64> {
        self.duration_seconds.and_then(|d| u64::try_from(d).ok())
    }

    /// Publish time, or `None` when absent or unparsable.
    pub fn published(&self) -> Option<DateTime<Utc>> {
        self.published_at.as_deref().and_then(parse::published_at)
    }
}

/// Per-component points awarded to a single candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub title: u32,
    pub recency: u32,
    pub duration: u32,
    pub priority: u32,
    pub description: u32,
    pub thumbnail: u32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u32 {
        [
            self.title,
            self.recency,
            self.duration,
            self.priority,
            self.description,
            self.thumbnail,
        ]
        .into_iter()
        .fold(0u32, u32::saturating_add)
    }
}

/// A candidate paired with its computed score for one ranking call.
#[derive(Debug, Clone)]
pub struct ScoredCandidate<'a> {
    pub video: &'a CandidateVideo,
    pub breakdown: ScoreBreakdown,
}

impl ScoredCandidate<'_> {
    pub fn score(&self) -> u32 {
        self.breakdown.total()
    }
}

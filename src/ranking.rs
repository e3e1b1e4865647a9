//! Heuristic ranking engine.
//!
//! Scores every candidate against the query and picks one winner. The score
//! is a sum of independently capped components:
//!
//! | Component | Max | Rule |
//! |-----------|-----|------|
//! | Title | 40 | 5 per shared query token |
//! | Recency | 30 | ≤7 days 30, ≤30 days 20, ≤90 days 10 |
//! | Duration | 20 | 4–25 min 20, 2–4 min 15, 25–30 min 10, other 5 |
//! | Priority | — | 10 × retrieval priority |
//! | Description | 10 | 2 per shared query token |
//! | Thumbnail | 5 | flat bonus when present |
//!
//! Selection is a two-level key: the retrieval `priority` first, the score
//! second. A higher-priority candidate wins regardless of score. Exact ties
//! go to the earliest candidate in input order.
//!
//! Missing or malformed fields score zero for their component. Ranking
//! never fails.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::models::{CandidateVideo, ScoreBreakdown, ScoredCandidate};
use crate::tokenize::{overlap, significant_tokens};

const TITLE_POINTS_PER_MATCH: u32 = 5;
const TITLE_CAP: u32 = 40;
const DESCRIPTION_POINTS_PER_MATCH: u32 = 2;
const DESCRIPTION_CAP: u32 = 10;
const PRIORITY_MULTIPLIER: u32 = 10;
const THUMBNAIL_BONUS: u32 = 5;

/// Select the best candidate for `query` using the current wall clock.
///
/// Returns `None` for an empty candidate list. The returned video is a copy
/// of the winner with [`CandidateVideo::score`] populated.
pub fn select_best(query: &str, candidates: &[CandidateVideo]) -> Option<CandidateVideo> {
    select_best_at(query, candidates, Utc::now())
}

/// Like [`select_best`], with recency measured against `now`.
pub fn select_best_at(
    query: &str,
    candidates: &[CandidateVideo],
    now: DateTime<Utc>,
) -> Option<CandidateVideo> {
    let query_tokens = significant_tokens(query);

    let mut best: Option<ScoredCandidate> = None;
    for video in candidates {
        let scored = ScoredCandidate {
            video,
            breakdown: score_candidate(&query_tokens, video, now),
        };
        // Strict comparison keeps the earliest candidate on exact ties.
        let replace = match &best {
            None => true,
            Some(current) => selection_key(&scored) > selection_key(current),
        };
        if replace {
            best = Some(scored);
        }
    }

    best.map(|winner| {
        let mut video = winner.video.clone();
        video.score = Some(winner.score());
        video
    })
}

/// Score and order every candidate, best first.
///
/// Uses the same ordering as [`select_best_at`]: the first element is always
/// the candidate that function would return.
pub fn rank_candidates<'a>(
    query: &str,
    candidates: &'a [CandidateVideo],
    now: DateTime<Utc>,
) -> Vec<ScoredCandidate<'a>> {
    let query_tokens = significant_tokens(query);

    let mut scored: Vec<ScoredCandidate<'a>> = candidates
        .iter()
        .map(|video| ScoredCandidate {
            video,
            breakdown: score_candidate(&query_tokens, video, now),
        })
        .collect();

    // Stable sort: equal keys keep input order.
    scored.sort_by(|a, b| selection_key(b).cmp(&selection_key(a)));
    scored
}

/// Compute every score component for one candidate.
pub fn score_candidate(
    query_tokens: &HashSet<String>,
    video: &CandidateVideo,
    now: DateTime<Utc>,
) -> ScoreBreakdown {
    let title_matches = overlap(query_tokens, &significant_tokens(&video.title));
    let description_matches = overlap(query_tokens, &significant_tokens(&video.description));

    ScoreBreakdown {
        title: capped(title_matches, TITLE_POINTS_PER_MATCH, TITLE_CAP),
        recency: video
            .published()
            .map(|published| recency_points(now, published))
            .unwrap_or(0),
        duration: video.known_duration().map(duration_points).unwrap_or(0),
        priority: video.priority.saturating_mul(PRIORITY_MULTIPLIER),
        description: capped(
            description_matches,
            DESCRIPTION_POINTS_PER_MATCH,
            DESCRIPTION_CAP,
        ),
        thumbnail: if video.thumbnail_present() {
            THUMBNAIL_BONUS
        } else {
            0
        },
    }
}

/// Points for content age in whole days.
pub fn recency_points(now: DateTime<Utc>, published: DateTime<Utc>) -> u32 {
    match (now - published).num_days() {
        d if d <= 7 => 30,
        d if d <= 30 => 20,
        d if d <= 90 => 10,
        _ => 0,
    }
}

/// Points for a known duration in seconds. Rules are checked in order, so
/// exactly 1500 s lands in the first band.
pub fn duration_points(seconds: u64) -> u32 {
    match seconds {
        240..=1500 => 20,
        120..=239 => 15,
        1501..=1800 => 10,
        _ => 5,
    }
}

fn capped(matches: usize, per_match: u32, cap: u32) -> u32 {
    let matches = u32::try_from(matches).unwrap_or(u32::MAX);
    matches.saturating_mul(per_match).min(cap)
}

fn selection_key(scored: &ScoredCandidate) -> (u32, u32) {
    (scored.video.priority, scored.score())
}

//! CLI entry points for `scout search` and `scout rank`.
//!
//! `search` goes through the configured [`VideoSource`] and [`Selector`];
//! `rank` reads candidates from a JSON file and runs the heuristic engine
//! offline, which makes it handy for tuning and for reproducing a ranking.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;

use crate::config::Config;
use crate::models::CandidateVideo;
use crate::ranking::{rank_candidates, select_best_at};
use crate::selector::{create_selector, Selector};
use crate::youtube::{VideoSource, YouTubeSource};

/// How results are printed.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Print a per-component score table for every candidate.
    pub explain: bool,
    /// Emit the best video as JSON instead of text.
    pub json: bool,
}

pub async fn run_search(config: &Config, query: &str, opts: OutputOptions) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let source = YouTubeSource::new(&config.youtube)?;
    let selector = create_selector(config)?;

    let videos = source
        .search(query)
        .await
        .with_context(|| format!("Error searching YouTube for '{}'", query))?;

    if videos.is_empty() {
        println!("No results.");
        return Ok(());
    }

    let best = selector.select(query, &videos).await;
    print_outcome(query, &videos, best.as_ref(), Utc::now(), opts)
}

pub fn run_rank(query: &str, file: &Path, opts: OutputOptions) -> Result<()> {
    let videos = load_candidates(file)?;
    let now = Utc::now();

    let best = select_best_at(query, &videos, now);
    if best.is_none() {
        println!("No results.");
        return Ok(());
    }
    print_outcome(query, &videos, best.as_ref(), now, opts)
}

/// Read a JSON array of candidates.
pub fn load_candidates(path: &Path) -> Result<Vec<CandidateVideo>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read candidates file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse candidates file: {}", path.display()))
}

fn print_outcome(
    query: &str,
    videos: &[CandidateVideo],
    best: Option<&CandidateVideo>,
    now: DateTime<Utc>,
    opts: OutputOptions,
) -> Result<()> {
    if opts.json {
        println!("{}", serde_json::to_string_pretty(&best)?);
    } else if let Some(best) = best {
        println!("--- Best video ---");
        println!("title:     {}", best.title);
        if !best.url.is_empty() {
            println!("url:       {}", best.url);
        }
        if !best.channel_title.is_empty() {
            println!("channel:   {}", best.channel_title);
        }
        if let Some(secs) = best.known_duration() {
            println!("duration:  {}:{:02}", secs / 60, secs % 60);
        }
        if let Some(ref published) = best.published_at {
            println!("published: {}", published);
        }
        println!("priority:  {}", best.priority);
        if let Some(score) = best.score {
            println!("score:     {}", score);
        }
    } else {
        println!("No results.");
    }

    if opts.explain {
        print_explain(query, videos, now);
    }
    Ok(())
}

fn print_explain(query: &str, videos: &[CandidateVideo], now: DateTime<Utc>) {
    println!();
    println!("--- Ranking ({}) ---", videos.len());
    println!(
        "{:>3} {:>4} {:>5} | {:>5} {:>7} {:>8} {:>8} {:>4} {:>5} | title",
        "#", "prio", "score", "title", "recency", "duration", "priority", "desc", "thumb"
    );
    for (i, scored) in rank_candidates(query, videos, now).iter().enumerate() {
        let b = scored.breakdown;
        println!(
            "{:>3} {:>4} {:>5} | {:>5} {:>7} {:>8} {:>8} {:>4} {:>5} | {}",
            i + 1,
            scored.video.priority,
            scored.score(),
            b.title,
            b.recency,
            b.duration,
            b.priority,
            b.description,
            b.thumbnail,
            scored.video.title
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_candidates() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("videos.json");
        std::fs::write(
            &path,
            r#"[{"title":"A","priority":1},{"title":"B","duration":300,"publishedAt":"bad"}]"#,
        )
        .unwrap();

        let videos = load_candidates(&path).unwrap();
        assert_eq!(videos.len(), 2);
        assert_eq!(videos[1].known_duration(), Some(300));
        assert!(videos[1].published().is_none());
    }

    #[test]
    fn test_load_candidates_rejects_non_array() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("videos.json");
        std::fs::write(&path, r#"{"title":"A"}"#).unwrap();

        let err = load_candidates(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse candidates file"));
    }
}

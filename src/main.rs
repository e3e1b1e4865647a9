//! # Clip Scout CLI (`scout`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `scout search "<query>"` | Retrieve candidates from YouTube and pick the best one |
//! | `scout rank "<query>" --file <json>` | Rank candidates from a JSON file (no network) |
//! | `scout serve` | Start the HTTP API |
//!
//! ## Examples
//!
//! ```bash
//! # Best video with a full score table
//! scout search "sourdough starter" --explain --config ./config/scout.toml
//!
//! # Re-rank a saved candidate list
//! scout rank "sourdough starter" --file ./videos.json --json
//!
//! # Serve POST /api/search
//! scout serve --config ./config/scout.toml
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use clip_scout::config;
use clip_scout::search::{self, OutputOptions};
use clip_scout::server;

/// Clip Scout CLI — find the single best video for a query.
#[derive(Parser)]
#[command(
    name = "scout",
    about = "Clip Scout — find the single best video for a free-text query",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/scout.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search YouTube and print the best matching video.
    Search {
        /// The search query string.
        query: String,

        /// Print the per-component score of every candidate.
        #[arg(long)]
        explain: bool,

        /// Print the best video as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Rank candidates from a JSON file without calling any API.
    ///
    /// The file holds an array of videos in the same shape the HTTP API
    /// returns (`title`, `snippet`, `duration`, `publishedAt`, `priority`, ...).
    Rank {
        /// The search query string.
        query: String,

        /// Path to a JSON array of candidate videos.
        #[arg(long)]
        file: PathBuf,

        /// Print the per-component score of every candidate.
        #[arg(long)]
        explain: bool,

        /// Print the best video as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP server.
    ///
    /// Binds to `[server].bind` and serves `POST /api/search` and `GET /health`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Offline ranking needs no config file.
    if let Commands::Rank {
        query,
        file,
        explain,
        json,
    } = &cli.command
    {
        search::run_rank(
            query,
            file,
            OutputOptions {
                explain: *explain,
                json: *json,
            },
        )?;
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Search {
            query,
            explain,
            json,
        } => {
            search::run_search(&cfg, &query, OutputOptions { explain, json }).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Rank { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}

//! # League Sync
//!
//! Mirrors a club's data from a JavaScript-rendered amateur league site into
//! a PostgREST-backed database: squad statistics, fixtures and results with
//! goal scorers, and optionally the division table.
//!
//! ## Usage
//!
//! ```sh
//! league_sync --team-id 5253 --division-id 699 --team-name Madagascar
//! ```
//!
//! ## Architecture
//!
//! 1. **Login**: form login over HTTP, session cookies handed to the browser
//! 2. **Extraction**: headless Chrome over WebDriver, one page at a time
//! 3. **Normalization**: fixtures rewritten from the tracked team's side
//! 4. **Sync**: one upsert per record; failures counted, never fatal

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod auth;
mod cli;
mod config;
mod error;
mod models;
mod normalize;
mod pipeline;
mod render;
mod scrapers;
mod store;
mod sync;
#[cfg(test)]
mod test_support;
mod utils;
mod wait;

use cli::Cli;
use config::{FileConfig, StoreTarget, SyncConfig};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Environment ---
    let dotenv = dotenvy::dotenv();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("league_sync starting up");
    match dotenv {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(e) if e.not_found() => debug!("No .env file"),
        Err(e) => warn!(error = %e, "Could not read .env"),
    }

    // Parse CLI
    let args = Cli::parse();
    debug!(config = ?args.config, dry_run = args.dry_run, standings = args.standings, "Parsed CLI arguments");

    let file = match args.config.as_deref() {
        Some(path) => config::load_file(path).await?,
        None => FileConfig::default(),
    };

    let config = match SyncConfig::resolve(args, file) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    info!(
        site = %config.site.origin(),
        team_id = %config.team_id,
        division_id = %config.division_id,
        dry_run = config.store == StoreTarget::DryRun,
        standings = config.include_standings,
        "Configuration resolved"
    );

    let summary = match pipeline::run(&config).await {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, "Sync aborted");
            return Err(e.into());
        }
    };

    info!(updated = summary.players.updated, errors = summary.players.errors, "Players");
    info!(updated = summary.standings.updated, errors = summary.standings.errors, "Standings");
    info!(updated = summary.matches.updated, errors = summary.matches.errors, "Matches");

    let elapsed = start_time.elapsed();
    if summary.total_errors() > 0 {
        warn!(%summary, elapsed_secs = elapsed.as_secs_f64(), "Sync finished with errors");
    } else {
        info!(%summary, elapsed_secs = elapsed.as_secs_f64(), "Sync finished");
    }

    Ok(())
}

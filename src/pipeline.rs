//! One sync run from login to summary.
//!
//! ```text
//! login ─▶ browser ─▶ roster ─▶ next match ─▶ calendar ─▶ [standings] ─▶ scorers
//!                                                                          │
//!                    summary ◀─ upsert ◀─ normalize ◀─ close browser ◀─────┘
//! ```
//!
//! Login and acquiring the browser are the only fatal steps. Past that point
//! every failure is absorbed by the step it happens in.

use crate::auth::{SessionAuthenticator, SessionCookie};
use crate::config::{StoreTarget, SyncConfig, USER_AGENT};
use crate::error::SyncError;
use crate::models::{Match, NextMatch, Player, Standing, SyncSummary};
use crate::normalize::RecordNormalizer;
use crate::render::RenderContext;
use crate::render::webdriver::WebDriverContext;
use crate::scrapers::{calendar, next_match, roster, scorers, standings};
use crate::store::{MemoryStore, PostgrestStore, RecordStore, RetryStore, Table};
use crate::sync::UpsertSync;
use chrono::Utc;
use std::time::Duration;
use tracing::{info, instrument, warn};

const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Everything read from the site in one run.
#[derive(Debug, Default)]
pub struct Extracted {
    pub players: Vec<Player>,
    /// Only logged.
    pub next_match: Option<NextMatch>,
    /// Calendar fixtures, with scorers attached to the played ones.
    pub matches: Vec<Match>,
    /// Empty unless standings were requested.
    pub standings: Vec<Standing>,
}

/// Run a full sync with the browser and store named in `config`.
///
/// # Errors
///
/// Fails only when logging in, starting the browser or building the store
/// client fails. Extraction and persistence problems show up as error
/// counts in the returned summary.
#[instrument(level = "info", skip_all, fields(team_id = %config.team_id))]
pub async fn run(config: &SyncConfig) -> Result<SyncSummary, SyncError> {
    let stamped_at = Utc::now();

    let remote = match &config.store {
        StoreTarget::Postgrest { url, key } => Some(
            PostgrestStore::new(url.clone(), key.clone())
                .map_err(|e| SyncError::Config(format!("cannot build store client: {e}")))?,
        ),
        StoreTarget::DryRun => None,
    };

    let session = SessionAuthenticator::new(config.site.clone(), USER_AGENT)
        .login(&config.credentials)
        .await?;

    let ctx = WebDriverContext::connect(&config.webdriver_url).await?;
    let extracted = extract_all(&ctx, config, &session.cookies()).await;
    if let Err(e) = ctx.close().await {
        warn!(error = %e, "Could not close browser session");
    }

    let summary = match remote {
        Some(store) => {
            let sync = UpsertSync::new(RetryStore::new(store, config.store_retries, RETRY_BASE_DELAY), stamped_at);
            persist(&sync, config, &extracted).await
        }
        None => {
            let sync = UpsertSync::new(dry_run_store(), stamped_at);
            let summary = persist(&sync, config, &extracted).await;
            for table in [Table::Players, Table::Standings, Table::Matches] {
                info!(%table, rows = sync.store().rows(table).len(), "Dry run; nothing written");
            }
            summary
        }
    };
    Ok(summary)
}

/// Store used by `--dry-run`, keyed like the real tables.
pub fn dry_run_store() -> MemoryStore {
    MemoryStore::new().with_primary_key(Table::Standings, &["team_name"])
}

/// Read everything the run needs from an already open render session.
///
/// Never fails: a step that cannot complete leaves its part empty.
///
/// # Arguments
///
/// * `ctx` - Render session, not yet on any page.
/// * `config` - Team, division and wait settings.
/// * `cookies` - Session cookies from the login, installed before the team page loads.
#[instrument(level = "info", skip_all)]
pub async fn extract_all<R: RenderContext>(
    ctx: &R,
    config: &SyncConfig,
    cookies: &[SessionCookie],
) -> Extracted {
    let mut extracted = Extracted::default();

    // cookies can only be set once a page of the site is loaded
    match ctx.navigate(&config.site.home_url()).await {
        Ok(()) => {
            for cookie in cookies {
                if let Err(e) = ctx.add_cookie(cookie).await {
                    warn!(cookie = %cookie.name, error = %e, "Could not install session cookie");
                }
            }
        }
        Err(e) => warn!(error = %e, "Could not open the site; continuing without session cookies"),
    }

    match roster::extract_roster(ctx, &config.site, &config.team_id, &config.wait).await {
        Ok(players) => extracted.players = players,
        Err(e) => warn!(error = %e, "Roster unavailable"),
    }

    match next_match::extract_next_match(ctx).await {
        Ok(next) => extracted.next_match = next,
        Err(e) => warn!(error = %e, "Next match unavailable"),
    }

    match calendar::extract_fixtures(ctx, &config.wait).await {
        Ok(matches) => extracted.matches = matches,
        Err(e) => warn!(error = %e, "Calendar unavailable"),
    }

    if config.include_standings {
        match standings::extract_standings(ctx, &config.site, &config.division_id, &config.wait).await {
            Ok(table) => extracted.standings = table,
            Err(e) => warn!(error = %e, "Standings unavailable"),
        }
    }

    scorers::attach_scorers(ctx, &config.site, &config.wait, &config.team, &mut extracted.matches).await;

    info!(
        players = extracted.players.len(),
        matches = extracted.matches.len(),
        standings = extracted.standings.len(),
        "Extraction finished"
    );
    extracted
}

/// Normalize the fixtures and upsert everything.
pub async fn persist<S: RecordStore>(
    sync: &UpsertSync<S>,
    config: &SyncConfig,
    extracted: &Extracted,
) -> SyncSummary {
    let normalizer = RecordNormalizer::new(config.team.clone(), config.competition.clone());
    let records = normalizer.normalize_all(&extracted.matches);
    sync.sync_all(&extracted.players, &extracted.standings, &records).await
}

//! Goal scorers from a match view.
//!
//! A played match shows two "Goles Equipo" boxes, home side first. Each box
//! holds a table with one `tr[data-key]` row per goal; the scorer's name is
//! the link in the first cell. A player scoring twice has two rows.

use crate::config::SourceSite;
use crate::error::ExtractionError;
use crate::models::{Match, MatchScorers, ScorerTally, record_goal};
use crate::normalize::TeamIdentity;
use crate::render::{RenderContext, query_first};
use crate::wait::StabilityWait;
use itertools::Itertools;
use tracing::{debug, info, instrument, warn};

/// Rendered once the match view has its headings and goal rows.
const SETTLE_SELECTOR: &str = "h4, tr[data-key]";
const SECTION_TITLE: &str = "Goles Equipo";
const FALLBACK_HEADING: &str = "h4.box-title";
const FALLBACK_TITLE: &str = "Goles";
const GOAL_ROW: &str = "tr[data-key]";

/// Load one match view and tally its scorers per side.
///
/// Only a failure to load the page is an error. A missing section leaves that
/// side empty and an unreadable row is skipped.
#[instrument(level = "info", skip_all, fields(%match_id))]
pub async fn extract_scorers<R: RenderContext>(
    ctx: &R,
    site: &SourceSite,
    wait: &StabilityWait,
    match_id: &str,
) -> Result<MatchScorers, ExtractionError> {
    ctx.navigate(&site.match_url(match_id)).await?;
    wait.for_selector(ctx, SETTLE_SELECTOR).await?;

    let sections = goal_sections(ctx).await?;
    if sections.is_empty() {
        debug!("No goal sections on match page");
    }

    let mut scorers = MatchScorers::default();
    for (index, heading) in sections.iter().take(2).enumerate() {
        let side = if index == 0 {
            &mut scorers.home
        } else {
            &mut scorers.away
        };
        if let Err(e) = read_section(ctx, heading, side).await {
            warn!(section = index, error = %e, "Skipping goal section");
        }
    }
    Ok(scorers)
}

/// Headings of the goal boxes, in page order.
async fn goal_sections<R: RenderContext>(ctx: &R) -> Result<Vec<R::Element>, ExtractionError> {
    let primary = headings_containing(ctx, "h4", SECTION_TITLE).await?;
    if !primary.is_empty() {
        return Ok(primary);
    }
    headings_containing(ctx, FALLBACK_HEADING, FALLBACK_TITLE).await
}

async fn headings_containing<R: RenderContext>(
    ctx: &R,
    selector: &str,
    needle: &str,
) -> Result<Vec<R::Element>, ExtractionError> {
    let mut found = Vec::new();
    for heading in ctx.query_all(selector).await? {
        if ctx.read_text(&heading).await?.contains(needle) {
            found.push(heading);
        }
    }
    Ok(found)
}

async fn read_section<R: RenderContext>(
    ctx: &R,
    heading: &R::Element,
    side: &mut Vec<ScorerTally>,
) -> Result<(), ExtractionError> {
    // heading sits in the box header; the table is in the header's sibling
    let header = ctx.parent(heading).await?;
    let container = ctx.parent(&header).await?;
    let table = query_first(ctx, &container, "table").await?;

    for (index, row) in ctx.query_within(&table, GOAL_ROW).await?.iter().enumerate() {
        match scorer_name(ctx, row).await {
            Ok(name) => record_goal(side, &name),
            Err(e) => debug!(index, error = %e, "Skipping goal row"),
        }
    }
    Ok(())
}

async fn scorer_name<R: RenderContext>(ctx: &R, row: &R::Element) -> Result<String, ExtractionError> {
    let cell = query_first(ctx, row, "td").await?;
    let link = query_first(ctx, &cell, "a").await?;
    let name = ctx.read_text(&link).await?.trim().to_string();
    if name.is_empty() {
        return Err(ExtractionError::Missing("scorer name"));
    }
    Ok(name)
}

fn describe(tallies: &[ScorerTally]) -> String {
    tallies
        .iter()
        .map(|t| format!("{} ({})", t.name, t.goals))
        .join(", ")
}

/// Fill in scorers for every played match, one match page at a time.
///
/// Pages are visited in fixture order. A match whose page fails keeps empty
/// scorers and the batch moves on. Returns how many pages were read.
#[instrument(level = "info", skip_all, fields(matches = matches.len()))]
pub async fn attach_scorers<R: RenderContext>(
    ctx: &R,
    site: &SourceSite,
    wait: &StabilityWait,
    team: &TeamIdentity,
    matches: &mut [Match],
) -> usize {
    let mut read = 0;
    for m in matches.iter_mut().filter(|m| m.is_played()) {
        match extract_scorers(ctx, site, wait, &m.match_id).await {
            Ok(scorers) => {
                let is_home = team.matches(&m.home_team);
                info!(
                    match_id = %m.match_id,
                    team = %describe(scorers.for_team(is_home)),
                    rival = %describe(scorers.against_team(is_home)),
                    "Scorers"
                );
                m.scorers = scorers;
                read += 1;
            }
            Err(e) => {
                warn!(match_id = %m.match_id, error = %e, "Could not read scorers; leaving them empty");
                m.scorers = MatchScorers::default();
            }
        }
    }
    read
}

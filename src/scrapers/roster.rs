//! Squad statistics from the team view.
//!
//! Each player is an AngularJS repeated block whose first text line reads
//! `Name - player` (or `- keeper`), followed by centered statistic cells:
//! games played, goals, then fouls (ignored).

use crate::config::SourceSite;
use crate::error::ExtractionError;
use crate::models::Player;
use crate::render::{RenderContext, first_line};
use crate::utils::coerce_count;
use crate::wait::StabilityWait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, instrument, warn};

const PLAYER_ROW: &str = r#"div[ng-repeat*="player in players"]"#;
const STAT_CELL: &str = "div.center_all";

static NAME_ROLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*([^-]+?)\s*-\s*(?:player|keeper)\b").unwrap());

/// Player name from a `Name - role` line.
pub fn parse_player_name(line: &str) -> Option<String> {
    NAME_ROLE
        .captures(line)
        .map(|caps| caps[1].trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Load the team view and read every player row.
///
/// Only a failure to load the page is an error; unreadable rows are skipped.
#[instrument(level = "info", skip_all, fields(%team_id))]
pub async fn extract_roster<R: RenderContext>(
    ctx: &R,
    site: &SourceSite,
    team_id: &str,
    wait: &StabilityWait,
) -> Result<Vec<Player>, ExtractionError> {
    ctx.navigate(&site.team_url(team_id)).await?;
    wait.for_selector(ctx, PLAYER_ROW).await?;

    let rows = ctx.query_all(PLAYER_ROW).await?;
    let mut players = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        match read_player(ctx, row).await {
            Ok(player) => {
                debug!(index, name = %player.name, "Read player");
                players.push(player);
            }
            Err(e) => warn!(index, error = %e, "Skipping player row"),
        }
    }

    info!(count = players.len(), rows = rows.len(), "Extracted roster");
    Ok(players)
}

async fn read_player<R: RenderContext>(
    ctx: &R,
    row: &R::Element,
) -> Result<Player, ExtractionError> {
    let text = ctx.read_text(row).await?;
    let heading = first_line(&text);
    let name = parse_player_name(heading).ok_or_else(|| ExtractionError::Malformed {
        what: "player heading",
        text: heading.to_string(),
    })?;

    let stats = ctx.query_within(row, STAT_CELL).await?;
    if stats.len() < 2 {
        return Err(ExtractionError::Missing("player statistic cells"));
    }
    let games = ctx.read_text(&stats[0]).await?;
    let goals = ctx.read_text(&stats[1]).await?;

    Ok(Player {
        name,
        games_played: coerce_count(first_line(&games)),
        goals: coerce_count(first_line(&goals)),
    })
}

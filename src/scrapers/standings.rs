//! Division table from the division view.
//!
//! Cells: `[position, team, played, won, drawn, lost, goals for, goals
//! against, .., points]`. Points is always the last cell; some seasons add
//! extra columns before it.

use crate::config::SourceSite;
use crate::error::ExtractionError;
use crate::models::Standing;
use crate::render::{RenderContext, first_line, last_line};
use crate::utils::coerce_count;
use crate::wait::StabilityWait;
use tracing::{debug, info, instrument, warn};

const TABLE_ROW: &str = "table tr";
const MIN_CELLS: usize = 8;

/// Read the division table.
///
/// # Arguments
///
/// * `ctx` - Render session with the league cookies installed.
/// * `site` - League site addresses.
/// * `division_id` - Division whose table is read.
/// * `wait` - How long to let the table render.
///
/// # Returns
///
/// One [`Standing`] per row with enough cells, positions numbered from 1 in
/// table order. Fails when the page cannot be loaded or queried.
#[instrument(level = "info", skip_all, fields(%division_id))]
pub async fn extract_standings<R: RenderContext>(
    ctx: &R,
    site: &SourceSite,
    division_id: &str,
    wait: &StabilityWait,
) -> Result<Vec<Standing>, ExtractionError> {
    ctx.navigate(&site.division_url(division_id)).await?;
    wait.for_selector(ctx, TABLE_ROW).await?;

    let mut standings = Vec::new();
    for (index, row) in ctx.query_all(TABLE_ROW).await?.iter().enumerate() {
        let position = standings.len() as u32 + 1;
        match read_standing(ctx, row, position).await {
            Ok(Some(standing)) => standings.push(standing),
            Ok(None) => debug!(index, "Not a standings row"),
            Err(e) => warn!(index, error = %e, "Skipping standings row"),
        }
    }

    info!(count = standings.len(), "Extracted standings");
    Ok(standings)
}

async fn read_standing<R: RenderContext>(
    ctx: &R,
    row: &R::Element,
    position: u32,
) -> Result<Option<Standing>, ExtractionError> {
    let cells = ctx.query_within(row, "td").await?;
    if cells.len() < MIN_CELLS {
        return Ok(None);
    }

    let mut values = Vec::with_capacity(cells.len());
    for cell in &cells {
        values.push(ctx.read_text(cell).await?);
    }

    let team_name = last_line(&values[1]).to_string();
    if team_name.is_empty() {
        return Err(ExtractionError::Missing("team name"));
    }
    let number = |i: usize| coerce_count(first_line(&values[i]));
    let goals_for = number(6);
    let goals_against = number(7);

    Ok(Some(Standing {
        position,
        team_name,
        played: number(2),
        won: number(3),
        drawn: number(4),
        lost: number(5),
        goals_for,
        goals_against,
        goal_difference: i64::from(goals_for) - i64::from(goals_against),
        points: number(values.len() - 1),
    }))
}

//! The "next match" box on the team view.

use crate::error::ExtractionError;
use crate::models::NextMatch;
use crate::render::{RenderContext, last_line};
use tracing::{info, instrument};

const DATE_LINK: &str = r#"div.meilandBox a[href*="/app/match/view"]"#;
const TEAM_LINKS: &str = r#"div.meilandBox a[href*="/app/team/view"]"#;

/// Read the upcoming fixture from the already loaded team view.
///
/// Returns `Ok(None)` when the box is absent, e.g. at the end of a season.
#[instrument(level = "info", skip_all)]
pub async fn extract_next_match<R: RenderContext>(
    ctx: &R,
) -> Result<Option<NextMatch>, ExtractionError> {
    let Some(date_link) = ctx.query_all(DATE_LINK).await?.into_iter().next() else {
        return Ok(None);
    };
    let teams = ctx.query_all(TEAM_LINKS).await?;
    if teams.len() < 2 {
        return Ok(None);
    }

    let date_time = ctx.read_text(&date_link).await?.trim().to_string();
    let home_team = last_line(&ctx.read_text(&teams[0]).await?).to_string();
    let away_team = last_line(&ctx.read_text(&teams[1]).await?).to_string();
    let next = NextMatch {
        date_time,
        home_team,
        away_team,
    };
    info!(next_match = %next, "Found next match");
    Ok(Some(next))
}

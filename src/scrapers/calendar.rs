//! Fixtures and results from the division calendar.
//!
//! The calendar is a modal on the team view opened by `#matchButton`. Every
//! fixture is a table row keyed by `data-key` (the match id) with cells
//! `[round, date, home, away, result]`.

use crate::error::ExtractionError;
use crate::models::{Match, MatchScorers};
use crate::render::{RenderContext, last_line};
use crate::utils::{extract_date, parse_score};
use crate::wait::StabilityWait;
use tracing::{debug, info, instrument, warn};

const CALENDAR_BUTTON: &str = "#matchButton";
const FIXTURE_ROW: &str = "tr[data-key]";
const MIN_CELLS: usize = 5;

/// Open the calendar on the loaded team view and read every fixture row.
///
/// A missing calendar button is not fatal: some layouts render the calendar
/// inline, so the rows are read either way.
#[instrument(level = "info", skip_all)]
pub async fn extract_fixtures<R: RenderContext>(
    ctx: &R,
    wait: &StabilityWait,
) -> Result<Vec<Match>, ExtractionError> {
    open_calendar(ctx).await;
    wait.for_selector(ctx, FIXTURE_ROW).await?;

    let rows = ctx.query_all(FIXTURE_ROW).await?;
    let mut fixtures = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        match read_fixture(ctx, row).await {
            Ok(fixture) => {
                debug!(
                    index,
                    match_id = %fixture.match_id,
                    home = %fixture.home_team,
                    away = %fixture.away_team,
                    "Read fixture"
                );
                fixtures.push(fixture);
            }
            Err(e) => warn!(index, error = %e, "Skipping fixture row"),
        }
    }

    let played = fixtures.iter().filter(|m| m.is_played()).count();
    info!(count = fixtures.len(), played, "Extracted fixtures");
    Ok(fixtures)
}

async fn open_calendar<R: RenderContext>(ctx: &R) {
    let button = match ctx.query_all(CALENDAR_BUTTON).await {
        Ok(found) => found.into_iter().next(),
        Err(e) => {
            warn!(error = %e, "Could not look for the calendar button");
            return;
        }
    };
    match button {
        Some(button) => {
            if let Err(e) = ctx.click(&button).await {
                warn!(error = %e, "Could not open the calendar");
            }
        }
        None => info!("No calendar button; reading rows in place"),
    }
}

async fn read_fixture<R: RenderContext>(
    ctx: &R,
    row: &R::Element,
) -> Result<Match, ExtractionError> {
    let match_id = ctx
        .attribute(row, "data-key")
        .await?
        .unwrap_or_default()
        .trim()
        .to_string();

    let cells = ctx.query_within(row, "td").await?;
    if cells.len() < MIN_CELLS {
        return Err(ExtractionError::Malformed {
            what: "fixture row",
            text: format!("{} cells", cells.len()),
        });
    }

    let date_text = ctx.read_text(&cells[1]).await?;
    let home_team = last_line(&ctx.read_text(&cells[2]).await?).to_string();
    let away_team = last_line(&ctx.read_text(&cells[3]).await?).to_string();
    let result = ctx.read_text(&cells[4]).await?;

    if home_team.is_empty() || away_team.is_empty() {
        return Err(ExtractionError::Missing("team name"));
    }

    Ok(Match {
        match_id,
        date: extract_date(&date_text),
        home_team,
        away_team,
        score: parse_score(&result),
        scorers: MatchScorers::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Score;
    use crate::render::fake::FakeRenderContext;
    use std::time::Duration;

    const URL: &str = "https://league.test/app/team/view?id=5253";

    fn instant() -> StabilityWait {
        StabilityWait {
            max_attempts: 4,
            poll_interval: Duration::ZERO,
        }
    }

    fn row(key: &str, date: &str, home: &str, away: &str, result: &str) -> String {
        format!(
            r#"<tr data-key="{key}"><td>J1</td><td>{date}</td>
               <td><img alt=""><span>{home}</span></td><td><span>{away}</span></td><td>{result}</td></tr>"#
        )
    }

    fn calendar(rows: &[String]) -> String {
        format!("<div class='modal'><table><tbody>{}</tbody></table></div>", rows.concat())
    }

    fn team_page_with_calendar(rows: &[String]) -> FakeRenderContext {
        FakeRenderContext::new()
            .page(URL, r#"<button id="matchButton">Ver calendario</button>"#)
            .on_click("matchButton", &calendar(rows))
    }

    #[tokio::test]
    async fn test_reads_played_and_scheduled_fixtures() {
        let ctx = team_page_with_calendar(&[
            row("81", "Sáb 5/3/2024 18:00", "Madagascar FC", "Rayo Vecino", "3 - 1"),
            row("82", "12/3/2024", "Atlético Barrio", "Madagascar FC", "-"),
        ]);
        ctx.navigate(URL).await.unwrap();

        let fixtures = extract_fixtures(&ctx, &instant()).await.unwrap();
        assert_eq!(fixtures.len(), 2);

        assert_eq!(fixtures[0].match_id, "81");
        assert_eq!(fixtures[0].date.as_deref(), Some("5/3/2024"));
        assert_eq!(fixtures[0].home_team, "Madagascar FC");
        assert_eq!(fixtures[0].score, Some(Score { home: 3, away: 1 }));
        assert!(fixtures[0].is_played());

        assert_eq!(fixtures[1].away_team, "Madagascar FC");
        assert_eq!(fixtures[1].score, None);
        assert!(!fixtures[1].is_played());
        assert!(fixtures.iter().all(|m| m.scorers.is_empty()));
    }

    #[tokio::test]
    async fn test_garbled_result_leaves_both_scores_empty() {
        let ctx = team_page_with_calendar(&[
            row("90", "1/4/2024", "A", "B", "3 -"),
            row("91", "8/4/2024", "C", "D", "aplazado"),
        ]);
        ctx.navigate(URL).await.unwrap();

        let fixtures = extract_fixtures(&ctx, &instant()).await.unwrap();
        for m in &fixtures {
            assert_eq!(m.home_score(), None);
            assert_eq!(m.away_score(), None);
        }
    }

    #[tokio::test]
    async fn test_short_rows_are_skipped() {
        let rows = vec![
            r#"<tr data-key="1"><td>only</td><td>two</td></tr>"#.to_string(),
            row("2", "2/2/2024", "A", "B", "1 - 0"),
        ];
        let ctx = team_page_with_calendar(&rows);
        ctx.navigate(URL).await.unwrap();

        let fixtures = extract_fixtures(&ctx, &instant()).await.unwrap();
        assert_eq!(fixtures.len(), 1);
        assert_eq!(fixtures[0].match_id, "2");
    }

    #[tokio::test]
    async fn test_inline_calendar_without_button() {
        let html = calendar(&[row("5", "9/9/2024", "A", "B", "2-2")]);
        let ctx = FakeRenderContext::new().page(URL, &html);
        ctx.navigate(URL).await.unwrap();

        let fixtures = extract_fixtures(&ctx, &instant()).await.unwrap();
        assert_eq!(fixtures[0].score, Some(Score { home: 2, away: 2 }));
    }
}

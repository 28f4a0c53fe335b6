//! Scrapers for the league site's rendered pages.
//!
//! Each scraper works on a [`RenderContext`](crate::render::RenderContext)
//! and follows the same pattern:
//!
//! 1. **Load**: navigate (or click) to the view and wait for the rendered
//!    rows to settle with [`StabilityWait`](crate::wait::StabilityWait)
//! 2. **Read**: parse each row on its own; a bad row is logged and skipped
//!
//! # Pages
//!
//! | Data | Module | View | Notes |
//! |------|--------|------|-------|
//! | Squad statistics | [`roster`] | team view | `name - role` rows with stat cells |
//! | Upcoming fixture | [`next_match`] | team view | Informational only |
//! | Fixtures and results | [`calendar`] | team view, calendar modal | Rows keyed by `data-key` |
//! | Goal scorers | [`scorers`] | match view | Two "Goles Equipo" tables |
//! | Division table | [`standings`] | division view | Opt-in |

pub mod calendar;
pub mod next_match;
pub mod roster;
pub mod scorers;
pub mod standings;

//! Data models for scraped league data and their normalized representations.
//!
//! - [`Player`], [`Match`], [`NextMatch`], [`Standing`]: raw data as read from
//!   the source pages
//! - [`ScorerTally`], [`MatchScorers`]: per-match goal scorer breakdowns
//! - [`NormalizedMatchRecord`]: a match seen from the tracked team's side
//! - [`EntityCounts`], [`SyncSummary`]: the outcome of a sync run
//!
//! Everything here lives for one run only.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A squad member with their season statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Display name, used as the unique key in the store.
    pub name: String,
    /// Appearances this season.
    pub games_played: u32,
    pub goals: u32,
}

/// Final score of a played match.
///
/// Either both sides have a score or the match has no score at all, so the
/// pair is kept together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

/// One goal scorer and how many times they scored in a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorerTally {
    pub name: String,
    pub goals: u32,
}

/// Goal scorers of a match, split by the side they scored for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchScorers {
    pub home: Vec<ScorerTally>,
    pub away: Vec<ScorerTally>,
}

impl MatchScorers {
    pub fn is_empty(&self) -> bool {
        self.home.is_empty() && self.away.is_empty()
    }

    /// Scorers of the tracked team, given whether it played at home.
    pub fn for_team(&self, is_home: bool) -> &[ScorerTally] {
        if is_home { &self.home } else { &self.away }
    }

    /// Scorers of the opponent, given whether the tracked team played at home.
    pub fn against_team(&self, is_home: bool) -> &[ScorerTally] {
        if is_home { &self.away } else { &self.home }
    }
}

/// Add one goal for `name` to a running tally list.
///
/// A name already present gets its count bumped; a new name is appended with
/// one goal, so the list keeps first-seen order and never repeats a name.
pub fn record_goal(tallies: &mut Vec<ScorerTally>, name: &str) {
    match tallies.iter_mut().find(|t| t.name == name) {
        Some(existing) => existing.goals += 1,
        None => tallies.push(ScorerTally {
            name: name.to_string(),
            goals: 1,
        }),
    }
}

/// A fixture from the division calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Row key of the fixture on the source site. Empty when the row had none.
    pub match_id: String,
    /// Date as printed by the source, `d/m/yyyy`.
    pub date: Option<String>,
    pub home_team: String,
    pub away_team: String,
    /// `None` until the match is played, or when the result cell was unreadable.
    pub score: Option<Score>,
    /// Empty unless the match page was read.
    pub scorers: MatchScorers,
}

impl Match {
    pub fn home_score(&self) -> Option<u32> {
        self.score.map(|s| s.home)
    }

    pub fn away_score(&self) -> Option<u32> {
        self.score.map(|s| s.away)
    }

    /// A match is played when it has a score and can be looked up by id.
    pub fn is_played(&self) -> bool {
        self.score.is_some() && !self.match_id.trim().is_empty()
    }
}

/// The upcoming fixture shown on the team page. Logged, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextMatch {
    pub date_time: String,
    pub home_team: String,
    pub away_team: String,
}

impl fmt::Display for NextMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs {} ({})", self.home_team, self.away_team, self.date_time)
    }
}

/// One line of the division table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    /// 1-based rank, in table order.
    pub position: u32,
    pub team_name: String,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    /// As printed; may disagree with `goals_for - goals_against`.
    pub goal_difference: i64,
    pub points: u32,
}

/// A match from the tracked team's point of view, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedMatchRecord {
    /// Serialized as `YYYY-MM-DD`.
    pub match_date: Option<NaiveDate>,
    /// The side that is not the tracked team.
    pub opponent: String,
    /// Goals of the tracked team.
    pub goals_for: Option<u32>,
    pub goals_against: Option<u32>,
    pub is_home: bool,
    pub competition: String,
    /// JSON with `madagascar_scorers` and `rival_scorers`; absent without scorers.
    pub scorer_notes: Option<String>,
}

/// Scorer breakdown as stored in a match's notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorerNotes {
    /// Tracked team's scorers, stored under the key existing rows use.
    #[serde(rename = "madagascar_scorers")]
    pub team_scorers: Vec<ScorerTally>,
    /// Opponent's scorers.
    pub rival_scorers: Vec<ScorerTally>,
}

/// Written and failed record counts for one entity type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EntityCounts {
    /// Rows the store accepted.
    pub updated: usize,
    /// Rows that failed to write, after retries.
    pub errors: usize,
}

/// Per-entity outcome of a sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub players: EntityCounts,
    pub standings: EntityCounts,
    pub matches: EntityCounts,
}

impl SyncSummary {
    pub fn total_errors(&self) -> usize {
        self.players.errors + self.standings.errors + self.matches.errors
    }
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "players {}/{} err, standings {}/{} err, matches {}/{} err",
            self.players.updated,
            self.players.errors,
            self.standings.updated,
            self.standings.errors,
            self.matches.updated,
            self.matches.errors
        )
    }
}

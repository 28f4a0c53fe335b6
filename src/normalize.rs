//! Reshape home/away fixtures into records seen from the tracked team's side.

use crate::models::{Match, NormalizedMatchRecord, ScorerNotes};
use crate::utils::parse_day_month_year;
use tracing::warn;

/// Recognizes the tracked team in fixture listings.
///
/// The league prints team names with sponsor prefixes and suffixes that
/// change between seasons, so the identity is a case-insensitive fragment of
/// the name rather than an exact match. Configure the most distinctive
/// fragment available: any team whose name contains it counts as the tracked
/// team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamIdentity {
    marker: String,
}

impl TeamIdentity {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into().trim().to_lowercase(),
        }
    }

    pub fn matches(&self, team_name: &str) -> bool {
        !self.marker.is_empty() && team_name.to_lowercase().contains(&self.marker)
    }
}

/// Builds [`NormalizedMatchRecord`]s for one team and competition.
#[derive(Debug, Clone)]
pub struct RecordNormalizer {
    team: TeamIdentity,
    competition: String,
}

impl RecordNormalizer {
    pub fn new(team: TeamIdentity, competition: impl Into<String>) -> Self {
        Self {
            team,
            competition: competition.into(),
        }
    }

    pub fn normalize(&self, m: &Match) -> NormalizedMatchRecord {
        let is_home = self.team.matches(&m.home_team);
        let (opponent, goals_for, goals_against) = if is_home {
            (&m.away_team, m.home_score(), m.away_score())
        } else {
            (&m.home_team, m.away_score(), m.home_score())
        };

        let match_date = m.date.as_deref().and_then(|raw| {
            let parsed = parse_day_month_year(raw);
            if parsed.is_none() {
                warn!(match_id = %m.match_id, date = raw, "Unreadable match date");
            }
            parsed
        });

        let scorer_notes = if m.scorers.is_empty() {
            None
        } else {
            let notes = ScorerNotes {
                team_scorers: m.scorers.for_team(is_home).to_vec(),
                rival_scorers: m.scorers.against_team(is_home).to_vec(),
            };
            serde_json::to_string(&notes).ok()
        };

        NormalizedMatchRecord {
            match_date,
            opponent: opponent.clone(),
            goals_for,
            goals_against,
            is_home,
            competition: self.competition.clone(),
            scorer_notes,
        }
    }

    pub fn normalize_all(&self, matches: &[Match]) -> Vec<NormalizedMatchRecord> {
        matches.iter().map(|m| self.normalize(m)).collect()
    }
}

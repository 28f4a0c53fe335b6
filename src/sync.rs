//! Write one run's records into the store.
//!
//! Every record is its own upsert. A failed record is logged, counted and
//! skipped; there is no transaction around a batch.

use crate::models::{EntityCounts, NormalizedMatchRecord, Player, Standing, SyncSummary};
use crate::store::{RecordStore, Table};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{error, info, instrument};

#[derive(Debug, Serialize)]
struct PlayerRow<'a> {
    #[serde(flatten)]
    player: &'a Player,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct StandingRow<'a> {
    #[serde(flatten)]
    standing: &'a Standing,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct MatchRow<'a> {
    match_date: Option<NaiveDate>,
    opponent: &'a str,
    goals_for: Option<u32>,
    goals_against: Option<u32>,
    is_home: bool,
    competition: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a str>,
    updated_at: DateTime<Utc>,
}

impl<'a> MatchRow<'a> {
    fn new(record: &'a NormalizedMatchRecord, updated_at: DateTime<Utc>) -> Self {
        Self {
            match_date: record.match_date,
            opponent: &record.opponent,
            goals_for: record.goals_for,
            goals_against: record.goals_against,
            is_home: record.is_home,
            competition: &record.competition,
            notes: record.scorer_notes.as_deref(),
            updated_at,
        }
    }
}

/// Upserts records into a [`RecordStore`], stamping each row with the time
/// the run started.
#[derive(Debug)]
pub struct UpsertSync<S> {
    store: S,
    /// Written to every row's `updated_at`.
    stamped_at: DateTime<Utc>,
}

impl<S: RecordStore> UpsertSync<S> {
    pub fn new(store: S, stamped_at: DateTime<Utc>) -> Self {
        Self { store, stamped_at }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn write<T: Serialize>(&self, table: Table, row: &T, label: &str, counts: &mut EntityCounts) {
        let result = match serde_json::to_value(row) {
            Ok(value) => self.store.upsert(table, &value, table.conflict_key()).await,
            Err(e) => Err(e.into()),
        };
        match result {
            Ok(()) => counts.updated += 1,
            Err(e) => {
                error!(%table, record = label, error = %e, "Upsert failed");
                counts.errors += 1;
            }
        }
    }

    #[instrument(level = "info", skip_all, fields(count = players.len()))]
    pub async fn sync_players(&self, players: &[Player]) -> EntityCounts {
        let mut counts = EntityCounts::default();
        for player in players {
            let row = PlayerRow {
                player,
                updated_at: self.stamped_at,
            };
            self.write(Table::Players, &row, &player.name, &mut counts).await;
        }
        info!(updated = counts.updated, errors = counts.errors, "Players synced");
        counts
    }

    #[instrument(level = "info", skip_all, fields(count = standings.len()))]
    pub async fn sync_standings(&self, standings: &[Standing]) -> EntityCounts {
        let mut counts = EntityCounts::default();
        for standing in standings {
            let row = StandingRow {
                standing,
                updated_at: self.stamped_at,
            };
            self.write(Table::Standings, &row, &standing.team_name, &mut counts).await;
        }
        info!(updated = counts.updated, errors = counts.errors, "Standings synced");
        counts
    }

    #[instrument(level = "info", skip_all, fields(count = records.len()))]
    pub async fn sync_matches(&self, records: &[NormalizedMatchRecord]) -> EntityCounts {
        let mut counts = EntityCounts::default();
        for record in records {
            let row = MatchRow::new(record, self.stamped_at);
            self.write(Table::Matches, &row, &record.opponent, &mut counts).await;
        }
        info!(updated = counts.updated, errors = counts.errors, "Matches synced");
        counts
    }

    /// Players, then standings, then matches.
    pub async fn sync_all(
        &self,
        players: &[Player],
        standings: &[Standing],
        records: &[NormalizedMatchRecord],
    ) -> SyncSummary {
        SyncSummary {
            players: self.sync_players(players).await,
            standings: self.sync_standings(standings).await,
            matches: self.sync_matches(records).await,
        }
    }
}

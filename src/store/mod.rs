//! Record stores the sync writes into.
//!
//! # Implementations
//!
//! - [`postgrest`]: PostgREST endpoint (what the hosted backend exposes)
//! - [`retry`]: backoff decorator for any [`RecordStore`]
//! - [`memory`]: in-process tables for `--dry-run` and tests
//!
//! # Tables
//!
//! | Table | Conflict key |
//! |-------|--------------|
//! | `players` | `name` |
//! | `matches` | `match_date,opponent` |
//! | `standings` | store primary key |

use crate::error::PersistenceError;
use serde_json::Value;
use std::fmt;

pub mod memory;
pub mod postgrest;
pub mod retry;

pub use memory::MemoryStore;
pub use postgrest::PostgrestStore;
pub use retry::RetryStore;

/// Destination tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Players,
    Matches,
    Standings,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Players => "players",
            Table::Matches => "matches",
            Table::Standings => "standings",
        }
    }

    /// Columns an upsert deduplicates on. `None` leaves it to the table's
    /// primary key.
    pub fn conflict_key(self) -> Option<&'static str> {
        match self {
            Table::Players => Some("name"),
            Table::Matches => Some("match_date,opponent"),
            Table::Standings => None,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Insert-or-update of single JSON rows.
pub trait RecordStore {
    /// Write `row` into `table`, replacing the row that shares the
    /// `on_conflict` columns if one exists.
    async fn upsert(
        &self,
        table: Table,
        row: &Value,
        on_conflict: Option<&str>,
    ) -> Result<(), PersistenceError>;
}

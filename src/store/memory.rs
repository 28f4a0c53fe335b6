//! In-process [`RecordStore`] used by dry runs and tests.
//!
//! Upserts follow the database's rules: a row sharing every conflict column
//! with an existing row replaces that row's values, anything else is
//! appended. As with a SQL unique constraint, a null key column never
//! conflicts.

use super::{RecordStore, Table};
use crate::error::PersistenceError;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

/// In-process store with upsert semantics, used for dry runs and tests.
///
/// A row replaces an earlier one when every key column is present and equal.
/// Tables without key columns only ever append.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Rows per table in insertion order.
    tables: Mutex<HashMap<Table, Vec<Map<String, Value>>>>,
    /// Fallback key columns per table.
    primary_keys: HashMap<Table, Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key columns used when an upsert names no conflict columns.
    pub fn with_primary_key(mut self, table: Table, columns: &[&str]) -> Self {
        self.primary_keys
            .insert(table, columns.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Snapshot of a table's rows in insertion order.
    pub fn rows(&self, table: Table) -> Vec<Value> {
        self.tables
            .lock()
            .map(|tables| {
                tables
                    .get(&table)
                    .map(|rows| rows.iter().cloned().map(Value::Object).collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    fn key_columns(&self, table: Table, on_conflict: Option<&str>) -> Vec<String> {
        match on_conflict {
            Some(columns) => columns
                .split(',')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
            None => self.primary_keys.get(&table).cloned().unwrap_or_default(),
        }
    }
}

fn same_key(existing: &Map<String, Value>, row: &Map<String, Value>, columns: &[String]) -> bool {
    !columns.is_empty()
        && columns.iter().all(|c| match (existing.get(c), row.get(c)) {
            (Some(a), Some(b)) => !a.is_null() && a == b,
            _ => false,
        })
}

impl RecordStore for MemoryStore {
    async fn upsert(
        &self,
        table: Table,
        row: &Value,
        on_conflict: Option<&str>,
    ) -> Result<(), PersistenceError> {
        let Value::Object(row) = row else {
            return Err(PersistenceError::Rejected(format!("{table} rows must be objects")));
        };
        let columns = self.key_columns(table, on_conflict);
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| PersistenceError::Rejected("memory store poisoned".to_string()))?;
        let rows = tables.entry(table).or_default();

        match rows.iter_mut().find(|existing| same_key(existing, row, &columns)) {
            Some(existing) => {
                for (column, value) in row {
                    existing.insert(column.clone(), value.clone());
                }
                debug!(%table, "Merged row");
            }
            None => {
                rows.push(row.clone());
                debug!(%table, "Inserted row");
            }
        }
        Ok(())
    }
}

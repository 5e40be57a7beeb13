//! Store contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define the keyed-storage contracts the service layer orchestrates
//!   against.
//! - Keep SQL details and transaction scopes inside this boundary.
//!
//! # Invariants
//! - Every query is scoped by `user_id`; rows owned by another user are
//!   invisible, so ownership misses surface as `NotFound`.
//! - Multi-record writes (reorder sets, the completion pair) are single
//!   all-or-nothing transactions.

use rusqlite::Connection;

pub mod streak_store;
pub mod task_store;

use crate::db::migrations::latest_version;
use streak_store::SqliteStreakStore;
use task_store::{SqliteTaskStore, StoreError, StoreResult};

/// Convenience constructor for both SQLite stores over one migrated
/// connection.
pub fn sqlite_stores(conn: &Connection) -> StoreResult<(SqliteTaskStore<'_>, SqliteStreakStore<'_>)> {
    Ok((
        SqliteTaskStore::try_new(conn)?,
        SqliteStreakStore::try_new(conn)?,
    ))
}

pub(crate) fn ensure_schema_current(conn: &Connection) -> StoreResult<()> {
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

pub(crate) fn ensure_table(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> StoreResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    if exists == 0 {
        return Err(StoreError::MissingRequiredTable(table));
    }

    let mut present = Vec::new();
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        present.push(row.get::<_, String>(1)?);
    }

    for column in columns {
        if !present.iter().any(|name| name == column) {
            return Err(StoreError::MissingRequiredColumn { table, column });
        }
    }

    Ok(())
}

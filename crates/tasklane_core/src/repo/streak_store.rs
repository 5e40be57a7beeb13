//! Streak and badge store contract and SQLite implementation.
//!
//! # Responsibility
//! - Read the per-user streak record; writes ride along with the task
//!   completion transaction in the task store.
//! - Persist one-time badge awards.
//!
//! # Invariants
//! - `(user_id, name)` is the badge primary key; `insert_badge_if_absent`
//!   can never create a duplicate.
//! - Badge listing order is `earned_at DESC, name ASC`.

use crate::model::streak::{Badge, Streak};
use crate::model::task::UserId;
use crate::repo::task_store::{parse_ms, parse_uuid, StoreError, StoreResult};
use crate::repo::{ensure_schema_current, ensure_table};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

const STREAK_COLUMNS: &[&str] = &[
    "user_id",
    "current_streak",
    "longest_streak",
    "last_active_date",
];

const BADGE_COLUMNS: &[&str] = &["user_id", "name", "description", "image_url", "earned_at"];

/// Keyed storage contract for streaks and badges.
pub trait StreakStore {
    /// Loads the user's streak record, if one was ever created.
    fn get_streak(&self, user_id: UserId) -> StoreResult<Option<Streak>>;
    /// Lists the user's badges, most recently earned first.
    fn list_badges(&self, user_id: UserId) -> StoreResult<Vec<Badge>>;
    /// Inserts a badge unless the user already holds one with that name.
    /// Returns whether a row was actually created.
    fn insert_badge_if_absent(&self, badge: &Badge) -> StoreResult<bool>;
}

/// SQLite-backed streak/badge store.
pub struct SqliteStreakStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStreakStore<'conn> {
    /// Constructs a store from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_schema_current(conn)?;
        ensure_table(conn, "streaks", STREAK_COLUMNS)?;
        ensure_table(conn, "badges", BADGE_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl StreakStore for SqliteStreakStore<'_> {
    fn get_streak(&self, user_id: UserId) -> StoreResult<Option<Streak>> {
        let streak = self
            .conn
            .query_row(
                "SELECT user_id, current_streak, longest_streak, last_active_date
                 FROM streaks
                 WHERE user_id = ?1;",
                [user_id.to_string()],
                parse_streak_row,
            )
            .optional()?;

        match streak {
            Some(streak) => Ok(Some(streak?)),
            None => Ok(None),
        }
    }

    fn list_badges(&self, user_id: UserId) -> StoreResult<Vec<Badge>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, name, description, image_url, earned_at
             FROM badges
             WHERE user_id = ?1
             ORDER BY earned_at DESC, name ASC;",
        )?;

        let mut rows = stmt.query([user_id.to_string()])?;
        let mut badges = Vec::new();
        while let Some(row) = rows.next()? {
            badges.push(parse_badge_row(row)?);
        }

        Ok(badges)
    }

    fn insert_badge_if_absent(&self, badge: &Badge) -> StoreResult<bool> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO badges (user_id, name, description, image_url, earned_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                badge.user_id.to_string(),
                badge.name.as_str(),
                badge.description.as_str(),
                badge.image_url.as_str(),
                badge.earned_at.timestamp_millis(),
            ],
        )?;

        Ok(changed == 1)
    }
}

fn parse_streak_row(row: &Row<'_>) -> rusqlite::Result<StoreResult<Streak>> {
    let user_id_text: String = row.get("user_id")?;
    let current_streak: i64 = row.get("current_streak")?;
    let longest_streak: i64 = row.get("longest_streak")?;
    let date_text: String = row.get("last_active_date")?;

    Ok(build_streak(
        user_id_text,
        current_streak,
        longest_streak,
        date_text,
    ))
}

fn build_streak(
    user_id_text: String,
    current_streak: i64,
    longest_streak: i64,
    date_text: String,
) -> StoreResult<Streak> {
    let user_id = parse_uuid(user_id_text, "streaks.user_id")?;
    let current_streak = u32::try_from(current_streak).map_err(|_| {
        StoreError::InvalidData(format!(
            "invalid count `{current_streak}` in streaks.current_streak"
        ))
    })?;
    let longest_streak = u32::try_from(longest_streak).map_err(|_| {
        StoreError::InvalidData(format!(
            "invalid count `{longest_streak}` in streaks.longest_streak"
        ))
    })?;
    let last_active_date = NaiveDate::parse_from_str(&date_text, "%Y-%m-%d").map_err(|_| {
        StoreError::InvalidData(format!(
            "invalid date `{date_text}` in streaks.last_active_date"
        ))
    })?;

    Ok(Streak {
        user_id,
        current_streak,
        longest_streak,
        last_active_date,
    })
}

fn parse_badge_row(row: &Row<'_>) -> StoreResult<Badge> {
    Ok(Badge {
        user_id: parse_uuid(row.get::<_, String>("user_id")?, "badges.user_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        image_url: row.get("image_url")?,
        earned_at: parse_ms(row.get("earned_at")?, "badges.earned_at")?,
    })
}

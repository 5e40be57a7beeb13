//! Streak and badge records.
//!
//! # Responsibility
//! - Define the per-user continuity record and its one-time awards.
//!
//! # Invariants
//! - At most one streak row per user; created lazily, never deleted.
//! - `longest_streak >= current_streak` at all times.
//! - At most one badge per `(user_id, name)` pair, ever.

use crate::model::task::UserId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Per-user count of consecutive calendar days with at least one completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Streak {
    /// Owning user.
    pub user_id: UserId,
    /// Length of the run ending on `last_active_date`.
    pub current_streak: u32,
    /// Maximum `current_streak` ever observed; monotonically non-decreasing.
    pub longest_streak: u32,
    /// Calendar day of the most recent credited completion.
    pub last_active_date: NaiveDate,
}

impl Streak {
    /// The streak created by a user's first qualifying completion.
    pub fn started(user_id: UserId, day: NaiveDate) -> Self {
        Self {
            user_id,
            current_streak: 1,
            longest_streak: 1,
            last_active_date: day,
        }
    }
}

/// One-time achievement earned when a streak first reaches a catalog
/// threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    /// Owning user.
    pub user_id: UserId,
    /// Catalog entry name; unique per user.
    pub name: String,
    /// Human-readable achievement text.
    pub description: String,
    /// Static asset reference derived from the badge name.
    pub image_url: String,
    /// Instant the badge was granted.
    pub earned_at: DateTime<Utc>,
}

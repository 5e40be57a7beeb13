//! Streak badge catalog and awarding.
//!
//! # Responsibility
//! - Hold the fixed threshold catalog and derive badge asset references.
//! - Grant badges when a streak increment lands exactly on a threshold.
//!
//! # Invariants
//! - Matching is by equality, not `>=`: a streak must pass *through* a
//!   threshold to earn its badge.
//! - Awards are insert-if-absent; a reset-and-regrown streak never produces
//!   a duplicate.
//! - Awarding is best-effort derived state: store failures are logged and
//!   never unwind the committed streak update.

use crate::model::streak::Badge;
use crate::model::task::UserId;
use crate::repo::streak_store::StreakStore;
use chrono::{DateTime, Utc};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// One fixed catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeSpec {
    /// Streak length that triggers this badge.
    pub threshold: u32,
    /// Unique badge name per user.
    pub name: &'static str,
    /// Achievement text shown with the award.
    pub description: &'static str,
}

/// Fixed, extensible badge catalog in ascending threshold order.
pub const STREAK_BADGES: &[BadgeSpec] = &[
    BadgeSpec {
        threshold: 3,
        name: "3-Day Streak",
        description: "Completed tasks for 3 consecutive days",
    },
    BadgeSpec {
        threshold: 7,
        name: "Week Warrior",
        description: "Completed tasks for 7 consecutive days",
    },
    BadgeSpec {
        threshold: 30,
        name: "Monthly Master",
        description: "Completed tasks for 30 consecutive days",
    },
];

impl BadgeSpec {
    /// Builds the concrete award record for one user.
    pub fn to_badge(&self, user_id: UserId, earned_at: DateTime<Utc>) -> Badge {
        Badge {
            user_id,
            name: self.name.to_string(),
            description: self.description.to_string(),
            image_url: badge_image_url(self.name),
            earned_at,
        }
    }
}

/// Catalog entry whose threshold equals `current_streak`, if any.
pub fn badge_for_streak(current_streak: u32) -> Option<&'static BadgeSpec> {
    STREAK_BADGES
        .iter()
        .find(|spec| spec.threshold == current_streak)
}

/// Static asset path for a badge name: lowercased, whitespace collapsed to
/// dashes.
pub fn badge_image_url(name: &str) -> String {
    let slug = WHITESPACE_RE
        .replace_all(name.trim(), "-")
        .to_ascii_lowercase();
    format!("/badges/{slug}.svg")
}

/// Grants any catalog badge whose threshold the streak just landed on.
///
/// Returns the badges actually created. Store failures are reported per
/// entry and swallowed; the caller's completion has already committed.
pub fn award_for_streak<S: StreakStore>(
    store: &S,
    user_id: UserId,
    current_streak: u32,
    earned_at: DateTime<Utc>,
) -> Vec<Badge> {
    let mut awarded = Vec::new();

    for spec in STREAK_BADGES {
        if spec.threshold != current_streak {
            continue;
        }

        let badge = spec.to_badge(user_id, earned_at);
        match store.insert_badge_if_absent(&badge) {
            Ok(true) => {
                info!(
                    "event=badge_awarded module=engine status=ok user_id={user_id} badge={}",
                    spec.name
                );
                awarded.push(badge);
            }
            Ok(false) => {}
            Err(err) => {
                warn!(
                    "event=badge_award module=engine status=error user_id={user_id} badge={} error={err}",
                    spec.name
                );
            }
        }
    }

    awarded
}

#[cfg(test)]
mod tests {
    use super::{badge_for_streak, badge_image_url};

    #[test]
    fn thresholds_match_by_equality_only() {
        assert_eq!(badge_for_streak(3).map(|spec| spec.name), Some("3-Day Streak"));
        assert_eq!(badge_for_streak(7).map(|spec| spec.name), Some("Week Warrior"));
        assert_eq!(badge_for_streak(30).map(|spec| spec.name), Some("Monthly Master"));
        assert_eq!(badge_for_streak(4), None);
        assert_eq!(badge_for_streak(8), None);
        assert_eq!(badge_for_streak(31), None);
    }

    #[test]
    fn image_url_is_a_lowercased_dashed_slug() {
        assert_eq!(badge_image_url("3-Day Streak"), "/badges/3-day-streak.svg");
        assert_eq!(badge_image_url("Week Warrior"), "/badges/week-warrior.svg");
        assert_eq!(
            badge_image_url("Monthly  Master"),
            "/badges/monthly-master.svg"
        );
    }
}

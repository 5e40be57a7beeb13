//! Date-driven streak state machine and shared calendar rules.
//!
//! # Responsibility
//! - Convert "completed something on day D" events into streak transitions.
//! - Own the calendar truncation helpers every day-boundary comparison in
//!   the crate must share.
//!
//! # Invariants
//! - The machine only moves forward: same-day events are idempotent and
//!   reopening a task never runs it at all.
//! - `longest_streak` never decreases.

use crate::model::streak::Streak;
use crate::model::task::UserId;
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};

/// Result of feeding one completion day into the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakTransition {
    /// Streak state after the event.
    pub streak: Streak,
    /// Whether the record differs from the stored one and needs persisting.
    pub changed: bool,
    /// Whether `current_streak` actually grew; badge checks fire only on
    /// genuine increments.
    pub incremented: bool,
}

/// Advances the per-user streak machine by one completion event on `today`.
///
/// - No prior record: the event starts a streak of 1.
/// - Same calendar day as the last credit: no change (idempotent).
/// - Exactly the next day: increment, ratcheting `longest_streak`.
/// - A gap of two or more days: reset to 1, `longest_streak` untouched.
pub fn advance(existing: Option<&Streak>, user_id: UserId, today: NaiveDate) -> StreakTransition {
    let Some(previous) = existing else {
        return StreakTransition {
            streak: Streak::started(user_id, today),
            changed: true,
            incremented: true,
        };
    };

    let diff_days = (today - previous.last_active_date).num_days();
    if diff_days <= 0 {
        // Already credited today. Negative diffs only appear under clock
        // skew between devices and are treated the same way.
        return StreakTransition {
            streak: *previous,
            changed: false,
            incremented: false,
        };
    }

    let streak = if diff_days == 1 {
        let current = previous.current_streak + 1;
        Streak {
            user_id,
            current_streak: current,
            longest_streak: previous.longest_streak.max(current),
            last_active_date: today,
        }
    } else {
        Streak {
            user_id,
            current_streak: 1,
            longest_streak: previous.longest_streak,
            last_active_date: today,
        }
    };

    StreakTransition {
        incremented: streak.current_streak > previous.current_streak,
        changed: true,
        streak,
    }
}

/// Today as a local calendar day, time-of-day stripped.
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// The most recent Sunday on or before `day`; weekly aggregates start here.
pub fn start_of_week(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_sunday()))
}

/// Local midnight of `day` as an instant, for comparing against stored
/// timestamps.
pub fn local_day_start(day: NaiveDate) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|instant| instant.with_timezone(&Utc))
        // Zones that skip midnight on a DST day fall back to the UTC reading.
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

#[cfg(test)]
mod tests {
    use super::{advance, start_of_week};
    use crate::model::streak::Streak;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn day(value: &str) -> NaiveDate {
        value.parse().unwrap()
    }

    #[test]
    fn first_completion_starts_a_streak_of_one() {
        let user = Uuid::new_v4();
        let transition = advance(None, user, day("2026-08-01"));

        assert_eq!(transition.streak.current_streak, 1);
        assert_eq!(transition.streak.longest_streak, 1);
        assert_eq!(transition.streak.last_active_date, day("2026-08-01"));
        assert!(transition.changed);
        assert!(transition.incremented);
    }

    #[test]
    fn same_day_completion_is_idempotent() {
        let user = Uuid::new_v4();
        let existing = Streak::started(user, day("2026-08-01"));
        let transition = advance(Some(&existing), user, day("2026-08-01"));

        assert_eq!(transition.streak, existing);
        assert!(!transition.changed);
        assert!(!transition.incremented);
    }

    #[test]
    fn consecutive_days_increment_and_ratchet_longest() {
        let user = Uuid::new_v4();
        let existing = Streak::started(user, day("2026-08-01"));
        let transition = advance(Some(&existing), user, day("2026-08-02"));

        assert_eq!(transition.streak.current_streak, 2);
        assert_eq!(transition.streak.longest_streak, 2);
        assert!(transition.incremented);
    }

    #[test]
    fn gap_resets_current_but_keeps_longest() {
        let user = Uuid::new_v4();
        let existing = Streak {
            user_id: user,
            current_streak: 5,
            longest_streak: 5,
            last_active_date: day("2026-08-01"),
        };
        let transition = advance(Some(&existing), user, day("2026-08-04"));

        assert_eq!(transition.streak.current_streak, 1);
        assert_eq!(transition.streak.longest_streak, 5);
        assert!(transition.changed);
        assert!(!transition.incremented);
    }

    #[test]
    fn four_day_walkthrough_matches_expected_counts() {
        // Day 1: first completion. Same day again: no change. Day 2:
        // increment. Day 3 skipped. Day 4: reset to 1, longest stays 2.
        let user = Uuid::new_v4();

        let d1 = advance(None, user, day("2026-08-01"));
        assert_eq!(
            (d1.streak.current_streak, d1.streak.longest_streak),
            (1, 1)
        );

        let same_day = advance(Some(&d1.streak), user, day("2026-08-01"));
        assert!(!same_day.changed);

        let d2 = advance(Some(&same_day.streak), user, day("2026-08-02"));
        assert_eq!(
            (d2.streak.current_streak, d2.streak.longest_streak),
            (2, 2)
        );

        let d4 = advance(Some(&d2.streak), user, day("2026-08-04"));
        assert_eq!(
            (d4.streak.current_streak, d4.streak.longest_streak),
            (1, 2)
        );
    }

    #[test]
    fn week_starts_on_most_recent_sunday() {
        // 2026-08-07 is a Friday; 2026-08-02 the preceding Sunday.
        assert_eq!(start_of_week(day("2026-08-07")), day("2026-08-02"));
        assert_eq!(start_of_week(day("2026-08-02")), day("2026-08-02"));
        assert_eq!(start_of_week(day("2026-08-01")), day("2026-07-26"));
    }
}

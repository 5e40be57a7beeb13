use chrono::{Duration, Local, NaiveDate};
use rusqlite::{params, Connection};
use tasklane_core::db::open_db_in_memory;
use tasklane_core::{
    sqlite_stores, CreateTaskRequest, SqliteStreakStore, SqliteTaskStore, StreakStore, Task,
    TaskPatch, TaskService,
};
use uuid::Uuid;

type SqliteService<'conn> = TaskService<SqliteTaskStore<'conn>, SqliteStreakStore<'conn>>;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn service(conn: &Connection) -> SqliteService<'_> {
    let (tasks, streaks) = sqlite_stores(conn).unwrap();
    TaskService::new(tasks, streaks)
}

fn create(service: &SqliteService<'_>, user: Uuid, title: &str) -> Task {
    service
        .create_task(
            user,
            &CreateTaskRequest {
                title: title.to_string(),
                description: None,
                due_date: None,
                severity: "MEDIUM".to_string(),
            },
        )
        .unwrap()
}

fn complete(service: &SqliteService<'_>, user: Uuid, task: &Task) -> Task {
    service
        .update_task(
            user,
            task.id,
            &TaskPatch {
                is_completed: Some(true),
                ..TaskPatch::default()
            },
        )
        .unwrap()
}

fn reopen(service: &SqliteService<'_>, user: Uuid, task: &Task) -> Task {
    service
        .update_task(
            user,
            task.id,
            &TaskPatch {
                is_completed: Some(false),
                ..TaskPatch::default()
            },
        )
        .unwrap()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Rewrites the stored streak row to simulate history recorded on earlier
/// days.
fn set_streak(conn: &Connection, user: Uuid, current: u32, longest: u32, last_active: NaiveDate) {
    conn.execute(
        "INSERT INTO streaks (user_id, current_streak, longest_streak, last_active_date)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(user_id) DO UPDATE SET
             current_streak = excluded.current_streak,
             longest_streak = excluded.longest_streak,
             last_active_date = excluded.last_active_date;",
        params![
            user.to_string(),
            current,
            longest,
            last_active.format("%Y-%m-%d").to_string(),
        ],
    )
    .unwrap();
}

fn streak_counts(conn: &Connection, user: Uuid) -> (u32, u32, NaiveDate) {
    let (_, streaks) = sqlite_stores(conn).unwrap();
    let streak = streaks.get_streak(user).unwrap().expect("streak row expected");
    (
        streak.current_streak,
        streak.longest_streak,
        streak.last_active_date,
    )
}

fn badge_count(conn: &Connection, user: Uuid, name: &str) -> usize {
    let (_, streaks) = sqlite_stores(conn).unwrap();
    streaks
        .list_badges(user)
        .unwrap()
        .iter()
        .filter(|badge| badge.name == name)
        .count()
}

#[test]
fn first_completion_creates_streak_of_one_and_stamps_task() {
    let conn = setup();
    let service = service(&conn);
    let user = Uuid::new_v4();

    let task = create(&service, user, "start the run");
    let completed = complete(&service, user, &task);

    assert!(completed.is_completed);
    assert!(completed.completed_at.is_some());
    assert_eq!(streak_counts(&conn, user), (1, 1, today()));
}

#[test]
fn second_completion_same_day_does_not_double_count() {
    let conn = setup();
    let service = service(&conn);
    let user = Uuid::new_v4();

    let first = create(&service, user, "one");
    let second = create(&service, user, "two");
    complete(&service, user, &first);
    complete(&service, user, &second);

    assert_eq!(streak_counts(&conn, user), (1, 1, today()));
}

#[test]
fn completion_on_the_next_day_increments() {
    let conn = setup();
    let service = service(&conn);
    let user = Uuid::new_v4();

    set_streak(&conn, user, 1, 1, today() - Duration::days(1));
    let task = create(&service, user, "keep it going");
    complete(&service, user, &task);

    assert_eq!(streak_counts(&conn, user), (2, 2, today()));
}

#[test]
fn completion_after_a_gap_resets_current_and_keeps_longest() {
    let conn = setup();
    let service = service(&conn);
    let user = Uuid::new_v4();

    set_streak(&conn, user, 5, 5, today() - Duration::days(3));
    let task = create(&service, user, "back after a break");
    complete(&service, user, &task);

    assert_eq!(streak_counts(&conn, user), (1, 5, today()));
}

#[test]
fn streak_walkthrough_over_four_days() {
    let conn = setup();
    let service = service(&conn);
    let user = Uuid::new_v4();

    // Day 1: first completion, then a second one the same day.
    let t1 = create(&service, user, "t1");
    complete(&service, user, &t1);
    let t2 = create(&service, user, "t2");
    complete(&service, user, &t2);
    assert_eq!(streak_counts(&conn, user), (1, 1, today()));

    // Day 2 (simulated by aging the row one day).
    set_streak(&conn, user, 1, 1, today() - Duration::days(1));
    let t3 = create(&service, user, "t3");
    complete(&service, user, &t3);
    assert_eq!(streak_counts(&conn, user), (2, 2, today()));

    // Day 3 skipped; day 4 resets.
    set_streak(&conn, user, 2, 2, today() - Duration::days(2));
    let t4 = create(&service, user, "t4");
    complete(&service, user, &t4);
    assert_eq!(streak_counts(&conn, user), (1, 2, today()));
}

#[test]
fn reopening_a_task_never_touches_the_streak() {
    let conn = setup();
    let service = service(&conn);
    let user = Uuid::new_v4();

    let task = create(&service, user, "toggle me");
    complete(&service, user, &task);
    assert_eq!(streak_counts(&conn, user), (1, 1, today()));

    let reopened = reopen(&service, user, &task);
    assert!(!reopened.is_completed);
    assert!(reopened.completed_at.is_none());
    assert_eq!(streak_counts(&conn, user), (1, 1, today()));

    // Completing again the same day stays idempotent.
    complete(&service, user, &task);
    assert_eq!(streak_counts(&conn, user), (1, 1, today()));
}

#[test]
fn badge_awarded_when_streak_lands_exactly_on_threshold() {
    let conn = setup();
    let service = service(&conn);
    let user = Uuid::new_v4();

    set_streak(&conn, user, 2, 2, today() - Duration::days(1));
    let task = create(&service, user, "third day");
    complete(&service, user, &task);

    assert_eq!(streak_counts(&conn, user).0, 3);
    assert_eq!(badge_count(&conn, user, "3-Day Streak"), 1);
}

#[test]
fn no_badge_between_thresholds() {
    let conn = setup();
    let service = service(&conn);
    let user = Uuid::new_v4();

    set_streak(&conn, user, 3, 3, today() - Duration::days(1));
    let task = create(&service, user, "fourth day");
    complete(&service, user, &task);

    assert_eq!(streak_counts(&conn, user).0, 4);
    let (_, streaks) = sqlite_stores(&conn).unwrap();
    assert!(streaks.list_badges(user).unwrap().is_empty());
}

#[test]
fn regrowing_through_a_threshold_never_duplicates_the_badge() {
    let conn = setup();
    let service = service(&conn);
    let user = Uuid::new_v4();

    // First pass through 3 earns the badge.
    set_streak(&conn, user, 2, 2, today() - Duration::days(1));
    let first = create(&service, user, "first pass");
    complete(&service, user, &first);
    assert_eq!(badge_count(&conn, user, "3-Day Streak"), 1);

    // A gap resets the streak; regrow it back to 3.
    set_streak(&conn, user, 2, 3, today() - Duration::days(1));
    let second = create(&service, user, "second pass");
    complete(&service, user, &second);

    assert_eq!(streak_counts(&conn, user), (3, 3, today()));
    assert_eq!(badge_count(&conn, user, "3-Day Streak"), 1);
}

#[test]
fn week_warrior_at_seven_days() {
    let conn = setup();
    let service = service(&conn);
    let user = Uuid::new_v4();

    set_streak(&conn, user, 6, 6, today() - Duration::days(1));
    let task = create(&service, user, "a full week");
    complete(&service, user, &task);

    assert_eq!(badge_count(&conn, user, "Week Warrior"), 1);
    assert_eq!(badge_count(&conn, user, "3-Day Streak"), 0);
}

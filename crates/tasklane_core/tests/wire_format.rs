use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::json;
use tasklane_core::{
    CreateTaskRequest, Severity, Streak, Task, TaskMove, TaskPatch,
};
use uuid::Uuid;

fn sample_task() -> Task {
    let mut task = Task::new(
        Uuid::parse_str("00000000-0000-4000-8000-000000000001").unwrap(),
        "ship the release",
        Severity::High,
        2,
        Utc.with_ymd_and_hms(2026, 8, 1, 12, 30, 0).unwrap(),
    );
    task.id = Uuid::parse_str("00000000-0000-4000-8000-000000000002").unwrap();
    task
}

#[test]
fn task_serializes_with_camel_case_keys_and_uppercase_severity() {
    let value = serde_json::to_value(sample_task()).unwrap();

    assert_eq!(value["severity"], "HIGH");
    assert_eq!(value["isCompleted"], false);
    assert_eq!(
        value["userId"],
        "00000000-0000-4000-8000-000000000001"
    );
    assert!(value["completedAt"].is_null());
    assert!(value.get("is_completed").is_none());

    let created_at = value["createdAt"].as_str().unwrap();
    assert!(created_at.starts_with("2026-08-01T12:30:00"));
}

#[test]
fn task_round_trips_through_json() {
    let task = sample_task();
    let encoded = serde_json::to_string(&task).unwrap();
    let decoded: Task = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, task);
}

#[test]
fn create_request_parses_camel_case_payload() {
    let request: CreateTaskRequest = serde_json::from_value(json!({
        "title": "file taxes",
        "dueDate": "2026-08-20T00:00:00Z",
        "severity": "high"
    }))
    .unwrap();

    assert_eq!(request.title, "file taxes");
    assert_eq!(request.severity, "high");
    assert!(request.description.is_none());
    assert!(request.due_date.is_some());
}

#[test]
fn patch_defaults_to_no_changes() {
    let patch: TaskPatch = serde_json::from_value(json!({})).unwrap();
    assert_eq!(patch, TaskPatch::default());

    let toggle: TaskPatch = serde_json::from_value(json!({ "isCompleted": true })).unwrap();
    assert_eq!(toggle.is_completed, Some(true));
    assert!(toggle.title.is_none());
}

#[test]
fn task_move_parses_reorder_entry_shape() {
    let entry: TaskMove = serde_json::from_value(json!({
        "id": "00000000-0000-4000-8000-000000000003",
        "position": 0,
        "severity": "MEDIUM"
    }))
    .unwrap();

    assert_eq!(entry.position, 0);
    assert_eq!(entry.severity, Some(Severity::Medium));

    let same_lane: TaskMove = serde_json::from_value(json!({
        "id": "00000000-0000-4000-8000-000000000003",
        "position": 1
    }))
    .unwrap();
    assert_eq!(same_lane.severity, None);
}

#[test]
fn streak_serializes_calendar_date_without_time() {
    let streak = Streak {
        user_id: Uuid::parse_str("00000000-0000-4000-8000-000000000001").unwrap(),
        current_streak: 4,
        longest_streak: 9,
        last_active_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
    };

    let value = serde_json::to_value(streak).unwrap();
    assert_eq!(value["currentStreak"], 4);
    assert_eq!(value["longestStreak"], 9);
    assert_eq!(value["lastActiveDate"], "2026-08-01");
}

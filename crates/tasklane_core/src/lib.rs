//! Core domain logic for TaskLane.
//! This crate is the single source of truth for lane-ordering and streak
//! invariants.

pub mod db;
pub mod engine;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod suggest;

pub use engine::badges::{badge_for_streak, badge_image_url, BadgeSpec, STREAK_BADGES};
pub use engine::lane::{next_position, validate_move_set, LaneError};
pub use engine::streak::{advance, start_of_week, StreakTransition};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::streak::{Badge, Streak};
pub use model::task::{Severity, Task, TaskId, TaskMove, TaskValidationError, UserId};
pub use repo::streak_store::{SqliteStreakStore, StreakStore};
pub use repo::task_store::{
    SqliteTaskStore, StoreError, StoreResult, TaskListQuery, TaskStore,
};
pub use repo::sqlite_stores;
pub use service::task_service::{
    CompletionStats, CreateTaskRequest, TaskPatch, TaskService, TaskServiceError, UserStatsReport,
};
pub use suggest::{PrioritySuggestion, RankedTask, SuggestError, SuggestionProvider};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

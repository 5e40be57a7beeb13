//! Task use-case service.
//!
//! # Responsibility
//! - Expose create/update/delete/reorder/stats entry points to the API
//!   layer.
//! - Run the streak machine and badge awarding on completion transitions.
//!
//! # Invariants
//! - Every operation is scoped to the calling user; a row owned by someone
//!   else is indistinguishable from a missing one.
//! - A completion writes its task and streak in one store transaction;
//!   badge awards follow best-effort and never unwind it.
//! - Reopening a task clears the completion stamp only; the streak machine
//!   never runs backwards.

use crate::engine::badges::award_for_streak;
use crate::engine::lane;
use crate::engine::lane::LaneError;
use crate::engine::streak::{advance, local_day_start, start_of_week, today_local};
use crate::model::streak::{Badge, Streak};
use crate::model::task::{
    Severity, Task, TaskId, TaskMove, TaskValidationError, UserId,
};
use crate::repo::streak_store::StreakStore;
use crate::repo::task_store::{StoreError, TaskListQuery, TaskStore};
use crate::suggest::{PrioritySuggestion, SuggestionProvider};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for task use-cases.
#[derive(Debug)]
pub enum TaskServiceError {
    /// Field-level input rejection; nothing was written.
    Validation(TaskValidationError),
    /// Severity value is not one of the three lanes.
    UnknownSeverity(String),
    /// Reorder move set is malformed; nothing was written.
    InvalidMoveSet(LaneError),
    /// Target task does not exist for this user.
    TaskNotFound(TaskId),
    /// Persistence-layer failure; the whole operation is safe to retry.
    Store(StoreError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::UnknownSeverity(value) => {
                write!(f, "unknown severity `{value}`; expected LOW|MEDIUM|HIGH")
            }
            Self::InvalidMoveSet(err) => write!(f, "{err}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent task state: {details}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::InvalidMoveSet(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for TaskServiceError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for TaskServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => Self::TaskNotFound(id),
            StoreError::Validation(err) => Self::Validation(err),
            other => Self::Store(other),
        }
    }
}

impl From<LaneError> for TaskServiceError {
    fn from(value: LaneError) -> Self {
        match value {
            // A foreign id is reported as a plain miss so existence of other
            // users' tasks never leaks.
            LaneError::UnknownTask(id) => Self::TaskNotFound(id),
            other => Self::InvalidMoveSet(other),
        }
    }
}

/// Input for task creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    /// Task label; must be non-empty after trimming.
    pub title: String,
    /// Optional free-form body.
    #[serde(default)]
    pub description: Option<String>,
    /// Optional deadline.
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Lane name, case-insensitive.
    pub severity: String,
}

/// Partial update for one task. `None` fields are left unchanged; the
/// completion stamp is managed by the service, never by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Lane name, case-insensitive. Changing it re-appends the task at the
    /// end of the destination lane.
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub is_completed: Option<bool>,
}

/// Aggregate completion figures for one user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionStats {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    /// Percent of tasks completed; 0.0 when the user has no tasks.
    pub completion_rate: f64,
    /// Completions since the most recent local-midnight Sunday.
    pub tasks_this_week: u64,
}

/// Stats read composition: streak, badges and completion aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatsReport {
    /// `None` until the first qualifying completion creates the record.
    pub streak: Option<Streak>,
    pub badges: Vec<Badge>,
    pub stats: CompletionStats,
}

/// Use-case facade over the task and streak stores.
pub struct TaskService<T: TaskStore, S: StreakStore> {
    tasks: T,
    streaks: S,
}

impl<T: TaskStore, S: StreakStore> TaskService<T, S> {
    /// Creates a service using the provided store implementations.
    pub fn new(tasks: T, streaks: S) -> Self {
        Self { tasks, streaks }
    }

    /// Creates one task at the end of its severity lane.
    pub fn create_task(
        &self,
        user_id: UserId,
        request: &CreateTaskRequest,
    ) -> Result<Task, TaskServiceError> {
        let severity = parse_severity(&request.severity)?;
        let position = lane::next_position(self.tasks.max_position(user_id, severity)?);

        let mut task = Task::new(user_id, request.title.trim(), severity, position, Utc::now());
        task.description = request.description.clone();
        task.due_date = request.due_date;
        task.validate()?;

        self.tasks.create_task(&task)?;
        info!(
            "event=task_create module=service status=ok user_id={user_id} task_id={} severity={severity} position={position}",
            task.id
        );
        self.read_back(user_id, task.id)
    }

    /// Gets one task by id.
    pub fn get_task(&self, user_id: UserId, task_id: TaskId) -> Result<Task, TaskServiceError> {
        self.tasks
            .get_task(user_id, task_id)?
            .ok_or(TaskServiceError::TaskNotFound(task_id))
    }

    /// Lists tasks with optional completion/severity filters, ordered by
    /// `position ASC, created_at DESC`.
    pub fn list_tasks(
        &self,
        user_id: UserId,
        query: &TaskListQuery,
    ) -> Result<Vec<Task>, TaskServiceError> {
        Ok(self.tasks.list_tasks(user_id, query)?)
    }

    /// Applies a partial update; completion transitions drive the streak
    /// machine and badge awarding.
    pub fn update_task(
        &self,
        user_id: UserId,
        task_id: TaskId,
        patch: &TaskPatch,
    ) -> Result<Task, TaskServiceError> {
        let mut task = self.get_task(user_id, task_id)?;

        if let Some(title) = &patch.title {
            task.title = title.trim().to_string();
        }
        if let Some(description) = &patch.description {
            task.description = Some(description.clone());
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = Some(due_date);
        }
        if let Some(severity_text) = &patch.severity {
            let severity = parse_severity(severity_text)?;
            if severity != task.severity {
                task.severity = severity;
                // Re-append so the destination lane stays collision-free.
                task.position = lane::next_position(self.tasks.max_position(user_id, severity)?);
            }
        }

        match patch.is_completed {
            Some(true) if !task.is_completed => return self.complete_task(user_id, task),
            Some(false) if task.is_completed => task.clear_completion(),
            _ => {}
        }

        task.validate()?;
        self.tasks.update_task(&task)?;
        self.read_back(user_id, task_id)
    }

    /// Deletes one task. Remaining lane positions are not renumbered; gaps
    /// are legal and appends still go after the old maximum.
    pub fn delete_task(&self, user_id: UserId, task_id: TaskId) -> Result<(), TaskServiceError> {
        self.tasks.delete_task(user_id, task_id)?;
        info!("event=task_delete module=service status=ok user_id={user_id} task_id={task_id}");
        Ok(())
    }

    /// Persists a client-computed reorder after validating it against the
    /// user's current lanes. All-or-nothing.
    pub fn reorder_tasks(
        &self,
        user_id: UserId,
        moves: &[TaskMove],
    ) -> Result<(), TaskServiceError> {
        let open_tasks = self.tasks.list_tasks(
            user_id,
            &TaskListQuery {
                completed: Some(false),
                ..TaskListQuery::default()
            },
        )?;
        lane::validate_move_set(&open_tasks, moves)?;

        self.tasks.apply_reorder(user_id, moves)?;
        info!(
            "event=task_reorder module=service status=ok user_id={user_id} moves={}",
            moves.len()
        );
        Ok(())
    }

    /// Returns streak, badges and completion aggregates for one user.
    ///
    /// The weekly figure shares the calendar truncation of the streak
    /// machine: week start is the most recent Sunday at local midnight.
    pub fn user_stats(&self, user_id: UserId) -> Result<UserStatsReport, TaskServiceError> {
        let streak = self.streaks.get_streak(user_id)?;
        let badges = self.streaks.list_badges(user_id)?;

        let total_tasks = self.tasks.count_tasks(user_id)?;
        let completed_tasks = self.tasks.count_completed(user_id)?;
        let completion_rate = if total_tasks > 0 {
            completed_tasks as f64 / total_tasks as f64 * 100.0
        } else {
            0.0
        };

        let week_start = local_day_start(start_of_week(today_local()));
        let tasks_this_week = self.tasks.count_completed_since(user_id, week_start)?;

        Ok(UserStatsReport {
            streak,
            badges,
            stats: CompletionStats {
                total_tasks,
                completed_tasks,
                completion_rate,
                tasks_this_week,
            },
        })
    }

    /// Collects the user's open tasks and joins the provider's ranked picks
    /// back to full records. Provider failure degrades to an empty list.
    pub fn suggest_priorities(
        &self,
        user_id: UserId,
        provider: &dyn SuggestionProvider,
    ) -> Result<Vec<PrioritySuggestion>, TaskServiceError> {
        let open_tasks = self.tasks.list_tasks(
            user_id,
            &TaskListQuery {
                completed: Some(false),
                ..TaskListQuery::default()
            },
        )?;
        if open_tasks.is_empty() {
            return Ok(Vec::new());
        }

        let ranked = match provider.rank(&open_tasks) {
            Ok(ranked) => ranked,
            Err(err) => {
                warn!(
                    "event=suggest module=service status=error user_id={user_id} provider={} error={err}",
                    provider.provider_id()
                );
                return Ok(Vec::new());
            }
        };

        let by_id: HashMap<TaskId, &Task> =
            open_tasks.iter().map(|task| (task.id, task)).collect();
        Ok(ranked
            .into_iter()
            .filter_map(|pick| {
                by_id.get(&pick.id).map(|task| PrioritySuggestion {
                    task: (*task).clone(),
                    reason: pick.reason,
                })
            })
            .collect())
    }

    fn complete_task(&self, user_id: UserId, mut task: Task) -> Result<Task, TaskServiceError> {
        let now = Utc::now();
        task.mark_completed(now);
        task.validate()?;

        let existing = self.streaks.get_streak(user_id)?;
        let transition = advance(existing.as_ref(), user_id, today_local());
        let streak_update = transition.changed.then_some(&transition.streak);

        self.tasks.commit_completion(&task, streak_update)?;
        info!(
            "event=task_complete module=service status=ok user_id={user_id} task_id={} streak={}",
            task.id, transition.streak.current_streak
        );

        if transition.incremented {
            award_for_streak(
                &self.streaks,
                user_id,
                transition.streak.current_streak,
                now,
            );
        }

        self.read_back(user_id, task.id)
    }

    fn read_back(&self, user_id: UserId, task_id: TaskId) -> Result<Task, TaskServiceError> {
        self.tasks
            .get_task(user_id, task_id)?
            .ok_or(TaskServiceError::InconsistentState(
                "written task not found in read-back",
            ))
    }
}

fn parse_severity(value: &str) -> Result<Severity, TaskServiceError> {
    Severity::parse(value).ok_or_else(|| TaskServiceError::UnknownSeverity(value.to_string()))
}

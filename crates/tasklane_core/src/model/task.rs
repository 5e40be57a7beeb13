//! Task domain model.
//!
//! # Responsibility
//! - Define the task record and its severity lanes.
//! - Provide lifecycle helpers for the completion stamp.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `completed_at` is set exactly when `is_completed` is true.
//! - Within one `(user_id, severity)` lane, ascending `position` is the
//!   authoritative display order; positions may have gaps after deletes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for one task.
pub type TaskId = Uuid;

/// Stable identifier for the owning user, issued by the external
/// authenticator.
pub type UserId = Uuid;

/// Severity lane of a task.
///
/// Serialized as the uppercase lane names used on the wire; input parsing is
/// case-insensitive via [`Severity::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// All lanes in display order.
    pub const ALL: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];

    /// Canonical uppercase lane name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    /// Parses a lane name, ignoring case and surrounding whitespace.
    pub fn parse(value: &str) -> Option<Severity> {
        match value.trim().to_ascii_uppercase().as_str() {
            "LOW" => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            _ => None,
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-level validation failures for task writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Title is empty after trimming.
    EmptyTitle,
    /// Position rank must be non-negative.
    NegativePosition(i64),
    /// `completed_at` and `is_completed` disagree.
    CompletionStampMismatch,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "task title cannot be empty"),
            Self::NegativePosition(value) => {
                write!(f, "task position cannot be negative, got {value}")
            }
            Self::CompletionStampMismatch => {
                write!(f, "completed_at must be set exactly when is_completed is true")
            }
        }
    }
}

impl Error for TaskValidationError {}

/// One entry of a reorder move set: the client-computed target slot for one
/// task, with an optional destination lane for cross-lane drags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMove {
    /// Task being placed.
    pub id: TaskId,
    /// Target rank within the destination lane.
    pub position: i64,
    /// Destination lane. `None` keeps the task's current lane.
    pub severity: Option<Severity>,
}

/// Canonical task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Stable task id.
    pub id: TaskId,
    /// Owning user.
    pub user_id: UserId,
    /// Short label, non-empty after trimming.
    pub title: String,
    /// Optional free-form body.
    pub description: Option<String>,
    /// Optional deadline.
    pub due_date: Option<DateTime<Utc>>,
    /// Lane this task belongs to.
    pub severity: Severity,
    /// Rank within the lane.
    pub position: i64,
    /// Completion flag; completed tasks leave their lane's display order.
    pub is_completed: bool,
    /// Set exactly when `is_completed` is true.
    pub completed_at: Option<DateTime<Utc>>,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Creates an open task at the given lane slot with a generated id.
    pub fn new(
        user_id: UserId,
        title: impl Into<String>,
        severity: Severity,
        position: i64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            description: None,
            due_date: None,
            severity,
            position,
            is_completed: false,
            completed_at: None,
            created_at,
        }
    }

    /// Checks field invariants. Write paths run this before SQL.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle);
        }
        if self.position < 0 {
            return Err(TaskValidationError::NegativePosition(self.position));
        }
        if self.is_completed != self.completed_at.is_some() {
            return Err(TaskValidationError::CompletionStampMismatch);
        }
        Ok(())
    }

    /// Stamps this task as completed at the given instant.
    pub fn mark_completed(&mut self, at: DateTime<Utc>) {
        self.is_completed = true;
        self.completed_at = Some(at);
    }

    /// Reopens this task. The streak is never adjusted by reopening.
    pub fn clear_completion(&mut self) {
        self.is_completed = false;
        self.completed_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::{Severity, Task, TaskValidationError};
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn severity_parse_ignores_case_and_whitespace() {
        assert_eq!(Severity::parse("high"), Some(Severity::High));
        assert_eq!(Severity::parse(" Medium "), Some(Severity::Medium));
        assert_eq!(Severity::parse("LOW"), Some(Severity::Low));
        assert_eq!(Severity::parse("urgent"), None);
    }

    #[test]
    fn validate_rejects_blank_title() {
        let task = Task::new(Uuid::new_v4(), "   ", Severity::Low, 0, Utc::now());
        assert_eq!(task.validate(), Err(TaskValidationError::EmptyTitle));
    }

    #[test]
    fn validate_rejects_mismatched_completion_stamp() {
        let mut task = Task::new(Uuid::new_v4(), "write report", Severity::High, 0, Utc::now());
        task.is_completed = true;
        assert_eq!(
            task.validate(),
            Err(TaskValidationError::CompletionStampMismatch)
        );

        task.mark_completed(Utc::now());
        assert_eq!(task.validate(), Ok(()));

        task.clear_completion();
        assert_eq!(task.validate(), Ok(()));
    }
}

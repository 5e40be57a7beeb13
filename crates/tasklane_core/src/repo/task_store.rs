//! Task store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide user-scoped CRUD over the `tasks` table.
//! - Make the multi-row writes (reorder sets, completion pairs) atomic.
//!
//! # Invariants
//! - Write paths call `Task::validate()` before SQL mutations.
//! - `apply_reorder` and `commit_completion` either apply fully or leave
//!   every row untouched.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::streak::Streak;
use crate::model::task::{Severity, Task, TaskId, TaskMove, TaskValidationError, UserId};
use crate::repo::{ensure_schema_current, ensure_table};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    uuid,
    user_id,
    title,
    description,
    due_date,
    severity,
    position,
    is_completed,
    completed_at,
    created_at
FROM tasks";

const TASK_COLUMNS: &[&str] = &[
    "uuid",
    "user_id",
    "title",
    "description",
    "due_date",
    "severity",
    "position",
    "is_completed",
    "completed_at",
    "created_at",
];

pub type StoreResult<T> = Result<T, StoreError>;

/// Store error shared by all persistence operations.
#[derive(Debug)]
pub enum StoreError {
    /// Field validation failed before any SQL ran.
    Validation(TaskValidationError),
    /// Infrastructure failure; the whole operation is safe to retry.
    Db(DbError),
    /// Row does not exist or belongs to another user.
    NotFound(TaskId),
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "store requires table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "store requires column `{column}` in table `{table}`")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for StoreError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing one user's tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskListQuery {
    /// Filter on completion state.
    pub completed: Option<bool>,
    /// Filter on one severity lane.
    pub severity: Option<Severity>,
}

/// Keyed storage contract for tasks and the grouped writes that keep
/// derived state consistent with them.
pub trait TaskStore {
    /// Persists one new task.
    fn create_task(&self, task: &Task) -> StoreResult<TaskId>;
    /// Loads one task scoped to its owner.
    fn get_task(&self, user_id: UserId, task_id: TaskId) -> StoreResult<Option<Task>>;
    /// Lists tasks ordered by `position ASC, created_at DESC`.
    fn list_tasks(&self, user_id: UserId, query: &TaskListQuery) -> StoreResult<Vec<Task>>;
    /// Rewrites one task row scoped to its owner.
    fn update_task(&self, task: &Task) -> StoreResult<()>;
    /// Hard-deletes one task; surviving lane positions keep their gaps.
    fn delete_task(&self, user_id: UserId, task_id: TaskId) -> StoreResult<()>;
    /// Highest position in one lane of incomplete tasks, `None` when empty.
    fn max_position(&self, user_id: UserId, severity: Severity) -> StoreResult<Option<i64>>;
    /// Applies a whole reorder move set in one transaction. Any row miss
    /// (foreign or vanished id) aborts with `NotFound` and writes nothing.
    fn apply_reorder(&self, user_id: UserId, moves: &[TaskMove]) -> StoreResult<()>;
    /// Writes a completed task together with its streak update in one
    /// transaction, so neither is ever observable without the other.
    fn commit_completion(&self, task: &Task, streak: Option<&Streak>) -> StoreResult<()>;
    /// Number of tasks owned by the user.
    fn count_tasks(&self, user_id: UserId) -> StoreResult<u64>;
    /// Number of completed tasks owned by the user.
    fn count_completed(&self, user_id: UserId) -> StoreResult<u64>;
    /// Number of tasks completed at or after `cutoff`.
    fn count_completed_since(&self, user_id: UserId, cutoff: DateTime<Utc>) -> StoreResult<u64>;
}

/// SQLite-backed task store.
pub struct SqliteTaskStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskStore<'conn> {
    /// Constructs a store from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_schema_current(conn)?;
        ensure_table(conn, "tasks", TASK_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl TaskStore for SqliteTaskStore<'_> {
    fn create_task(&self, task: &Task) -> StoreResult<TaskId> {
        task.validate()?;

        self.conn.execute(
            "INSERT INTO tasks (
                uuid,
                user_id,
                title,
                description,
                due_date,
                severity,
                position,
                is_completed,
                completed_at,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                task.id.to_string(),
                task.user_id.to_string(),
                task.title.as_str(),
                task.description.as_deref(),
                task.due_date.map(|instant| instant.timestamp_millis()),
                task.severity.as_str(),
                task.position,
                bool_to_int(task.is_completed),
                task.completed_at.map(|instant| instant.timestamp_millis()),
                task.created_at.timestamp_millis(),
            ],
        )?;

        Ok(task.id)
    }

    fn get_task(&self, user_id: UserId, task_id: TaskId) -> StoreResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE uuid = ?1 AND user_id = ?2;"))?;

        let mut rows = stmt.query(params![task_id.to_string(), user_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }

        Ok(None)
    }

    fn list_tasks(&self, user_id: UserId, query: &TaskListQuery) -> StoreResult<Vec<Task>> {
        let mut sql = format!("{TASK_SELECT_SQL} WHERE user_id = ?");
        let mut bind_values: Vec<Value> = vec![Value::Text(user_id.to_string())];

        if let Some(completed) = query.completed {
            sql.push_str(" AND is_completed = ?");
            bind_values.push(Value::Integer(bool_to_int(completed)));
        }

        if let Some(severity) = query.severity {
            sql.push_str(" AND severity = ?");
            bind_values.push(Value::Text(severity.as_str().to_string()));
        }

        sql.push_str(" ORDER BY position ASC, created_at DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();

        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        Ok(tasks)
    }

    fn update_task(&self, task: &Task) -> StoreResult<()> {
        task.validate()?;

        let changed = run_task_update(self.conn, task)?;
        if changed == 0 {
            return Err(StoreError::NotFound(task.id));
        }

        Ok(())
    }

    fn delete_task(&self, user_id: UserId, task_id: TaskId) -> StoreResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM tasks WHERE uuid = ?1 AND user_id = ?2;",
            params![task_id.to_string(), user_id.to_string()],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(task_id));
        }

        Ok(())
    }

    fn max_position(&self, user_id: UserId, severity: Severity) -> StoreResult<Option<i64>> {
        let max = self.conn.query_row(
            "SELECT MAX(position)
             FROM tasks
             WHERE user_id = ?1
               AND severity = ?2
               AND is_completed = 0;",
            params![user_id.to_string(), severity.as_str()],
            |row| row.get::<_, Option<i64>>(0),
        )?;

        Ok(max)
    }

    fn apply_reorder(&self, user_id: UserId, moves: &[TaskMove]) -> StoreResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        for entry in moves {
            let changed = match entry.severity {
                Some(severity) => tx.execute(
                    "UPDATE tasks
                     SET position = ?3,
                         severity = ?4
                     WHERE uuid = ?1
                       AND user_id = ?2;",
                    params![
                        entry.id.to_string(),
                        user_id.to_string(),
                        entry.position,
                        severity.as_str(),
                    ],
                )?,
                None => tx.execute(
                    "UPDATE tasks
                     SET position = ?3
                     WHERE uuid = ?1
                       AND user_id = ?2;",
                    params![entry.id.to_string(), user_id.to_string(), entry.position],
                )?,
            };

            // Dropping the transaction here rolls back every prior update.
            if changed == 0 {
                return Err(StoreError::NotFound(entry.id));
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn commit_completion(&self, task: &Task, streak: Option<&Streak>) -> StoreResult<()> {
        task.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let changed = run_task_update(&tx, task)?;
        if changed == 0 {
            return Err(StoreError::NotFound(task.id));
        }

        if let Some(streak) = streak {
            tx.execute(
                "INSERT INTO streaks (user_id, current_streak, longest_streak, last_active_date)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(user_id) DO UPDATE SET
                     current_streak = excluded.current_streak,
                     longest_streak = excluded.longest_streak,
                     last_active_date = excluded.last_active_date;",
                params![
                    streak.user_id.to_string(),
                    streak.current_streak,
                    streak.longest_streak,
                    streak.last_active_date.format("%Y-%m-%d").to_string(),
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn count_tasks(&self, user_id: UserId) -> StoreResult<u64> {
        count(
            self.conn,
            "SELECT COUNT(*) FROM tasks WHERE user_id = ?1;",
            params![user_id.to_string()],
        )
    }

    fn count_completed(&self, user_id: UserId) -> StoreResult<u64> {
        count(
            self.conn,
            "SELECT COUNT(*) FROM tasks WHERE user_id = ?1 AND is_completed = 1;",
            params![user_id.to_string()],
        )
    }

    fn count_completed_since(&self, user_id: UserId, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        count(
            self.conn,
            "SELECT COUNT(*)
             FROM tasks
             WHERE user_id = ?1
               AND is_completed = 1
               AND completed_at >= ?2;",
            params![user_id.to_string(), cutoff.timestamp_millis()],
        )
    }
}

fn run_task_update(conn: &Connection, task: &Task) -> StoreResult<usize> {
    let changed = conn.execute(
        "UPDATE tasks
         SET
            title = ?3,
            description = ?4,
            due_date = ?5,
            severity = ?6,
            position = ?7,
            is_completed = ?8,
            completed_at = ?9
         WHERE uuid = ?1
           AND user_id = ?2;",
        params![
            task.id.to_string(),
            task.user_id.to_string(),
            task.title.as_str(),
            task.description.as_deref(),
            task.due_date.map(|instant| instant.timestamp_millis()),
            task.severity.as_str(),
            task.position,
            bool_to_int(task.is_completed),
            task.completed_at.map(|instant| instant.timestamp_millis()),
        ],
    )?;

    Ok(changed)
}

fn parse_task_row(row: &Row<'_>) -> StoreResult<Task> {
    let id = parse_uuid(row.get::<_, String>("uuid")?, "tasks.uuid")?;
    let user_id = parse_uuid(row.get::<_, String>("user_id")?, "tasks.user_id")?;

    let severity_text: String = row.get("severity")?;
    let severity = Severity::parse(&severity_text).ok_or_else(|| {
        StoreError::InvalidData(format!(
            "invalid severity `{severity_text}` in tasks.severity"
        ))
    })?;

    let is_completed = match row.get::<_, i64>("is_completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(StoreError::InvalidData(format!(
                "invalid is_completed value `{other}` in tasks.is_completed"
            )));
        }
    };

    let task = Task {
        id,
        user_id,
        title: row.get("title")?,
        description: row.get("description")?,
        due_date: parse_optional_ms(row.get("due_date")?, "tasks.due_date")?,
        severity,
        position: row.get("position")?,
        is_completed,
        completed_at: parse_optional_ms(row.get("completed_at")?, "tasks.completed_at")?,
        created_at: parse_ms(row.get("created_at")?, "tasks.created_at")?,
    };
    task.validate()?;
    Ok(task)
}

fn count(conn: &Connection, sql: &str, bind: impl rusqlite::Params) -> StoreResult<u64> {
    let value: i64 = conn.query_row(sql, bind, |row| row.get(0))?;
    u64::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("negative count `{value}` from store")))
}

pub(crate) fn parse_uuid(value: String, column: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(&value)
        .map_err(|_| StoreError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn parse_ms(value: i64, column: &str) -> StoreResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(value)
        .single()
        .ok_or_else(|| StoreError::InvalidData(format!("invalid timestamp `{value}` in {column}")))
}

pub(crate) fn parse_optional_ms(
    value: Option<i64>,
    column: &str,
) -> StoreResult<Option<DateTime<Utc>>> {
    value.map(|ms| parse_ms(ms, column)).transpose()
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

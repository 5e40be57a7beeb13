//! Lane-ordering rules.
//!
//! # Responsibility
//! - Compute append positions for task creation.
//! - Validate client-computed reorder move sets before they are persisted.
//!
//! # Invariants
//! - A lane is the set of *incomplete* tasks sharing one severity.
//! - A valid move set leaves every touched lane with the dense position
//!   sequence `0..n-1` and alters nothing outside the set.
//!
//! The engine does not recompute the order itself: the drag-and-drop client
//! already knows the final arrangement. Its job is to turn that implicit
//! trust into an enforced invariant by rejecting any move set whose
//! persistence would corrupt a lane.

use crate::model::task::{Severity, Task, TaskId, TaskMove};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rejections for malformed or foreign reorder move sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneError {
    /// The move set contains no entries.
    EmptyMoveSet,
    /// A move references a task that is not among the user's open tasks.
    UnknownTask(TaskId),
    /// The same task appears in two moves.
    DuplicateTask(TaskId),
    /// The set touches more lanes than one drag gesture can (source and
    /// destination).
    TooManyLanes(usize),
    /// Two moves claim the same slot in one lane.
    DuplicatePosition { severity: Severity, position: i64 },
    /// A lane's supplied positions are not exactly `0..n-1`.
    NonDensePositions { severity: Severity },
    /// An open task in a touched lane was left out of the move set; keeping
    /// its old position could collide with the new sequence.
    IncompleteLane { severity: Severity, missing: TaskId },
}

impl Display for LaneError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyMoveSet => write!(f, "reorder move set is empty"),
            Self::UnknownTask(id) => write!(f, "move references unknown open task: {id}"),
            Self::DuplicateTask(id) => write!(f, "task appears twice in move set: {id}"),
            Self::TooManyLanes(count) => {
                write!(f, "move set touches {count} lanes, at most 2 allowed")
            }
            Self::DuplicatePosition { severity, position } => {
                write!(f, "duplicate position {position} in lane {severity}")
            }
            Self::NonDensePositions { severity } => {
                write!(f, "positions in lane {severity} are not a dense 0..n-1 sequence")
            }
            Self::IncompleteLane { severity, missing } => {
                write!(f, "lane {severity} is missing an entry for task {missing}")
            }
        }
    }
}

impl Error for LaneError {}

/// Returns the append slot for a lane given its current maximum position.
///
/// An empty lane is treated as max = -1, so the first task gets position 0.
pub fn next_position(current_max: Option<i64>) -> i64 {
    current_max.map_or(0, |max| max + 1)
}

/// Validates one reorder move set against the user's current open tasks.
///
/// `open_tasks` is the complete set of the user's incomplete tasks; lane
/// membership before the move is derived from it. The check rejects the
/// whole set on the first violation so nothing partial is ever persisted.
pub fn validate_move_set(open_tasks: &[Task], moves: &[TaskMove]) -> Result<(), LaneError> {
    if moves.is_empty() {
        return Err(LaneError::EmptyMoveSet);
    }

    let by_id: HashMap<TaskId, &Task> = open_tasks.iter().map(|task| (task.id, task)).collect();

    let mut moved: HashMap<TaskId, Severity> = HashMap::new();
    let mut lane_positions: HashMap<Severity, Vec<i64>> = HashMap::new();
    let mut touched: HashSet<Severity> = HashSet::new();

    for entry in moves {
        let task = by_id
            .get(&entry.id)
            .ok_or(LaneError::UnknownTask(entry.id))?;
        let destination = entry.severity.unwrap_or(task.severity);
        if moved.insert(entry.id, destination).is_some() {
            return Err(LaneError::DuplicateTask(entry.id));
        }
        lane_positions.entry(destination).or_default().push(entry.position);
        touched.insert(destination);
        touched.insert(task.severity);
    }

    if touched.len() > 2 {
        return Err(LaneError::TooManyLanes(touched.len()));
    }

    for (severity, positions) in &mut lane_positions {
        positions.sort_unstable();
        for (index, position) in positions.iter().enumerate() {
            if index > 0 && positions[index - 1] == *position {
                return Err(LaneError::DuplicatePosition {
                    severity: *severity,
                    position: *position,
                });
            }
            if *position != index as i64 {
                return Err(LaneError::NonDensePositions {
                    severity: *severity,
                });
            }
        }
    }

    // Any open task whose post-move lane is touched must itself be in the
    // set, otherwise its stale position could collide with the new sequence.
    for task in open_tasks {
        if moved.contains_key(&task.id) {
            continue;
        }
        if touched.contains(&task.severity) {
            return Err(LaneError::IncompleteLane {
                severity: task.severity,
                missing: task.id,
            });
        }
    }

    Ok(())
}

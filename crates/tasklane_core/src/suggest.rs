//! Priority-suggestion provider seam.
//!
//! # Responsibility
//! - Define the adapter contract an external ranking backend implements.
//! - Keep the core oblivious to how ranking happens: it only supplies open
//!   tasks and accepts a ranked subset back.

use crate::model::task::{Task, TaskId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failures reported by a ranking backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestError {
    /// Backend unreachable or not configured.
    Unavailable(String),
    /// Backend answered with something the adapter could not interpret.
    InvalidResponse(String),
}

impl Display for SuggestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "suggestion backend unavailable: {message}"),
            Self::InvalidResponse(message) => {
                write!(f, "invalid suggestion response: {message}")
            }
        }
    }
}

impl Error for SuggestError {}

/// One ranked pick returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedTask {
    /// Id of one of the supplied open tasks.
    pub id: TaskId,
    /// Short rationale for prioritizing it.
    pub reason: String,
}

/// A suggestion joined back to its full task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritySuggestion {
    /// The suggested task.
    #[serde(flatten)]
    pub task: Task,
    /// Provider's rationale.
    pub reason: String,
}

/// Adapter contract for opaque external ranking backends.
pub trait SuggestionProvider {
    /// Stable identifier used in diagnostics.
    fn provider_id(&self) -> &str;
    /// Ranks a subset of the supplied open tasks, most urgent first.
    /// Returned ids that match none of the inputs are ignored by the caller.
    fn rank(&self, open_tasks: &[Task]) -> Result<Vec<RankedTask>, SuggestError>;
}

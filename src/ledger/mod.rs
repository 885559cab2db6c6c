//! The points ledger.
//!
//! Each group owns a point pool and a score. Creating a task debits the pool
//! by the task's value, completing it moves the value into the score, and
//! deleting an unfinished task refunds it. For every group, at every moment
//! between ledger transactions:
//!
//! ```text
//! pool + Σ points_value(active tasks) == pool after the last grant
//! ```
//!
//! [`rules`] decides every transition from a locked snapshot. Storage
//! backends implement [`LedgerRepository`] by locking the group's pool record,
//! loading the snapshot, applying the rule and persisting the result in one
//! transaction.
//!
//! | Backend | Serialization |
//! |---------|---------------|
//! | [`InMemoryLedger`] | per-group `tokio::sync::Mutex` |
//! | `sqlite::SqliteLedgerRepository` | write-intent statement first, engine write lock |
//! | `postgres::PostgresLedgerRepository` | `SELECT ... FOR UPDATE` on group, then task |

mod memory;
mod repository;
pub mod rules;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ChoreError;

pub use memory::InMemoryLedger;
pub use repository::{GroupRepository, LedgerRepository};

/// An authenticated user acting inside their group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub user_id: i64,
    pub group_id: i64,
    pub username: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolBalance {
    pub points: i64,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub creator_user_id: i64,
    pub points: i64,
    pub points_score: i64,
    pub meeting_time: Option<String>,
}

impl Group {
    pub fn balance(&self) -> PoolBalance {
        PoolBalance {
            points: self.points,
            score: self.points_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub group_id: i64,
    pub creator_user_id: i64,
    pub creator_username: String,
    pub creation_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub name: String,
    pub description: String,
    pub points_value: i64,
    pub step: i32,
    pub completed: bool,
}

impl Task {
    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            id: self.id,
            group_id: self.group_id,
            creator_user_id: self.creator_user_id,
            points_value: self.points_value,
            step: self.step,
            completed: self.completed,
        }
    }
}

/// The ledger-relevant columns of a locked task row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSnapshot {
    pub id: i64,
    pub group_id: i64,
    pub creator_user_id: i64,
    pub points_value: i64,
    pub step: i32,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub name: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub points_value: i64,
    pub step: i32,
}

/// Creator-only edit of a task's descriptive fields and value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEdit {
    pub task_id: i64,
    pub name: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub points_value: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditOutcome {
    pub task_id: i64,
    /// `new value - old value`, already settled against the pool.
    pub points_delta: i64,
    pub pool: PoolBalance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionChange {
    pub task_id: i64,
    pub completed: bool,
    pub points_value: i64,
    pub pool: PoolBalance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deletion {
    pub task_id: i64,
    pub returned_points: i64,
    pub pool: PoolBalance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepChange {
    pub task_id: i64,
    pub step: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    Increment,
    Decrement,
}

impl StepAction {
    pub fn delta(self) -> i32 {
        match self {
            StepAction::Increment => 1,
            StepAction::Decrement => -1,
        }
    }
}

impl FromStr for StepAction {
    type Err = ChoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+1" => Ok(StepAction::Increment),
            "-1" => Ok(StepAction::Decrement),
            _ => Err(ChoreError::Validation(
                "Invalid action. Must be '+1' or '-1'".to_owned(),
            )),
        }
    }
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepAction::Increment => f.write_str("+1"),
            StepAction::Decrement => f.write_str("-1"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_action_parse() {
        assert_eq!("+1".parse::<StepAction>().unwrap(), StepAction::Increment);
        assert_eq!("-1".parse::<StepAction>().unwrap(), StepAction::Decrement);
        assert!(matches!(
            "+2".parse::<StepAction>(),
            Err(ChoreError::Validation(_))
        ));
        assert!("".parse::<StepAction>().is_err());
    }

    #[test]
    fn test_task_serializes_camel_case() {
        let now = Utc::now();
        let task = Task {
            id: 1,
            group_id: 2,
            creator_user_id: 3,
            creator_username: "alice".to_owned(),
            creation_date: now,
            due_date: now,
            name: "Dishes".to_owned(),
            description: String::new(),
            points_value: 5,
            step: 1,
            completed: false,
        };

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["creatorUsername"], "alice");
        assert_eq!(json["pointsValue"], 5);
        assert_eq!(json["groupId"], 2);
    }
}

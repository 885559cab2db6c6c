use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ledger::{Deletion, Group, PoolBalance};
use crate::{ChoreError, SecretString};

// Request DTOs

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: SecretString,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub due_date: DateTime<Utc>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub points_value: i64,
    #[serde(default = "first_step")]
    pub step: i32,
}

fn first_step() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub task_id: i64,
    pub due_date: DateTime<Utc>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub points_value: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepTaskRequest {
    pub task_id: i64,
    pub action: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub task_id: i64,
    pub completed: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskIdRequest {
    pub task_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub initial_points: i64,
}

#[derive(Debug, Deserialize)]
pub struct JoinGroupRequest {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct GrantPointsRequest {
    pub amount: i64,
}

// Response DTOs

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredResponse {
    pub message: String,
    pub user_id: i64,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub token: SecretString,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub message: String,
    pub user: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreatedResponse {
    pub id: i64,
    pub creator_username: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResponse {
    pub task_id: i64,
    pub step: i32,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResponse {
    pub task_id: i64,
    pub completed: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResponse {
    pub task_id: i64,
    pub deleted: bool,
    pub returned_points: i64,
    pub message: String,
}

impl From<Deletion> for DeletedResponse {
    fn from(deletion: Deletion) -> Self {
        let message = if deletion.returned_points > 0 {
            format!(
                "Task {} deleted. {} points returned to pool.",
                deletion.task_id, deletion.returned_points
            )
        } else {
            format!("Task {} deleted.", deletion.task_id)
        };

        DeletedResponse {
            task_id: deletion.task_id,
            deleted: true,
            returned_points: deletion.returned_points,
            message,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GroupCreatedResponse {
    pub id: i64,
    pub code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResponse {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub points: i64,
    pub points_score: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting: Option<String>,
}

impl From<Group> for GroupResponse {
    fn from(group: Group) -> Self {
        GroupResponse {
            id: group.id,
            name: group.name,
            code: group.code,
            points: group.points,
            points_score: group.points_score,
            meeting: group.meeting_time,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolResponse {
    pub points: i64,
    pub points_score: i64,
}

impl From<PoolBalance> for PoolResponse {
    fn from(pool: PoolBalance) -> Self {
        PoolResponse {
            points: pool.points,
            points_score: pool.score,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl From<&ChoreError> for ErrorResponse {
    fn from(err: &ChoreError) -> Self {
        // storage and hashing details stay in the logs
        let error = match err.kind() {
            crate::ErrorKind::Internal => "Internal server error".to_owned(),
            _ => err.to_string(),
        };

        ErrorResponse {
            error,
            code: err.code().to_owned(),
        }
    }
}

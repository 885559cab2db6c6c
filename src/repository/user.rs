use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ChoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub group_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn in_group(&self) -> bool {
        self.group_id.is_some()
    }
}

#[cfg(any(test, feature = "mocks"))]
impl User {
    pub fn mock() -> Self {
        User {
            id: 1,
            username: "alice".to_owned(),
            password_hash: "fakehashedpassword".to_owned(),
            group_id: None,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// # Errors
    ///
    /// `UsernameTaken` if another account already uses `username`.
    async fn create_user(&self, username: &str, password_hash: &str)
        -> Result<User, ChoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ChoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, ChoreError>;

    /// Moves the user into `group_id`, or out of any group with `None`.
    ///
    /// # Errors
    ///
    /// `UserNotFound` if no such user exists.
    async fn set_group(&self, user_id: i64, group_id: Option<i64>) -> Result<(), ChoreError>;

    /// Moves a user who belongs to no group into `group_id`. The membership
    /// check and the write are one conditional update, so two concurrent joins
    /// for the same user cannot both succeed.
    ///
    /// # Errors
    ///
    /// - `AlreadyInGroup` if the stored user already has a group
    /// - `UserNotFound` if no such user exists
    async fn join_group(&self, user_id: i64, group_id: i64) -> Result<(), ChoreError>;
}

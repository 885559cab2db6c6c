use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::ChoreError;

use super::user::{User, UserRepository};

#[derive(Clone, Default)]
pub struct MockUserRepository {
    pub users: Arc<Mutex<Vec<User>>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn users(&self) -> Result<MutexGuard<'_, Vec<User>>, ChoreError> {
        self.users
            .lock()
            .map_err(|_| ChoreError::Internal("user store lock poisoned".to_owned()))
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, ChoreError> {
        let mut users = self.users()?;
        if users.iter().any(|u| u.username == username) {
            return Err(ChoreError::UsernameTaken);
        }

        let user = User {
            id: users.iter().map(|u| u.id).max().unwrap_or(0) + 1,
            username: username.to_owned(),
            password_hash: password_hash.to_owned(),
            group_id: None,
            created_at: Utc::now(),
        };
        users.push(user.clone());
        drop(users);

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ChoreError> {
        let users = self.users()?;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, ChoreError> {
        let users = self.users()?;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn set_group(&self, user_id: i64, group_id: Option<i64>) -> Result<(), ChoreError> {
        let mut users = self.users()?;
        if let Some(user) = users.iter_mut().find(|u| u.id == user_id) {
            user.group_id = group_id;
            Ok(())
        } else {
            Err(ChoreError::UserNotFound)
        }
    }

    async fn join_group(&self, user_id: i64, group_id: i64) -> Result<(), ChoreError> {
        let mut users = self.users()?;
        let user = users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(ChoreError::UserNotFound)?;
        if user.in_group() {
            return Err(ChoreError::AlreadyInGroup);
        }
        user.group_id = Some(group_id);
        Ok(())
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use super::{database_error, is_unique_violation};
use crate::{ChoreError, User, UserRepository};

#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct UserRecord {
    id: i64,
    username: String,
    password_hash: String,
    group_id: Option<i64>,
    created_at: DateTime<Utc>,
}

impl From<UserRecord> for User {
    fn from(row: UserRecord) -> Self {
        User {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            group_id: row.group_id,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self, username, password_hash), err)
    )]
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, ChoreError> {
        let row: UserRecord = sqlx::query_as(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?, ?, ?) RETURNING id, username, password_hash, group_id, created_at",
        )
        .bind(username)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ChoreError::UsernameTaken
            } else {
                database_error("create_user", e)
            }
        })?;

        Ok(row.into())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, username), err))]
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ChoreError> {
        let row: Option<UserRecord> = sqlx::query_as(
            "SELECT id, username, password_hash, group_id, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("find_by_username", e))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, ChoreError> {
        let row: Option<UserRecord> = sqlx::query_as(
            "SELECT id, username, password_hash, group_id, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("find_by_id", e))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn set_group(&self, user_id: i64, group_id: Option<i64>) -> Result<(), ChoreError> {
        let result = sqlx::query("UPDATE users SET group_id = ? WHERE id = ?")
            .bind(group_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| database_error("set_group", e))?;

        if result.rows_affected() == 0 {
            return Err(ChoreError::UserNotFound);
        }

        Ok(())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn join_group(&self, user_id: i64, group_id: i64) -> Result<(), ChoreError> {
        let result =
            sqlx::query("UPDATE users SET group_id = ? WHERE id = ? AND group_id IS NULL")
                .bind(group_id)
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(|e| database_error("join_group", e))?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        let current: Option<(Option<i64>,)> =
            sqlx::query_as("SELECT group_id FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| database_error("join_group", e))?;

        match current {
            Some(_) => Err(ChoreError::AlreadyInGroup),
            None => Err(ChoreError::UserNotFound),
        }
    }
}

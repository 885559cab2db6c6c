use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use super::{database_error, is_unique_violation};
use crate::ledger::rules;
use crate::ledger::{
    CompletionChange, Deletion, EditOutcome, Group, GroupRepository, LedgerRepository, Member,
    NewTask, PoolBalance, StepAction, StepChange, Task, TaskEdit, TaskSnapshot,
};
use crate::ChoreError;

const TASK_COLUMNS: &str = "t.id, t.group_id, t.creator_user_id, u.username AS creator_username, \
     t.creation_date, t.due_date, t.name, t.description, t.points_value, t.step, t.completed";

const GROUP_COLUMNS: &str = "id, name, code, creator_user_id, points, points_score, meeting";

type Tx = Transaction<'static, Postgres>;

#[derive(Clone)]
pub struct PostgresLedgerRepository {
    pool: PgPool,
}

impl PostgresLedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self, operation: &str) -> Result<Tx, ChoreError> {
        self.pool
            .begin()
            .await
            .map_err(|e| database_error(operation, e))
    }
}

#[derive(FromRow)]
struct TaskRecord {
    id: i64,
    group_id: i64,
    creator_user_id: i64,
    creator_username: String,
    creation_date: DateTime<Utc>,
    due_date: DateTime<Utc>,
    name: String,
    description: String,
    points_value: i64,
    step: i32,
    completed: bool,
}

impl From<TaskRecord> for Task {
    fn from(row: TaskRecord) -> Self {
        Task {
            id: row.id,
            group_id: row.group_id,
            creator_user_id: row.creator_user_id,
            creator_username: row.creator_username,
            creation_date: row.creation_date,
            due_date: row.due_date,
            name: row.name,
            description: row.description,
            points_value: row.points_value,
            step: row.step,
            completed: row.completed,
        }
    }
}

#[derive(FromRow)]
struct GroupRecord {
    id: i64,
    name: String,
    code: String,
    creator_user_id: i64,
    points: i64,
    points_score: i64,
    meeting: Option<String>,
}

impl From<GroupRecord> for Group {
    fn from(row: GroupRecord) -> Self {
        Group {
            id: row.id,
            name: row.name,
            code: row.code,
            creator_user_id: row.creator_user_id,
            points: row.points,
            points_score: row.points_score,
            meeting_time: row.meeting,
        }
    }
}

async fn lock_pool(tx: &mut Tx, group_id: i64, operation: &str) -> Result<PoolBalance, ChoreError> {
    let row: Option<(i64, i64)> =
        sqlx::query_as("SELECT points, points_score FROM groups WHERE id = $1 FOR UPDATE")
            .bind(group_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| database_error(operation, e))?;

    row.map(|(points, score)| PoolBalance { points, score })
        .ok_or(ChoreError::GroupNotFound)
}

/// Locks the task row. Transactions that also lock the pool take the group
/// row first.
async fn lock_task(tx: &mut Tx, task_id: i64, operation: &str) -> Result<TaskSnapshot, ChoreError> {
    let row: Option<(i64, i64, i64, i64, i32, bool)> = sqlx::query_as(
        "SELECT id, group_id, creator_user_id, points_value, step, completed FROM tasks WHERE id = $1 FOR UPDATE",
    )
    .bind(task_id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| database_error(operation, e))?;

    row.map(
        |(id, group_id, creator_user_id, points_value, step, completed)| TaskSnapshot {
            id,
            group_id,
            creator_user_id,
            points_value,
            step,
            completed,
        },
    )
    .ok_or(ChoreError::TaskNotFound)
}

async fn store_pool(
    tx: &mut Tx,
    group_id: i64,
    pool: PoolBalance,
    operation: &str,
) -> Result<(), ChoreError> {
    sqlx::query("UPDATE groups SET points = $1, points_score = $2 WHERE id = $3")
        .bind(pool.points)
        .bind(pool.score)
        .bind(group_id)
        .execute(&mut **tx)
        .await
        .map_err(|e| database_error(operation, e))?;
    Ok(())
}

async fn commit(tx: Tx, operation: &str) -> Result<(), ChoreError> {
    tx.commit().await.map_err(|e| database_error(operation, e))
}

#[async_trait]
impl LedgerRepository for PostgresLedgerRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, member, task), err))]
    async fn create_task(&self, member: &Member, task: NewTask) -> Result<Task, ChoreError> {
        const OP: &str = "create_task";
        let mut tx = self.begin(OP).await?;

        let balance = lock_pool(&mut tx, member.group_id, OP).await?;
        let balance = rules::settle_create(balance, &task)?;

        let (id, creation_date): (i64, DateTime<Utc>) = sqlx::query_as(
            "INSERT INTO tasks (group_id, creator_user_id, due_date, name, description, points_value, step) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id, creation_date",
        )
        .bind(member.group_id)
        .bind(member.user_id)
        .bind(task.due_date)
        .bind(&task.name)
        .bind(&task.description)
        .bind(task.points_value)
        .bind(task.step)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| database_error(OP, e))?;

        store_pool(&mut tx, member.group_id, balance, OP).await?;
        commit(tx, OP).await?;

        Ok(Task {
            id,
            group_id: member.group_id,
            creator_user_id: member.user_id,
            creator_username: member.username.clone(),
            creation_date,
            due_date: task.due_date,
            name: task.name,
            description: task.description,
            points_value: task.points_value,
            step: task.step,
            completed: false,
        })
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, member), err))]
    async fn list_tasks(&self, member: &Member) -> Result<Vec<Task>, ChoreError> {
        let rows: Vec<TaskRecord> = sqlx::query_as(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks t JOIN users u ON u.id = t.creator_user_id \
             WHERE t.group_id = $1 ORDER BY t.id"
        ))
        .bind(member.group_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("list_tasks", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_task(&self, task_id: i64) -> Result<Option<Task>, ChoreError> {
        let row: Option<TaskRecord> = sqlx::query_as(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks t JOIN users u ON u.id = t.creator_user_id WHERE t.id = $1"
        ))
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("find_task", e))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, member, edit), err))]
    async fn update_task(&self, member: &Member, edit: TaskEdit) -> Result<EditOutcome, ChoreError> {
        const OP: &str = "update_task";
        let mut tx = self.begin(OP).await?;

        let balance = lock_pool(&mut tx, member.group_id, OP).await?;
        let snapshot = lock_task(&mut tx, edit.task_id, OP).await?;
        let (balance, delta) = rules::settle_edit(balance, &snapshot, member, &edit)?;

        sqlx::query(
            "UPDATE tasks SET name = $1, description = $2, due_date = $3, points_value = $4 WHERE id = $5",
        )
        .bind(&edit.name)
        .bind(&edit.description)
        .bind(edit.due_date)
        .bind(edit.points_value)
        .bind(edit.task_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| database_error(OP, e))?;

        if delta != 0 {
            store_pool(&mut tx, member.group_id, balance, OP).await?;
        }
        commit(tx, OP).await?;

        Ok(EditOutcome {
            task_id: edit.task_id,
            points_delta: delta,
            pool: balance,
        })
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, member), err))]
    async fn step_task(
        &self,
        member: &Member,
        task_id: i64,
        action: StepAction,
    ) -> Result<StepChange, ChoreError> {
        const OP: &str = "step_task";
        let mut tx = self.begin(OP).await?;

        let snapshot = lock_task(&mut tx, task_id, OP).await?;
        let step = rules::apply_step(&snapshot, member, action)?;

        sqlx::query("UPDATE tasks SET step = $1 WHERE id = $2")
            .bind(step)
            .bind(task_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| database_error(OP, e))?;
        commit(tx, OP).await?;

        Ok(StepChange { task_id, step })
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, member), err))]
    async fn set_completion(
        &self,
        member: &Member,
        task_id: i64,
        completed: bool,
    ) -> Result<CompletionChange, ChoreError> {
        const OP: &str = "set_completion";
        let mut tx = self.begin(OP).await?;

        let balance = lock_pool(&mut tx, member.group_id, OP).await?;
        let snapshot = lock_task(&mut tx, task_id, OP).await?;
        let balance = rules::settle_completion(balance, &snapshot, member, completed)?;

        sqlx::query("UPDATE tasks SET completed = $1 WHERE id = $2")
            .bind(completed)
            .bind(task_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| database_error(OP, e))?;
        store_pool(&mut tx, member.group_id, balance, OP).await?;
        commit(tx, OP).await?;

        Ok(CompletionChange {
            task_id,
            completed,
            points_value: snapshot.points_value,
            pool: balance,
        })
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, member), err))]
    async fn delete_task(&self, member: &Member, task_id: i64) -> Result<Deletion, ChoreError> {
        const OP: &str = "delete_task";
        let mut tx = self.begin(OP).await?;

        let balance = lock_pool(&mut tx, member.group_id, OP).await?;
        let snapshot = lock_task(&mut tx, task_id, OP).await?;
        let (balance, returned_points) = rules::settle_deletion(balance, &snapshot, member)?;

        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(task_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| database_error(OP, e))?;
        store_pool(&mut tx, member.group_id, balance, OP).await?;
        commit(tx, OP).await?;

        Ok(Deletion {
            task_id,
            returned_points,
            pool: balance,
        })
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn pool_balance(&self, group_id: i64) -> Result<PoolBalance, ChoreError> {
        let row: Option<(i64, i64)> =
            sqlx::query_as("SELECT points, points_score FROM groups WHERE id = $1")
                .bind(group_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| database_error("pool_balance", e))?;

        row.map(|(points, score)| PoolBalance { points, score })
            .ok_or(ChoreError::GroupNotFound)
    }
}

#[async_trait]
impl GroupRepository for PostgresLedgerRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, name, code), err))]
    async fn create_group(
        &self,
        name: &str,
        code: &str,
        creator_user_id: i64,
        initial_points: i64,
    ) -> Result<Group, ChoreError> {
        if initial_points < 0 {
            return Err(ChoreError::Validation(
                "Initial points must be ≥0".to_owned(),
            ));
        }

        let row: GroupRecord = sqlx::query_as(&format!(
            "INSERT INTO groups (name, code, creator_user_id, points, points_score) \
             VALUES ($1, $2, $3, $4, 0) RETURNING {GROUP_COLUMNS}"
        ))
        .bind(name)
        .bind(code)
        .bind(creator_user_id)
        .bind(initial_points)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ChoreError::CodeTaken
            } else {
                database_error("create_group", e)
            }
        })?;

        Ok(row.into())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_group(&self, group_id: i64) -> Result<Option<Group>, ChoreError> {
        let row: Option<GroupRecord> =
            sqlx::query_as(&format!("SELECT {GROUP_COLUMNS} FROM groups WHERE id = $1"))
                .bind(group_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| database_error("find_group", e))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, code), err))]
    async fn find_group_by_code(&self, code: &str) -> Result<Option<Group>, ChoreError> {
        let row: Option<GroupRecord> =
            sqlx::query_as(&format!("SELECT {GROUP_COLUMNS} FROM groups WHERE code = $1"))
                .bind(code)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| database_error("find_group_by_code", e))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn grant_points(&self, group_id: i64, amount: i64) -> Result<PoolBalance, ChoreError> {
        const OP: &str = "grant_points";
        let mut tx = self.begin(OP).await?;

        let balance = lock_pool(&mut tx, group_id, OP).await?;
        let balance = rules::settle_grant(balance, amount)?;
        store_pool(&mut tx, group_id, balance, OP).await?;

        commit(tx, OP).await?;
        Ok(balance)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete_group(&self, group_id: i64) -> Result<(), ChoreError> {
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(group_id)
            .execute(&self.pool)
            .await
            .map_err(|e| database_error("delete_group", e))?;

        if result.rows_affected() == 0 {
            return Err(ChoreError::GroupNotFound);
        }

        Ok(())
    }
}

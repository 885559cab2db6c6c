use async_trait::async_trait;

use super::{
    CompletionChange, Deletion, EditOutcome, Group, Member, NewTask, PoolBalance, StepAction,
    StepChange, Task, TaskEdit,
};
use crate::ChoreError;

/// Task lifecycle storage.
///
/// Every method that touches the pool is one atomic transaction: the group's
/// pool record is locked before it is read, the matching [`rules`](super::rules)
/// function decides the outcome, and either everything is persisted or
/// nothing is.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Debits the member's pool and inserts an active task.
    async fn create_task(&self, member: &Member, task: NewTask) -> Result<Task, ChoreError>;

    /// Tasks of the member's group, oldest first.
    async fn list_tasks(&self, member: &Member) -> Result<Vec<Task>, ChoreError>;

    async fn find_task(&self, task_id: i64) -> Result<Option<Task>, ChoreError>;

    async fn update_task(&self, member: &Member, edit: TaskEdit)
        -> Result<EditOutcome, ChoreError>;

    /// Does not touch the pool.
    async fn step_task(
        &self,
        member: &Member,
        task_id: i64,
        action: StepAction,
    ) -> Result<StepChange, ChoreError>;

    async fn set_completion(
        &self,
        member: &Member,
        task_id: i64,
        completed: bool,
    ) -> Result<CompletionChange, ChoreError>;

    async fn delete_task(&self, member: &Member, task_id: i64) -> Result<Deletion, ChoreError>;

    async fn pool_balance(&self, group_id: i64) -> Result<PoolBalance, ChoreError>;
}

/// Group storage. Membership itself lives on the user record.
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// # Errors
    ///
    /// `CodeTaken` if `code` is already used by another group.
    async fn create_group(
        &self,
        name: &str,
        code: &str,
        creator_user_id: i64,
        initial_points: i64,
    ) -> Result<Group, ChoreError>;

    async fn find_group(&self, group_id: i64) -> Result<Option<Group>, ChoreError>;

    async fn find_group_by_code(&self, code: &str) -> Result<Option<Group>, ChoreError>;

    /// Adds an externally granted top-up to the pool under the pool lock.
    ///
    /// # Errors
    ///
    /// - `GroupNotFound` if no such group exists
    /// - `Validation` if `amount` is not positive or the pool would overflow
    async fn grant_points(&self, group_id: i64, amount: i64) -> Result<PoolBalance, ChoreError>;

    /// Removes a group that was created but never populated, so a failed
    /// creation leaves nothing behind.
    ///
    /// # Errors
    ///
    /// `GroupNotFound` if no such group exists.
    async fn delete_group(&self, group_id: i64) -> Result<(), ChoreError>;
}

use chrono::Utc;

use crate::events::{dispatch, LedgerEvent};
use crate::ledger::{LedgerRepository, Member, NewTask, Task};
use crate::ChoreError;

/// Creates a task and debits its value from the member's group pool.
pub struct CreateTaskAction<L: LedgerRepository> {
    ledger: L,
}

impl<L: LedgerRepository> CreateTaskAction<L> {
    pub fn new(ledger: L) -> Self {
        CreateTaskAction { ledger }
    }

    /// # Errors
    ///
    /// - `Validation` for a blank name or negative value
    /// - `InsufficientPoints` if the pool cannot cover the value
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "create_task", skip_all, fields(group_id = member.group_id), err)
    )]
    pub async fn execute(&self, member: &Member, mut task: NewTask) -> Result<Task, ChoreError> {
        task.name = task.name.trim().to_owned();
        let created = self.ledger.create_task(member, task).await?;

        dispatch(LedgerEvent::TaskCreated {
            task_id: created.id,
            group_id: created.group_id,
            points_value: created.points_value,
            at: Utc::now(),
        })
        .await;

        log::info!(
            target: "chorepool",
            "msg=\"task created\", task_id={}, group_id={}, points_value={}",
            created.id,
            created.group_id,
            created.points_value
        );

        Ok(created)
    }
}

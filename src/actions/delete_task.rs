use chrono::Utc;

use crate::events::{dispatch, LedgerEvent};
use crate::ledger::{Deletion, LedgerRepository, Member};
use crate::ChoreError;

/// Creator-only delete. An active task's value goes back to the pool.
pub struct DeleteTaskAction<L: LedgerRepository> {
    ledger: L,
}

impl<L: LedgerRepository> DeleteTaskAction<L> {
    pub fn new(ledger: L) -> Self {
        DeleteTaskAction { ledger }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "delete_task", skip(self, member), err)
    )]
    pub async fn execute(&self, member: &Member, task_id: i64) -> Result<Deletion, ChoreError> {
        let deletion = self.ledger.delete_task(member, task_id).await?;

        dispatch(LedgerEvent::TaskDeleted {
            task_id,
            group_id: member.group_id,
            returned_points: deletion.returned_points,
            pool: deletion.pool.points,
            at: Utc::now(),
        })
        .await;

        log::info!(
            target: "chorepool",
            "msg=\"task deleted\", task_id={task_id}, returned_points={}",
            deletion.returned_points
        );

        Ok(deletion)
    }
}

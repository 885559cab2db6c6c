use chrono::Utc;

use crate::events::{dispatch, LedgerEvent};
use crate::ledger::{EditOutcome, LedgerRepository, Member, TaskEdit};
use crate::ChoreError;

/// Creator-only edit. A changed value on an active task is settled against
/// the pool; on a completed task it is refused.
pub struct UpdateTaskAction<L: LedgerRepository> {
    ledger: L,
}

impl<L: LedgerRepository> UpdateTaskAction<L> {
    pub fn new(ledger: L) -> Self {
        UpdateTaskAction { ledger }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "update_task", skip_all, fields(task_id = edit.task_id), err)
    )]
    pub async fn execute(&self, member: &Member, mut edit: TaskEdit) -> Result<EditOutcome, ChoreError> {
        edit.name = edit.name.trim().to_owned();
        let outcome = self.ledger.update_task(member, edit).await?;

        dispatch(LedgerEvent::TaskUpdated {
            task_id: outcome.task_id,
            group_id: member.group_id,
            points_delta: outcome.points_delta,
            pool: outcome.pool.points,
            at: Utc::now(),
        })
        .await;

        log::info!(
            target: "chorepool",
            "msg=\"task updated\", task_id={}, points_delta={}",
            outcome.task_id,
            outcome.points_delta
        );

        Ok(outcome)
    }
}

use chrono::Utc;

use crate::events::{dispatch, LedgerEvent};
use crate::ledger::{LedgerRepository, Member, StepAction, StepChange};
use crate::ChoreError;

pub struct StepTaskAction<L: LedgerRepository> {
    ledger: L,
}

impl<L: LedgerRepository> StepTaskAction<L> {
    pub fn new(ledger: L) -> Self {
        StepTaskAction { ledger }
    }

    /// Moves the task's step counter by one. Never touches the pool.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "step_task", skip(self, member), err)
    )]
    pub async fn execute(
        &self,
        member: &Member,
        task_id: i64,
        action: StepAction,
    ) -> Result<StepChange, ChoreError> {
        let change = self.ledger.step_task(member, task_id, action).await?;

        dispatch(LedgerEvent::TaskStepChanged {
            task_id,
            group_id: member.group_id,
            step: change.step,
            at: Utc::now(),
        })
        .await;

        log::debug!(
            target: "chorepool",
            "msg=\"task step changed\", task_id={task_id}, action=\"{action}\", step={}",
            change.step
        );

        Ok(change)
    }
}

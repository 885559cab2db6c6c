use chrono::Utc;

use crate::events::{dispatch, LedgerEvent};
use crate::ledger::{CompletionChange, LedgerRepository, Member};
use crate::ChoreError;

/// Completes or reopens a task, moving its value between pool and score.
pub struct ToggleCompletionAction<L: LedgerRepository> {
    ledger: L,
}

impl<L: LedgerRepository> ToggleCompletionAction<L> {
    pub fn new(ledger: L) -> Self {
        ToggleCompletionAction { ledger }
    }

    /// # Errors
    ///
    /// - `TaskNotFound`, then `Forbidden` for a task of another group
    /// - `AlreadyCompleted` / `NotCompleted` when nothing would change
    /// - `InsufficientPoints` when reopening and the pool cannot cover it
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "toggle_completion", skip(self, member), err)
    )]
    pub async fn execute(
        &self,
        member: &Member,
        task_id: i64,
        completed: bool,
    ) -> Result<CompletionChange, ChoreError> {
        let change = self.ledger.set_completion(member, task_id, completed).await?;

        let at = Utc::now();
        let event = if change.completed {
            LedgerEvent::TaskCompleted {
                task_id,
                group_id: member.group_id,
                points_value: change.points_value,
                score: change.pool.score,
                at,
            }
        } else {
            LedgerEvent::TaskReopened {
                task_id,
                group_id: member.group_id,
                points_value: change.points_value,
                score: change.pool.score,
                at,
            }
        };
        dispatch(event).await;

        log::info!(
            target: "chorepool",
            "msg=\"task completion changed\", task_id={task_id}, completed={completed}, pool={}, score={}",
            change.pool.points,
            change.pool.score
        );

        Ok(change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::test_support::{member_with_pool, new_task};
    use crate::ledger::PoolBalance;

    #[tokio::test]
    async fn test_complete_then_reopen() {
        let (_, ledger, member) = member_with_pool(10).await;
        let task = ledger.create_task(&member, new_task("Dishes", 10)).await.unwrap();
        let action = ToggleCompletionAction::new(ledger.clone());

        let done = action.execute(&member, task.id, true).await.unwrap();
        assert!(done.completed);
        assert_eq!(done.pool, PoolBalance { points: 10, score: 10 });

        let reopened = action.execute(&member, task.id, false).await.unwrap();
        assert!(!reopened.completed);
        assert_eq!(reopened.pool, PoolBalance { points: 0, score: 0 });
    }

    #[tokio::test]
    async fn test_repeated_toggle_rejected() {
        let (_, ledger, member) = member_with_pool(10).await;
        let task = ledger.create_task(&member, new_task("Dishes", 10)).await.unwrap();
        let action = ToggleCompletionAction::new(ledger.clone());

        assert_eq!(
            action.execute(&member, task.id, false).await.unwrap_err(),
            ChoreError::NotCompleted
        );
        action.execute(&member, task.id, true).await.unwrap();
        assert_eq!(
            action.execute(&member, task.id, true).await.unwrap_err(),
            ChoreError::AlreadyCompleted
        );
        assert_eq!(
            ledger.pool_balance(member.group_id).await.unwrap(),
            PoolBalance { points: 10, score: 10 }
        );
    }

    #[tokio::test]
    async fn test_reopen_needs_funds() {
        let (_, ledger, member) = member_with_pool(10).await;
        let task = ledger.create_task(&member, new_task("Dishes", 10)).await.unwrap();
        let action = ToggleCompletionAction::new(ledger.clone());
        action.execute(&member, task.id, true).await.unwrap();

        // spend the pool that completion refilled
        ledger.create_task(&member, new_task("Bins", 10)).await.unwrap();

        assert!(matches!(
            action.execute(&member, task.id, false).await,
            Err(ChoreError::InsufficientPoints { .. })
        ));
        let stored = ledger.find_task(task.id).await.unwrap().unwrap();
        assert!(stored.completed);
    }
}

use crate::ledger::{LedgerRepository, Member, Task};
use crate::ChoreError;

pub struct ListTasksAction<L: LedgerRepository> {
    ledger: L,
}

impl<L: LedgerRepository> ListTasksAction<L> {
    pub fn new(ledger: L) -> Self {
        ListTasksAction { ledger }
    }

    /// Tasks of the member's group, possibly empty.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "list_tasks", skip_all, err)
    )]
    pub async fn execute(&self, member: &Member) -> Result<Vec<Task>, ChoreError> {
        self.ledger.list_tasks(member).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::test_support::{member_with_pool, new_task};
    use crate::ledger::GroupRepository;

    #[tokio::test]
    async fn test_list_tasks_scoped_to_group() {
        let (_, ledger, member) = member_with_pool(30).await;
        ledger.create_task(&member, new_task("Dishes", 10)).await.unwrap();
        ledger.create_task(&member, new_task("Bins", 5)).await.unwrap();

        let other = ledger.create_group("Flat 5", "BCDEFGHI", 2, 10).await.unwrap();
        let neighbour = Member {
            user_id: 2,
            group_id: other.id,
            username: "bob".to_owned(),
        };
        ledger.create_task(&neighbour, new_task("Hoover", 10)).await.unwrap();

        let action = ListTasksAction::new(ledger);
        let tasks = action.execute(&member).await.unwrap();
        assert_eq!(
            tasks.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            vec!["Dishes", "Bins"]
        );
        assert_eq!(action.execute(&neighbour).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_tasks_empty() {
        let (_, ledger, member) = member_with_pool(0).await;
        assert!(ListTasksAction::new(ledger).execute(&member).await.unwrap().is_empty());
    }
}

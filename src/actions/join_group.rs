use chrono::Utc;

use crate::events::{dispatch, LedgerEvent};
use crate::ledger::{Group, GroupRepository};
use crate::validators::validate_group_code;
use crate::{ChoreError, User, UserRepository};

pub struct JoinGroupAction<U: UserRepository, G: GroupRepository> {
    user_repository: U,
    groups: G,
}

impl<U: UserRepository, G: GroupRepository> JoinGroupAction<U, G> {
    pub fn new(user_repository: U, groups: G) -> Self {
        JoinGroupAction {
            user_repository,
            groups,
        }
    }

    /// # Errors
    ///
    /// - `Validation` for an empty or malformed code
    /// - `AlreadyInGroup` if the user belongs to a group, including one joined
    ///   concurrently after `user` was loaded
    /// - `GroupNotFound` if no group has this code
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "join_group", skip_all, err)
    )]
    pub async fn execute(&self, user: &User, code: &str) -> Result<Group, ChoreError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ChoreError::Validation("Join code is required".to_owned()));
        }
        validate_group_code(code)?;
        if user.in_group() {
            return Err(ChoreError::AlreadyInGroup);
        }

        let group = self
            .groups
            .find_group_by_code(code)
            .await?
            .ok_or(ChoreError::GroupNotFound)?;
        self.user_repository.join_group(user.id, group.id).await?;

        dispatch(LedgerEvent::GroupJoined {
            group_id: group.id,
            user_id: user.id,
            at: Utc::now(),
        })
        .await;

        log::info!(
            target: "chorepool",
            "msg=\"group joined\", group_id={}, user_id={}",
            group.id,
            user.id
        );

        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryLedger;
    use crate::MockUserRepository;

    #[tokio::test]
    async fn test_join_by_code() {
        let users = MockUserRepository::new();
        let ledger = InMemoryLedger::new();
        let group = ledger.create_group("Flat 4", "ABCDEFGH", 1, 0).await.unwrap();
        let bob = users.create_user("bob", "hash").await.unwrap();

        let joined = JoinGroupAction::new(users.clone(), ledger)
            .execute(&bob, "ABCDEFGH")
            .await
            .unwrap();

        assert_eq!(joined.id, group.id);
        assert_eq!(
            users.find_by_id(bob.id).await.unwrap().unwrap().group_id,
            Some(group.id)
        );
    }

    #[tokio::test]
    async fn test_join_unknown_code() {
        let users = MockUserRepository::new();
        let bob = users.create_user("bob", "hash").await.unwrap();

        let result = JoinGroupAction::new(users, InMemoryLedger::new())
            .execute(&bob, "ZZZZZZZZ")
            .await;
        assert_eq!(result.unwrap_err(), ChoreError::GroupNotFound);
    }

    #[tokio::test]
    async fn test_join_while_in_group() {
        let users = MockUserRepository::new();
        let ledger = InMemoryLedger::new();
        ledger.create_group("Flat 4", "ABCDEFGH", 1, 0).await.unwrap();
        let mut bob = users.create_user("bob", "hash").await.unwrap();
        bob.group_id = Some(9);

        let result = JoinGroupAction::new(users, ledger)
            .execute(&bob, "ABCDEFGH")
            .await;
        assert_eq!(result.unwrap_err(), ChoreError::AlreadyInGroup);
    }

    #[tokio::test]
    async fn test_join_rejects_malformed_code() {
        let users = MockUserRepository::new();
        let bob = users.create_user("bob", "hash").await.unwrap();

        for code in ["abcdefgh", "ABCDEFG1", "ABCD"] {
            let result = JoinGroupAction::new(users.clone(), InMemoryLedger::new())
                .execute(&bob, code)
                .await;
            assert!(matches!(result, Err(ChoreError::Validation(_))), "{code}");
        }
    }

    #[tokio::test]
    async fn test_join_with_stale_user_is_rejected() {
        let users = MockUserRepository::new();
        let ledger = InMemoryLedger::new();
        let first = ledger.create_group("Flat 4", "ABCDEFGH", 1, 0).await.unwrap();
        ledger.create_group("Flat 5", "BCDEFGHI", 1, 0).await.unwrap();
        let bob = users.create_user("bob", "hash").await.unwrap();

        // joined elsewhere after this snapshot was taken
        users.join_group(bob.id, first.id).await.unwrap();
        let result = JoinGroupAction::new(users.clone(), ledger)
            .execute(&bob, "BCDEFGHI")
            .await;

        assert_eq!(result.unwrap_err(), ChoreError::AlreadyInGroup);
        assert_eq!(
            users.find_by_id(bob.id).await.unwrap().unwrap().group_id,
            Some(first.id)
        );
    }
}

use chrono::Utc;

use crate::crypto::generate_group_code;
use crate::events::{dispatch, LedgerEvent};
use crate::ledger::{Group, GroupRepository};
use crate::{ChoreError, User, UserRepository};

/// Fresh codes tried before giving up on a collision streak.
const MAX_CODE_ATTEMPTS: usize = 5;

/// Creates a group with a random join code and moves its creator into it.
pub struct CreateGroupAction<U: UserRepository, G: GroupRepository> {
    user_repository: U,
    groups: G,
}

impl<U: UserRepository, G: GroupRepository> CreateGroupAction<U, G> {
    pub fn new(user_repository: U, groups: G) -> Self {
        CreateGroupAction {
            user_repository,
            groups,
        }
    }

    /// # Errors
    ///
    /// - `Validation` for a blank name or negative starting pool
    /// - `AlreadyInGroup` if the creator already belongs to a group. When that
    ///   is only discovered after the insert, the new group is removed again.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "create_group", skip(self, creator, name), err)
    )]
    pub async fn execute(
        &self,
        creator: &User,
        name: &str,
        initial_points: i64,
    ) -> Result<Group, ChoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ChoreError::Validation("Group name is required".to_owned()));
        }
        if creator.in_group() {
            return Err(ChoreError::AlreadyInGroup);
        }

        let group = self.insert_with_fresh_code(name, creator.id, initial_points).await?;
        if let Err(err) = self.user_repository.join_group(creator.id, group.id).await {
            self.discard(group.id).await;
            return Err(err);
        }

        dispatch(LedgerEvent::GroupCreated {
            group_id: group.id,
            creator_user_id: creator.id,
            pool: group.points,
            at: Utc::now(),
        })
        .await;

        log::info!(
            target: "chorepool",
            "msg=\"group created\", group_id={}, creator_user_id={}",
            group.id,
            creator.id
        );

        Ok(group)
    }

    async fn insert_with_fresh_code(
        &self,
        name: &str,
        creator_user_id: i64,
        initial_points: i64,
    ) -> Result<Group, ChoreError> {
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = generate_group_code()?;
            match self
                .groups
                .create_group(name, &code, creator_user_id, initial_points)
                .await
            {
                Err(ChoreError::CodeTaken) => {
                    log::warn!(
                        target: "chorepool",
                        "msg=\"group code collision\", attempt={attempt}"
                    );
                }
                result => return result,
            }
        }
        Err(ChoreError::Internal(
            "could not allocate a unique group code".to_owned(),
        ))
    }

    async fn discard(&self, group_id: i64) {
        if let Err(err) = self.groups.delete_group(group_id).await {
            log::warn!(
                target: "chorepool",
                "msg=\"orphan group not removed\", group_id={group_id}, error=\"{err}\""
            );
        }
    }
}

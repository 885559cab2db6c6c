use chrono::Utc;

use crate::events::{dispatch, LedgerEvent};
use crate::{ChoreError, User, UserRepository};

/// Removes the user from their group. Tasks they created stay with the group.
pub struct LeaveGroupAction<U: UserRepository> {
    user_repository: U,
}

impl<U: UserRepository> LeaveGroupAction<U> {
    pub fn new(user_repository: U) -> Self {
        LeaveGroupAction { user_repository }
    }

    /// Returns the id of the group that was left.
    ///
    /// # Errors
    ///
    /// `NoGroup` if the user is not in a group.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "leave_group", skip_all, err)
    )]
    pub async fn execute(&self, user: &User) -> Result<i64, ChoreError> {
        let group_id = user.group_id.ok_or(ChoreError::NoGroup)?;
        self.user_repository.set_group(user.id, None).await?;

        dispatch(LedgerEvent::GroupLeft {
            group_id,
            user_id: user.id,
            at: Utc::now(),
        })
        .await;

        log::info!(
            target: "chorepool",
            "msg=\"group left\", group_id={group_id}, user_id={}",
            user.id
        );

        Ok(group_id)
    }
}

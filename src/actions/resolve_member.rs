use crate::ledger::Member;
use crate::{ChoreError, User, UserRepository};

/// Turns an authenticated username into the acting [`Member`].
pub struct ResolveMemberAction<U: UserRepository> {
    repository: U,
}

impl<U: UserRepository> ResolveMemberAction<U> {
    pub fn new(repository: U) -> Self {
        ResolveMemberAction { repository }
    }

    /// # Errors
    ///
    /// `UserNotFound` if the account no longer exists.
    pub async fn user(&self, username: &str) -> Result<User, ChoreError> {
        self.repository
            .find_by_username(username)
            .await?
            .ok_or(ChoreError::UserNotFound)
    }

    /// # Errors
    ///
    /// `UserNotFound` as for [`user`](Self::user); `NoGroup` if the user has
    /// not joined a group.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "resolve_member", skip_all, err)
    )]
    pub async fn execute(&self, username: &str) -> Result<Member, ChoreError> {
        let user = self.user(username).await?;
        let group_id = user.group_id.ok_or(ChoreError::NoGroup)?;

        Ok(Member {
            user_id: user.id,
            group_id,
            username: user.username,
        })
    }
}

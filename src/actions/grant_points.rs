use chrono::Utc;

use crate::events::{dispatch, LedgerEvent};
use crate::ledger::{GroupRepository, Member, PoolBalance};
use crate::ChoreError;

/// Tops up a group's pool. Only the group's creator may grant points.
pub struct GrantPointsAction<G: GroupRepository> {
    groups: G,
}

impl<G: GroupRepository> GrantPointsAction<G> {
    pub fn new(groups: G) -> Self {
        GrantPointsAction { groups }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "grant_points", skip(self, member), err)
    )]
    pub async fn execute(&self, member: &Member, amount: i64) -> Result<PoolBalance, ChoreError> {
        let group = self
            .groups
            .find_group(member.group_id)
            .await?
            .ok_or(ChoreError::GroupNotFound)?;
        if group.creator_user_id != member.user_id {
            return Err(ChoreError::Forbidden(
                "only the group creator can grant points".to_owned(),
            ));
        }

        let pool = self.groups.grant_points(group.id, amount).await?;

        dispatch(LedgerEvent::PointsGranted {
            group_id: group.id,
            amount,
            pool: pool.points,
            at: Utc::now(),
        })
        .await;

        log::info!(
            target: "chorepool",
            "msg=\"points granted\", group_id={}, amount={amount}, pool={}",
            group.id,
            pool.points
        );

        Ok(pool)
    }
}

//! Transition rules for the points ledger.
//!
//! Every function here takes the locked pool balance (and the locked task
//! where one exists), decides whether the transition is allowed, and returns
//! the balance to persist. Nothing is mutated, so a backend that gets an
//! `Err` simply rolls back.
//!
//! Checks run in a fixed order so that callers always see the most specific
//! failure: existence (done by the backend), then permission, then state, then
//! funds.

use super::{Member, NewTask, PoolBalance, TaskEdit, TaskSnapshot, StepAction};
use crate::ChoreError;

pub const MAX_NAME_LENGTH: usize = 255;

/// Name must be non-blank and at most [`MAX_NAME_LENGTH`] characters; value
/// must be non-negative.
pub fn validate_task_fields(name: &str, points_value: i64) -> Result<(), ChoreError> {
    if name.trim().is_empty() || points_value < 0 {
        return Err(ChoreError::Validation(
            "Name required and points must be ≥0".to_owned(),
        ));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ChoreError::Validation(format!(
            "Name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Debits the pool by the new task's value.
pub fn settle_create(pool: PoolBalance, task: &NewTask) -> Result<PoolBalance, ChoreError> {
    validate_task_fields(&task.name, task.points_value)?;
    debit(pool, task.points_value)
}

/// Completes (`completed = true`) or reopens a task.
pub fn settle_completion(
    pool: PoolBalance,
    task: &TaskSnapshot,
    member: &Member,
    completed: bool,
) -> Result<PoolBalance, ChoreError> {
    ensure_same_group(task, member)?;

    match (task.completed, completed) {
        (true, true) => Err(ChoreError::AlreadyCompleted),
        (false, false) => Err(ChoreError::NotCompleted),
        (false, true) => Ok(PoolBalance {
            points: checked(pool.points.checked_add(task.points_value))?,
            score: checked(pool.score.checked_add(task.points_value))?,
        }),
        (true, false) => {
            let debited = debit(pool, task.points_value)?;
            if debited.score < task.points_value {
                return Err(ChoreError::Internal(format!(
                    "group score {} below completed task value {}",
                    pool.score, task.points_value
                )));
            }
            Ok(PoolBalance {
                points: debited.points,
                score: debited.score - task.points_value,
            })
        }
    }
}

/// Returns the balance after deletion and the number of points refunded.
///
/// Only active tasks are refunded; a completed task's value stays in the score.
pub fn settle_deletion(
    pool: PoolBalance,
    task: &TaskSnapshot,
    member: &Member,
) -> Result<(PoolBalance, i64), ChoreError> {
    if task.creator_user_id != member.user_id {
        return Err(ChoreError::Forbidden(
            "only the creator can delete".to_owned(),
        ));
    }
    if task.group_id != member.group_id {
        return Err(ChoreError::Forbidden(
            "task does not belong to your group".to_owned(),
        ));
    }

    let refund = if task.completed { 0 } else { task.points_value };
    Ok((
        PoolBalance {
            points: checked(pool.points.checked_add(refund))?,
            score: pool.score,
        },
        refund,
    ))
}

/// Re-settles a task edit against the pool.
///
/// Raising an active task's value debits the difference; lowering it refunds
/// the difference. A completed task's value is already part of the score and
/// cannot be changed.
pub fn settle_edit(
    pool: PoolBalance,
    task: &TaskSnapshot,
    member: &Member,
    edit: &TaskEdit,
) -> Result<(PoolBalance, i64), ChoreError> {
    if task.creator_user_id != member.user_id {
        return Err(ChoreError::Forbidden("only the creator can edit".to_owned()));
    }
    ensure_same_group(task, member)?;
    validate_task_fields(&edit.name, edit.points_value)?;

    let delta = edit.points_value - task.points_value;
    if delta == 0 {
        return Ok((pool, 0));
    }
    if task.completed {
        return Err(ChoreError::Validation(
            "Points of a completed task cannot be changed".to_owned(),
        ));
    }

    let pool = if delta > 0 {
        debit(pool, delta)?
    } else {
        PoolBalance {
            points: checked(pool.points.checked_sub(delta))?,
            score: pool.score,
        }
    };
    Ok((pool, delta))
}

/// Adds an external top-up to the pool. The score is untouched.
pub fn settle_grant(pool: PoolBalance, amount: i64) -> Result<PoolBalance, ChoreError> {
    if amount <= 0 {
        return Err(ChoreError::Validation(
            "Granted points must be positive".to_owned(),
        ));
    }
    Ok(PoolBalance {
        points: checked(pool.points.checked_add(amount))?,
        score: pool.score,
    })
}

/// Moves the task's step counter. Any member of the task's group may do this.
pub fn apply_step(
    task: &TaskSnapshot,
    member: &Member,
    action: StepAction,
) -> Result<i32, ChoreError> {
    ensure_same_group(task, member)?;
    task.step
        .checked_add(action.delta())
        .ok_or_else(|| ChoreError::Validation("Step out of range".to_owned()))
}

fn ensure_same_group(task: &TaskSnapshot, member: &Member) -> Result<(), ChoreError> {
    if task.group_id == member.group_id {
        Ok(())
    } else {
        Err(ChoreError::Forbidden(
            "You are not in the same group as the task".to_owned(),
        ))
    }
}

fn debit(pool: PoolBalance, amount: i64) -> Result<PoolBalance, ChoreError> {
    if pool.points < amount {
        return Err(ChoreError::InsufficientPoints {
            available: pool.points,
            required: amount,
        });
    }
    Ok(PoolBalance {
        points: pool.points - amount,
        score: pool.score,
    })
}

fn checked(value: Option<i64>) -> Result<i64, ChoreError> {
    value.ok_or_else(|| ChoreError::Validation("Points out of range".to_owned()))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn member(user_id: i64, group_id: i64) -> Member {
        Member {
            user_id,
            group_id,
            username: format!("user{user_id}"),
        }
    }

    fn pool(points: i64, score: i64) -> PoolBalance {
        PoolBalance { points, score }
    }

    fn task(points_value: i64, completed: bool) -> TaskSnapshot {
        TaskSnapshot {
            id: 7,
            group_id: 1,
            creator_user_id: 1,
            points_value,
            step: 1,
            completed,
        }
    }

    fn new_task(name: &str, points_value: i64) -> NewTask {
        NewTask {
            name: name.to_owned(),
            description: String::new(),
            due_date: Utc::now(),
            points_value,
            step: 1,
        }
    }

    fn edit(points_value: i64) -> TaskEdit {
        TaskEdit {
            task_id: 7,
            name: "Laundry".to_owned(),
            description: "whites".to_owned(),
            due_date: Utc::now(),
            points_value,
        }
    }

    #[test]
    fn test_create_debits_pool() {
        assert_eq!(settle_create(pool(10, 0), &new_task("Dishes", 5)).unwrap(), pool(5, 0));
        assert_eq!(settle_create(pool(10, 0), &new_task("Dishes", 10)).unwrap(), pool(0, 0));
        assert_eq!(settle_create(pool(0, 0), &new_task("Free", 0)).unwrap(), pool(0, 0));
    }

    #[test]
    fn test_create_insufficient_points() {
        let err = settle_create(pool(3, 9), &new_task("Dishes", 10)).unwrap_err();
        assert_eq!(
            err,
            ChoreError::InsufficientPoints {
                available: 3,
                required: 10
            }
        );
    }

    #[test]
    fn test_create_validation() {
        assert!(matches!(
            settle_create(pool(10, 0), &new_task("   ", 1)),
            Err(ChoreError::Validation(_))
        ));
        assert!(matches!(
            settle_create(pool(10, 0), &new_task("Dishes", -1)),
            Err(ChoreError::Validation(_))
        ));
        let long = "x".repeat(MAX_NAME_LENGTH + 1);
        assert!(matches!(
            settle_create(pool(10, 0), &new_task(&long, 1)),
            Err(ChoreError::Validation(_))
        ));
    }

    #[test]
    fn test_complete_moves_value_to_score() {
        let next = settle_completion(pool(5, 0), &task(5, false), &member(2, 1), true).unwrap();
        assert_eq!(next, pool(10, 5));
    }

    #[test]
    fn test_toggle_twice_is_rejected() {
        assert_eq!(
            settle_completion(pool(10, 5), &task(5, true), &member(2, 1), true),
            Err(ChoreError::AlreadyCompleted)
        );
        assert_eq!(
            settle_completion(pool(10, 5), &task(5, false), &member(2, 1), false),
            Err(ChoreError::NotCompleted)
        );
    }

    #[test]
    fn test_uncomplete_requires_pool() {
        assert_eq!(
            settle_completion(pool(10, 5), &task(5, true), &member(2, 1), false).unwrap(),
            pool(5, 0)
        );
        assert_eq!(
            settle_completion(pool(2, 5), &task(5, true), &member(2, 1), false),
            Err(ChoreError::InsufficientPoints {
                available: 2,
                required: 5
            })
        );
    }

    #[test]
    fn test_completion_other_group_forbidden_before_state_check() {
        let err = settle_completion(pool(10, 5), &task(5, true), &member(2, 99), true).unwrap_err();
        assert!(matches!(err, ChoreError::Forbidden(_)));
    }

    #[test]
    fn test_delete_refunds_active_only() {
        let (next, refund) = settle_deletion(pool(5, 0), &task(5, false), &member(1, 1)).unwrap();
        assert_eq!((next, refund), (pool(10, 0), 5));

        let (next, refund) = settle_deletion(pool(10, 5), &task(5, true), &member(1, 1)).unwrap();
        assert_eq!((next, refund), (pool(10, 5), 0));
    }

    #[test]
    fn test_delete_permission_order() {
        // non-creator in another group sees the creator error first
        let err = settle_deletion(pool(5, 0), &task(5, false), &member(2, 99)).unwrap_err();
        assert_eq!(
            err,
            ChoreError::Forbidden("only the creator can delete".to_owned())
        );

        // creator who has since moved groups
        let err = settle_deletion(pool(5, 0), &task(5, false), &member(1, 99)).unwrap_err();
        assert_eq!(
            err,
            ChoreError::Forbidden("task does not belong to your group".to_owned())
        );
    }

    #[test]
    fn test_edit_resettles_delta() {
        // 5 -> 8 debits 3
        let (next, delta) = settle_edit(pool(4, 0), &task(5, false), &member(1, 1), &edit(8)).unwrap();
        assert_eq!((next, delta), (pool(1, 0), 3));

        // 5 -> 2 refunds 3
        let (next, delta) = settle_edit(pool(4, 0), &task(5, false), &member(1, 1), &edit(2)).unwrap();
        assert_eq!((next, delta), (pool(7, 0), -3));

        // increase beyond pool
        assert_eq!(
            settle_edit(pool(2, 0), &task(5, false), &member(1, 1), &edit(8)),
            Err(ChoreError::InsufficientPoints {
                available: 2,
                required: 3
            })
        );
    }

    #[test]
    fn test_edit_completed_task() {
        // descriptive edits are fine
        let (next, delta) = settle_edit(pool(4, 5), &task(5, true), &member(1, 1), &edit(5)).unwrap();
        assert_eq!((next, delta), (pool(4, 5), 0));

        assert!(matches!(
            settle_edit(pool(4, 5), &task(5, true), &member(1, 1), &edit(6)),
            Err(ChoreError::Validation(_))
        ));
    }

    #[test]
    fn test_edit_creator_only() {
        assert_eq!(
            settle_edit(pool(4, 0), &task(5, false), &member(2, 1), &edit(5)),
            Err(ChoreError::Forbidden("only the creator can edit".to_owned()))
        );
    }

    #[test]
    fn test_edit_preserves_conservation() {
        // pool + active value is unchanged by any successful edit
        let before = pool(6, 0);
        let t = task(4, false);
        for value in [0, 1, 4, 7, 10] {
            let (after, _) = settle_edit(before, &t, &member(1, 1), &edit(value)).unwrap();
            assert_eq!(after.points + value, before.points + t.points_value);
        }
    }

    #[test]
    fn test_grant() {
        assert_eq!(settle_grant(pool(5, 3), 10).unwrap(), pool(15, 3));
        assert!(matches!(settle_grant(pool(5, 3), 0), Err(ChoreError::Validation(_))));
        assert!(matches!(settle_grant(pool(5, 3), -2), Err(ChoreError::Validation(_))));
        assert_eq!(
            settle_grant(pool(1, 0), i64::MAX),
            Err(ChoreError::Validation("Points out of range".to_owned()))
        );
    }

    #[test]
    fn test_step() {
        assert_eq!(apply_step(&task(5, false), &member(2, 1), StepAction::Increment).unwrap(), 2);
        assert_eq!(apply_step(&task(5, false), &member(2, 1), StepAction::Decrement).unwrap(), 0);
        assert!(matches!(
            apply_step(&task(5, false), &member(2, 3), StepAction::Increment),
            Err(ChoreError::Forbidden(_))
        ));

        let mut maxed = task(5, false);
        maxed.step = i32::MAX;
        assert!(matches!(
            apply_step(&maxed, &member(2, 1), StepAction::Increment),
            Err(ChoreError::Validation(_))
        ));
    }
}

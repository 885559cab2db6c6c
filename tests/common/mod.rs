//! Ledger scenarios shared by the backend test suites.
//!
//! Every scenario runs against any `LedgerRepository + GroupRepository`, so the
//! in-memory, `SQLite` and `PostgreSQL` backends are held to the same behavior.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use chrono::{Duration, Utc};
use chorepool::actions::JoinGroupAction;
use chorepool::{
    ChoreError, GroupRepository, LedgerRepository, Member, NewTask, PoolBalance, TaskEdit,
    UserRepository,
};

pub fn new_task(name: &str, points_value: i64) -> NewTask {
    NewTask {
        name: name.to_owned(),
        description: String::new(),
        due_date: Utc::now() + Duration::days(3),
        points_value,
        step: 1,
    }
}

/// Creates `username` as the creator and only member of a group with `points`.
pub async fn seed_member<U, L>(
    users: &U,
    ledger: &L,
    username: &str,
    code: &str,
    points: i64,
) -> Member
where
    U: UserRepository,
    L: GroupRepository,
{
    let user = users.create_user(username, "hash").await.unwrap();
    let group = ledger
        .create_group("Flat 4", code, user.id, points)
        .await
        .unwrap();
    users.set_group(user.id, Some(group.id)).await.unwrap();

    Member {
        user_id: user.id,
        group_id: group.id,
        username: user.username,
    }
}

/// Adds `username` to an existing member's group.
pub async fn seed_housemate<U: UserRepository>(users: &U, of: &Member, username: &str) -> Member {
    let user = users.create_user(username, "hash").await.unwrap();
    users.set_group(user.id, Some(of.group_id)).await.unwrap();

    Member {
        user_id: user.id,
        group_id: of.group_id,
        username: user.username,
    }
}

async fn active_sum<L: LedgerRepository>(ledger: &L, member: &Member) -> i64 {
    ledger
        .list_tasks(member)
        .await
        .unwrap()
        .iter()
        .filter(|t| !t.completed)
        .map(|t| t.points_value)
        .sum()
}

pub async fn assert_conserved<L: LedgerRepository>(ledger: &L, member: &Member, initial: i64) {
    let pool = ledger.pool_balance(member.group_id).await.unwrap();
    assert_eq!(pool.points + active_sum(ledger, member).await, initial);
    assert!(pool.points >= 0);
}

/// Pool 50: create 20, complete, reopen, delete.
pub async fn lifecycle_walk<L: LedgerRepository>(ledger: &L, member: &Member) {
    let task = ledger.create_task(member, new_task("Dishes", 20)).await.unwrap();
    assert_eq!(task.creator_username, member.username);
    assert!(!task.completed);
    assert_eq!(
        ledger.pool_balance(member.group_id).await.unwrap(),
        PoolBalance { points: 30, score: 0 }
    );

    let change = ledger.set_completion(member, task.id, true).await.unwrap();
    assert_eq!(change.pool, PoolBalance { points: 50, score: 20 });

    assert_eq!(
        ledger.set_completion(member, task.id, true).await,
        Err(ChoreError::AlreadyCompleted)
    );

    let change = ledger.set_completion(member, task.id, false).await.unwrap();
    assert_eq!(change.pool, PoolBalance { points: 30, score: 0 });

    let deletion = ledger.delete_task(member, task.id).await.unwrap();
    assert_eq!(deletion.returned_points, 20);
    assert_eq!(deletion.pool, PoolBalance { points: 50, score: 0 });

    assert!(ledger.find_task(task.id).await.unwrap().is_none());
    assert_eq!(
        ledger.delete_task(member, task.id).await,
        Err(ChoreError::TaskNotFound)
    );
    assert_conserved(ledger, member, 50).await;
}

/// A completed task keeps its value in the score when deleted.
pub async fn delete_completed_keeps_score<L: LedgerRepository>(ledger: &L, member: &Member) {
    let task = ledger.create_task(member, new_task("Mow", 7)).await.unwrap();
    ledger.set_completion(member, task.id, true).await.unwrap();

    let deletion = ledger.delete_task(member, task.id).await.unwrap();
    assert_eq!(deletion.returned_points, 0);
    assert_eq!(deletion.pool.score, 7);
}

/// Pool 10, two concurrent creates of 10: exactly one wins.
pub async fn concurrent_creates<L: LedgerRepository>(ledger: &L, member: &Member) {
    let (a, b) = tokio::join!(
        ledger.create_task(member, new_task("First", 10)),
        ledger.create_task(member, new_task("Second", 10)),
    );

    let wins = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1, "results: {a:?} / {b:?}");
    let loser = if a.is_ok() { b } else { a };
    assert!(matches!(loser, Err(ChoreError::InsufficientPoints { .. })));

    let pool = ledger.pool_balance(member.group_id).await.unwrap();
    assert_eq!(pool.points, 0);
    assert_eq!(ledger.list_tasks(member).await.unwrap().len(), 1);
}

/// Many concurrent completions of distinct tasks never lose an update to the
/// score.
pub async fn concurrent_completions<L>(ledger: &L, member: &Member)
where
    L: LedgerRepository + Clone + 'static,
{
    let before = ledger.pool_balance(member.group_id).await.unwrap();
    let mut ids = Vec::new();
    for i in 0..8 {
        let task = ledger
            .create_task(member, new_task(&format!("Chore {i}"), 3))
            .await
            .unwrap();
        ids.push(task.id);
    }

    let mut set = tokio::task::JoinSet::new();
    for id in ids {
        let ledger = ledger.clone();
        let member = member.clone();
        set.spawn(async move { ledger.set_completion(&member, id, true).await });
    }
    while let Some(result) = set.join_next().await {
        result.unwrap().unwrap();
    }

    let pool = ledger.pool_balance(member.group_id).await.unwrap();
    assert_eq!(pool.score, before.score + 24);
    assert_eq!(pool.points, before.points);
}

/// Rejected transitions leave pool, score and task untouched.
pub async fn rejections_are_atomic<L: LedgerRepository>(
    ledger: &L,
    owner: &Member,
    other: &Member,
) {
    let task = ledger.create_task(owner, new_task("Bins", 4)).await.unwrap();
    let before = ledger.pool_balance(owner.group_id).await.unwrap();

    assert!(matches!(
        ledger.delete_task(other, task.id).await,
        Err(ChoreError::Forbidden(_))
    ));
    assert_eq!(
        ledger.set_completion(owner, task.id, false).await,
        Err(ChoreError::NotCompleted)
    );
    assert!(matches!(
        ledger
            .create_task(owner, new_task("Too big", before.points + 1))
            .await,
        Err(ChoreError::InsufficientPoints { .. })
    ));

    assert_eq!(ledger.pool_balance(owner.group_id).await.unwrap(), before);
    let stored = ledger.find_task(task.id).await.unwrap().unwrap();
    assert!(!stored.completed);
}

/// Raising an active task's value debits the difference; a completed task's
/// value is frozen.
pub async fn edit_resettles<L: LedgerRepository>(ledger: &L, member: &Member, initial: i64) {
    let task = ledger.create_task(member, new_task("Windows", 5)).await.unwrap();

    let edit = |points_value| TaskEdit {
        task_id: task.id,
        name: "Windows".to_owned(),
        description: "inside and out".to_owned(),
        due_date: task.due_date,
        points_value,
    };

    let outcome = ledger.update_task(member, edit(9)).await.unwrap();
    assert_eq!(outcome.points_delta, 4);
    assert_conserved(ledger, member, initial).await;

    let outcome = ledger.update_task(member, edit(2)).await.unwrap();
    assert_eq!(outcome.points_delta, -7);
    assert_conserved(ledger, member, initial).await;

    ledger.set_completion(member, task.id, true).await.unwrap();
    assert!(matches!(
        ledger.update_task(member, edit(3)).await,
        Err(ChoreError::Validation(_))
    ));
    // same value is still a valid edit of the text fields
    ledger.update_task(member, edit(2)).await.unwrap();

    let stored = ledger.find_task(task.id).await.unwrap().unwrap();
    assert_eq!(stored.description, "inside and out");
}

/// A grant that would overflow the pool is a validation error and leaves the
/// balance untouched.
pub async fn grant_overflow_is_rejected<L>(ledger: &L, member: &Member)
where
    L: LedgerRepository + GroupRepository,
{
    let before = ledger.pool_balance(member.group_id).await.unwrap();
    assert!(before.points > 0);

    assert_eq!(
        ledger.grant_points(member.group_id, i64::MAX).await,
        Err(ChoreError::Validation("Points out of range".to_owned()))
    );
    assert_eq!(ledger.pool_balance(member.group_id).await.unwrap(), before);
}

/// One user joining two groups at once ends up in exactly one of them.
pub async fn concurrent_joins<U, L>(users: &U, ledger: &L)
where
    U: UserRepository + Clone,
    L: GroupRepository + Clone,
{
    let founder = users.create_user("founder", "hash").await.unwrap();
    let first = ledger
        .create_group("Flat 4", "JOINAAAA", founder.id, 0)
        .await
        .unwrap();
    let second = ledger
        .create_group("Flat 5", "JOINBBBB", founder.id, 0)
        .await
        .unwrap();
    let dana = users.create_user("dana", "hash").await.unwrap();

    let join_first = JoinGroupAction::new(users.clone(), ledger.clone());
    let join_second = JoinGroupAction::new(users.clone(), ledger.clone());
    let (a, b) = tokio::join!(
        join_first.execute(&dana, "JOINAAAA"),
        join_second.execute(&dana, "JOINBBBB"),
    );

    let wins = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1, "results: {a:?} / {b:?}");
    let (winner, loser) = if a.is_ok() { (first.id, b) } else { (second.id, a) };
    assert_eq!(loser.unwrap_err(), ChoreError::AlreadyInGroup);

    let stored = users.find_by_id(dana.id).await.unwrap().unwrap();
    assert_eq!(stored.group_id, Some(winner));
}

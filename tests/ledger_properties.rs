//! Pool conservation and atomicity properties of the in-memory ledger.
//!
//! Run with: `cargo test --features mocks --test ledger_properties`

#![cfg(feature = "mocks")]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

mod common;

use chorepool::{
    ChoreError, GroupRepository, InMemoryLedger, LedgerRepository, MockUserRepository, StepAction,
    TaskEdit,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[tokio::test]
async fn test_lifecycle() {
    let users = MockUserRepository::new();
    let ledger = InMemoryLedger::new();
    let member = common::seed_member(&users, &ledger, "alice", "ABCDEFGH", 50).await;

    common::lifecycle_walk(&ledger, &member).await;
    common::delete_completed_keeps_score(&ledger, &member).await;
}

#[tokio::test]
async fn test_rejections_are_atomic() {
    let users = MockUserRepository::new();
    let ledger = InMemoryLedger::new();
    let alice = common::seed_member(&users, &ledger, "alice", "ABCDEFGH", 20).await;
    let carol = common::seed_member(&users, &ledger, "carol", "BCDEFGHI", 20).await;

    common::rejections_are_atomic(&ledger, &alice, &carol).await;
}

#[tokio::test]
async fn test_edit_resettles() {
    let users = MockUserRepository::new();
    let ledger = InMemoryLedger::new();
    let member = common::seed_member(&users, &ledger, "alice", "ABCDEFGH", 30).await;

    common::edit_resettles(&ledger, &member, 30).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_single_winner() {
    let users = MockUserRepository::new();
    let ledger = InMemoryLedger::new();
    let member = common::seed_member(&users, &ledger, "alice", "ABCDEFGH", 10).await;

    common::concurrent_creates(&ledger, &member).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_completions_keep_score() {
    let users = MockUserRepository::new();
    let ledger = InMemoryLedger::new();
    let member = common::seed_member(&users, &ledger, "alice", "ABCDEFGH", 24).await;

    common::concurrent_completions(&ledger, &member).await;
}

#[tokio::test]
async fn test_grant_overflow_is_rejected() {
    let users = MockUserRepository::new();
    let ledger = InMemoryLedger::new();
    let member = common::seed_member(&users, &ledger, "alice", "ABCDEFGH", 10).await;

    common::grant_overflow_is_rejected(&ledger, &member).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_single_group() {
    let users = MockUserRepository::new();
    let ledger = InMemoryLedger::new();

    common::concurrent_joins(&users, &ledger).await;
}

#[tokio::test]
async fn test_groups_are_isolated() {
    let users = MockUserRepository::new();
    let ledger = InMemoryLedger::new();
    let alice = common::seed_member(&users, &ledger, "alice", "ABCDEFGH", 20).await;
    let carol = common::seed_member(&users, &ledger, "carol", "BCDEFGHI", 5).await;

    let task = ledger
        .create_task(&alice, common::new_task("Dishes", 15))
        .await
        .unwrap();
    ledger.set_completion(&alice, task.id, true).await.unwrap();

    let carols = ledger.pool_balance(carol.group_id).await.unwrap();
    assert_eq!((carols.points, carols.score), (5, 0));
    assert!(ledger.list_tasks(&carol).await.unwrap().is_empty());
    assert!(matches!(
        ledger.step_task(&carol, task.id, StepAction::Increment).await,
        Err(ChoreError::Forbidden(_))
    ));
}

/// A seeded random walk over every transition. After each step, accepted or
/// refused, the pool plus active task values equals everything ever granted,
/// and the score equals the value of every completed task, deleted or not.
#[tokio::test]
async fn test_random_walk_conserves_points() {
    let users = MockUserRepository::new();
    let ledger = InMemoryLedger::new();
    let alice = common::seed_member(&users, &ledger, "alice", "ABCDEFGH", 40).await;
    let bob = common::seed_housemate(&users, &alice, "bob").await;
    let members = [&alice, &bob];

    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut granted = 40;
    let mut deleted_score = 0;

    for round in 0..400 {
        let actor = members[rng.gen_range(0..members.len())];
        let tasks = ledger.list_tasks(actor).await.unwrap();
        let target = if tasks.is_empty() {
            None
        } else {
            Some(tasks[rng.gen_range(0..tasks.len())].clone())
        };

        match (rng.gen_range(0..6), target) {
            (0, _) | (_, None) => {
                let value = rng.gen_range(0..15);
                let _ = ledger
                    .create_task(actor, common::new_task(&format!("Chore {round}"), value))
                    .await;
            }
            (1, Some(task)) => {
                let _ = ledger.set_completion(actor, task.id, !task.completed).await;
            }
            (2, Some(task)) => {
                let _ = ledger.set_completion(actor, task.id, task.completed).await;
            }
            (3, Some(task)) => {
                if let Ok(deletion) = ledger.delete_task(actor, task.id).await {
                    if task.completed {
                        deleted_score += task.points_value;
                    }
                    let refund = if task.completed { 0 } else { task.points_value };
                    assert_eq!(deletion.returned_points, refund);
                }
            }
            (4, Some(task)) => {
                let edit = TaskEdit {
                    task_id: task.id,
                    name: task.name.clone(),
                    description: task.description.clone(),
                    due_date: task.due_date,
                    points_value: rng.gen_range(0..15),
                };
                let _ = ledger.update_task(actor, edit).await;
            }
            (_, Some(_)) => {
                let amount = rng.gen_range(1..5);
                ledger.grant_points(alice.group_id, amount).await.unwrap();
                granted += amount;
            }
        }

        let tasks = ledger.list_tasks(&alice).await.unwrap();
        let pool = ledger.pool_balance(alice.group_id).await.unwrap();
        let active: i64 = tasks
            .iter()
            .filter(|t| !t.completed)
            .map(|t| t.points_value)
            .sum();
        let completed: i64 = tasks
            .iter()
            .filter(|t| t.completed)
            .map(|t| t.points_value)
            .sum();

        assert!(pool.points >= 0, "round {round}: {pool:?}");
        assert_eq!(pool.points + active, granted, "round {round}");
        assert_eq!(pool.score, completed + deleted_score, "round {round}");
    }
}

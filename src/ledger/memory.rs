//! In-process ledger backend.
//!
//! Each group's pool and tasks live in a `GroupBook` behind its own
//! `tokio::sync::Mutex`, so transitions on one group are serialized while
//! different groups proceed in parallel. A transition holds the book's lock
//! for its whole check-then-write sequence and never awaits while holding it.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::repository::{GroupRepository, LedgerRepository};
use super::rules;
use super::{
    CompletionChange, Deletion, EditOutcome, Group, Member, NewTask, PoolBalance, StepAction,
    StepChange, Task, TaskEdit, TaskSnapshot,
};
use crate::clock::{Clock, SystemClock};
use crate::ChoreError;

#[derive(Debug)]
struct GroupBook {
    group: Group,
    tasks: BTreeMap<i64, Task>,
}

impl GroupBook {
    fn set_balance(&mut self, pool: PoolBalance) {
        self.group.points = pool.points;
        self.group.points_score = pool.score;
    }
}

type SharedBook = Arc<Mutex<GroupBook>>;

#[derive(Debug)]
struct Inner {
    books: RwLock<HashMap<i64, SharedBook>>,
    codes: RwLock<HashMap<String, i64>>,
    /// task id → owning group id
    task_index: RwLock<HashMap<i64, i64>>,
    next_group_id: AtomicI64,
    next_task_id: AtomicI64,
    clock: Arc<dyn Clock>,
}

/// Ledger and group store kept entirely in memory.
///
/// Cloning is cheap and clones share state.
#[derive(Debug, Clone)]
pub struct InMemoryLedger {
    inner: Arc<Inner>,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Inner {
                books: RwLock::new(HashMap::new()),
                codes: RwLock::new(HashMap::new()),
                task_index: RwLock::new(HashMap::new()),
                next_group_id: AtomicI64::new(1),
                next_task_id: AtomicI64::new(1),
                clock,
            }),
        }
    }

    fn poisoned() -> ChoreError {
        ChoreError::Internal("ledger index lock poisoned".to_owned())
    }

    fn book(&self, group_id: i64) -> Result<SharedBook, ChoreError> {
        self.inner
            .books
            .read()
            .map_err(|_| Self::poisoned())?
            .get(&group_id)
            .cloned()
            .ok_or(ChoreError::GroupNotFound)
    }

    fn task_group(&self, task_id: i64) -> Result<Option<i64>, ChoreError> {
        Ok(self
            .inner
            .task_index
            .read()
            .map_err(|_| Self::poisoned())?
            .get(&task_id)
            .copied())
    }

    /// Snapshot of a task outside the caller's group, read only to report
    /// the right refusal. Callers must release their own book first.
    async fn foreign_task(&self, task_id: i64) -> Result<TaskSnapshot, ChoreError> {
        let group_id = self.task_group(task_id)?.ok_or(ChoreError::TaskNotFound)?;
        let book = self.book(group_id)?;
        let book = book.lock().await;
        book.tasks
            .get(&task_id)
            .map(Task::snapshot)
            .ok_or(ChoreError::TaskNotFound)
    }
}

fn other_group() -> ChoreError {
    ChoreError::Forbidden("You are not in the same group as the task".to_owned())
}

#[async_trait]
impl LedgerRepository for InMemoryLedger {
    async fn create_task(&self, member: &Member, task: NewTask) -> Result<Task, ChoreError> {
        let book = self.book(member.group_id)?;
        let mut book = book.lock().await;

        let pool = rules::settle_create(book.group.balance(), &task)?;

        let id = self.inner.next_task_id.fetch_add(1, Ordering::SeqCst);
        let created = Task {
            id,
            group_id: member.group_id,
            creator_user_id: member.user_id,
            creator_username: member.username.clone(),
            creation_date: self.inner.clock.now(),
            due_date: task.due_date,
            name: task.name,
            description: task.description,
            points_value: task.points_value,
            step: task.step,
            completed: false,
        };

        self.inner
            .task_index
            .write()
            .map_err(|_| Self::poisoned())?
            .insert(id, member.group_id);
        book.tasks.insert(id, created.clone());
        book.set_balance(pool);

        Ok(created)
    }

    async fn list_tasks(&self, member: &Member) -> Result<Vec<Task>, ChoreError> {
        let book = self.book(member.group_id)?;
        let book = book.lock().await;
        Ok(book.tasks.values().cloned().collect())
    }

    async fn find_task(&self, task_id: i64) -> Result<Option<Task>, ChoreError> {
        let Some(group_id) = self.task_group(task_id)? else {
            return Ok(None);
        };
        let book = self.book(group_id)?;
        let book = book.lock().await;
        Ok(book.tasks.get(&task_id).cloned())
    }

    async fn update_task(
        &self,
        member: &Member,
        edit: TaskEdit,
    ) -> Result<EditOutcome, ChoreError> {
        let book = self.book(member.group_id)?;
        let mut book = book.lock().await;

        let Some(snapshot) = book.tasks.get(&edit.task_id).map(Task::snapshot) else {
            drop(book);
            let foreign = self.foreign_task(edit.task_id).await?;
            return Err(rules::settle_edit(PoolBalance::default(), &foreign, member, &edit)
                .err()
                .unwrap_or_else(other_group));
        };

        let (pool, delta) = rules::settle_edit(book.group.balance(), &snapshot, member, &edit)?;

        if let Some(task) = book.tasks.get_mut(&edit.task_id) {
            task.name = edit.name;
            task.description = edit.description;
            task.due_date = edit.due_date;
            task.points_value = edit.points_value;
        }
        book.set_balance(pool);

        Ok(EditOutcome {
            task_id: edit.task_id,
            points_delta: delta,
            pool,
        })
    }

    async fn step_task(
        &self,
        member: &Member,
        task_id: i64,
        action: StepAction,
    ) -> Result<StepChange, ChoreError> {
        let book = self.book(member.group_id)?;
        let mut book = book.lock().await;

        let Some(snapshot) = book.tasks.get(&task_id).map(Task::snapshot) else {
            drop(book);
            let foreign = self.foreign_task(task_id).await?;
            return Err(rules::apply_step(&foreign, member, action)
                .err()
                .unwrap_or_else(other_group));
        };
        let step = rules::apply_step(&snapshot, member, action)?;

        if let Some(task) = book.tasks.get_mut(&task_id) {
            task.step = step;
        }

        Ok(StepChange { task_id, step })
    }

    async fn set_completion(
        &self,
        member: &Member,
        task_id: i64,
        completed: bool,
    ) -> Result<CompletionChange, ChoreError> {
        let book = self.book(member.group_id)?;
        let mut book = book.lock().await;

        let Some(snapshot) = book.tasks.get(&task_id).map(Task::snapshot) else {
            drop(book);
            let foreign = self.foreign_task(task_id).await?;
            return Err(
                rules::settle_completion(PoolBalance::default(), &foreign, member, completed)
                    .err()
                    .unwrap_or_else(other_group),
            );
        };
        let pool = rules::settle_completion(book.group.balance(), &snapshot, member, completed)?;

        if let Some(task) = book.tasks.get_mut(&task_id) {
            task.completed = completed;
        }
        book.set_balance(pool);

        Ok(CompletionChange {
            task_id,
            completed,
            points_value: snapshot.points_value,
            pool,
        })
    }

    async fn delete_task(&self, member: &Member, task_id: i64) -> Result<Deletion, ChoreError> {
        let book = self.book(member.group_id)?;
        let mut book = book.lock().await;

        let Some(snapshot) = book.tasks.get(&task_id).map(Task::snapshot) else {
            drop(book);
            let foreign = self.foreign_task(task_id).await?;
            return Err(rules::settle_deletion(PoolBalance::default(), &foreign, member)
                .err()
                .unwrap_or_else(other_group));
        };
        let (pool, returned_points) =
            rules::settle_deletion(book.group.balance(), &snapshot, member)?;

        book.tasks.remove(&task_id);
        self.inner
            .task_index
            .write()
            .map_err(|_| Self::poisoned())?
            .remove(&task_id);
        book.set_balance(pool);

        Ok(Deletion {
            task_id,
            returned_points,
            pool,
        })
    }

    async fn pool_balance(&self, group_id: i64) -> Result<PoolBalance, ChoreError> {
        let book = self.book(group_id)?;
        let book = book.lock().await;
        Ok(book.group.balance())
    }
}

#[async_trait]
impl GroupRepository for InMemoryLedger {
    async fn create_group(
        &self,
        name: &str,
        code: &str,
        creator_user_id: i64,
        initial_points: i64,
    ) -> Result<Group, ChoreError> {
        if initial_points < 0 {
            return Err(ChoreError::Validation(
                "Initial points must be ≥0".to_owned(),
            ));
        }

        let mut codes = self.inner.codes.write().map_err(|_| Self::poisoned())?;
        if codes.contains_key(code) {
            return Err(ChoreError::CodeTaken);
        }

        let id = self.inner.next_group_id.fetch_add(1, Ordering::SeqCst);
        let group = Group {
            id,
            name: name.to_owned(),
            code: code.to_owned(),
            creator_user_id,
            points: initial_points,
            points_score: 0,
            meeting_time: None,
        };

        self.inner
            .books
            .write()
            .map_err(|_| Self::poisoned())?
            .insert(
                id,
                Arc::new(Mutex::new(GroupBook {
                    group: group.clone(),
                    tasks: BTreeMap::new(),
                })),
            );
        codes.insert(code.to_owned(), id);
        drop(codes);

        Ok(group)
    }

    async fn find_group(&self, group_id: i64) -> Result<Option<Group>, ChoreError> {
        match self.book(group_id) {
            Ok(book) => Ok(Some(book.lock().await.group.clone())),
            Err(ChoreError::GroupNotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn find_group_by_code(&self, code: &str) -> Result<Option<Group>, ChoreError> {
        let id = self
            .inner
            .codes
            .read()
            .map_err(|_| Self::poisoned())?
            .get(code)
            .copied();
        match id {
            Some(id) => self.find_group(id).await,
            None => Ok(None),
        }
    }

    async fn grant_points(&self, group_id: i64, amount: i64) -> Result<PoolBalance, ChoreError> {
        let book = self.book(group_id)?;
        let mut book = book.lock().await;

        let pool = rules::settle_grant(book.group.balance(), amount)?;
        book.set_balance(pool);

        Ok(pool)
    }

    async fn delete_group(&self, group_id: i64) -> Result<(), ChoreError> {
        let book = {
            let mut codes = self.inner.codes.write().map_err(|_| Self::poisoned())?;
            let book = self
                .inner
                .books
                .write()
                .map_err(|_| Self::poisoned())?
                .remove(&group_id)
                .ok_or(ChoreError::GroupNotFound)?;
            codes.retain(|_, id| *id != group_id);
            book
        };

        let tasks = book.lock().await.tasks.len();
        if tasks > 0 {
            log::warn!(
                target: "chorepool",
                "msg=\"group deleted with tasks\", group_id={group_id}, tasks={tasks}"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    async fn ledger_with_group(points: i64) -> (InMemoryLedger, Member) {
        let ledger = InMemoryLedger::new();
        let group = ledger.create_group("Flat 4", "ABCDEFGH", 1, points).await.unwrap();
        let member = Member {
            user_id: 1,
            group_id: group.id,
            username: "alice".to_owned(),
        };
        (ledger, member)
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

    #[tokio::test]
    async fn test_create_and_list() {
        let (ledger, member) = ledger_with_group(10).await;

        let task = ledger.create_task(&member, new_task("Dishes", 4)).await.unwrap();
        assert_eq!(task.creator_username, "alice");
        assert!(!task.completed);

        let tasks = ledger.list_tasks(&member).await.unwrap();
        assert_eq!(tasks, vec![task]);
        assert_eq!(ledger.pool_balance(member.group_id).await.unwrap().points, 6);
    }

    #[tokio::test]
    async fn test_failed_create_leaves_pool() {
        let (ledger, member) = ledger_with_group(3).await;

        let err = ledger.create_task(&member, new_task("Dishes", 4)).await.unwrap_err();
        assert!(matches!(err, ChoreError::InsufficientPoints { .. }));
        assert_eq!(ledger.pool_balance(member.group_id).await.unwrap().points, 3);
        assert!(ledger.list_tasks(&member).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_group_task_is_forbidden() {
        let (ledger, alice) = ledger_with_group(10).await;
        let other = ledger.create_group("Flat 5", "ZZZZZZZZ", 2, 10).await.unwrap();
        let bob = Member {
            user_id: 2,
            group_id: other.id,
            username: "bob".to_owned(),
        };

        let task = ledger.create_task(&alice, new_task("Dishes", 4)).await.unwrap();

        assert!(matches!(
            ledger.set_completion(&bob, task.id, true).await,
            Err(ChoreError::Forbidden(_))
        ));
        assert!(matches!(
            ledger.step_task(&bob, task.id, StepAction::Increment).await,
            Err(ChoreError::Forbidden(_))
        ));
        assert_eq!(
            ledger.delete_task(&bob, task.id).await,
            Err(ChoreError::Forbidden("only the creator can delete".to_owned()))
        );
        assert_eq!(
            ledger.set_completion(&bob, 999, true).await,
            Err(ChoreError::TaskNotFound)
        );
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let (ledger, _) = ledger_with_group(0).await;
        assert_eq!(
            ledger.create_group("Other", "ABCDEFGH", 2, 0).await,
            Err(ChoreError::CodeTaken)
        );
    }

    #[tokio::test]
    async fn test_grant_points() {
        let (ledger, member) = ledger_with_group(0).await;
        let pool = ledger.grant_points(member.group_id, 25).await.unwrap();
        assert_eq!(pool.points, 25);
        assert!(matches!(
            ledger.grant_points(member.group_id, 0).await,
            Err(ChoreError::Validation(_))
        ));
        assert_eq!(
            ledger.grant_points(404, 5).await,
            Err(ChoreError::GroupNotFound)
        );
    }

    #[tokio::test]
    async fn test_concurrent_creates_never_overdraw() {
        let (ledger, member) = ledger_with_group(10).await;
        let mut handles = Vec::new();

        for i in 0..2 {
            let ledger = ledger.clone();
            let member = member.clone();
            handles.push(tokio::spawn(async move {
                ledger
                    .create_task(&member, new_task(&format!("task {i}"), 10))
                    .await
                    .is_ok()
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 1);
        assert_eq!(ledger.pool_balance(member.group_id).await.unwrap().points, 0);
    }
}

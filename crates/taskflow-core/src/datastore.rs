use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::repository::{ListRepository, Result, StoreError, TaskRepository};
use crate::task::{ListPatch, NewList, NewTask, Task, TaskList, TaskPatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    GetAll,
    GetById,
    Create,
    Update,
    Delete,
}

/// Simulated round-trip time per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latency {
    pub get_all: Duration,
    pub get_by_id: Duration,
    pub create: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for Latency {
    fn default() -> Self {
        Self {
            get_all: Duration::from_millis(250),
            get_by_id: Duration::from_millis(200),
            create: Duration::from_millis(400),
            update: Duration::from_millis(300),
            delete: Duration::from_millis(250),
        }
    }
}

impl Latency {
    pub fn none() -> Self {
        Self {
            get_all: Duration::ZERO,
            get_by_id: Duration::ZERO,
            create: Duration::ZERO,
            update: Duration::ZERO,
            delete: Duration::ZERO,
        }
    }

    pub fn for_op(&self, op: Op) -> Duration {
        match op {
            Op::GetAll => self.get_all,
            Op::GetById => self.get_by_id,
            Op::Create => self.create,
            Op::Update => self.update,
            Op::Delete => self.delete,
        }
    }
}

/// Contents of a seed file: `{"lists": [...], "tasks": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub lists: Vec<TaskList>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Seed {
    #[tracing::instrument(skip(path))]
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        debug!(file = %path.display(), "loading seed");
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed reading {}", path.display()))?;
        let seed: Seed = serde_json::from_str(&raw)
            .with_context(|| format!("failed parsing {}", path.display()))?;
        info!(
            file = %path.display(),
            lists = seed.lists.len(),
            tasks = seed.tasks.len(),
            "loaded seed"
        );
        Ok(seed)
    }

    pub fn builtin() -> Self {
        serde_json::from_str(include_str!("../data/seed.json")).unwrap_or_else(|err| {
            warn!(error = %err, "builtin seed is malformed; starting empty");
            Self::default()
        })
    }
}

trait Record: Clone {
    const ENTITY: &'static str;

    fn id(&self) -> &str;
}

impl Record for Task {
    const ENTITY: &'static str = "task";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for TaskList {
    const ENTITY: &'static str = "list";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Rows of one entity kind plus the latency and injected faults that
/// apply to them.
#[derive(Debug)]
struct Table<T> {
    rows: Mutex<Vec<T>>,
    latency: Latency,
    faults: Mutex<Vec<Op>>,
}

impl<T: Record> Table<T> {
    fn new(rows: Vec<T>, latency: Latency) -> Self {
        Self {
            rows: Mutex::new(rows),
            latency,
            faults: Mutex::new(Vec::new()),
        }
    }

    async fn enter(&self, op: Op) -> Result<()> {
        let delay = self.latency.for_op(op);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut faults = self.faults.lock();
        if let Some(idx) = faults.iter().position(|f| *f == op) {
            faults.remove(idx);
            warn!(entity = T::ENTITY, ?op, "injected failure");
            return Err(StoreError::Unavailable(format!(
                "{} {op:?} failed",
                T::ENTITY
            )));
        }
        Ok(())
    }

    fn fail_next(&self, op: Op) {
        self.faults.lock().push(op);
    }

    fn all(&self) -> Vec<T> {
        self.rows.lock().clone()
    }

    fn get(&self, id: &str) -> Result<T> {
        self.rows
            .lock()
            .iter()
            .find(|row| row.id() == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(T::ENTITY, id))
    }

    fn insert(&self, row: T) -> T {
        self.rows.lock().push(row.clone());
        row
    }

    fn modify(&self, id: &str, f: impl FnOnce(&mut T)) -> Result<T> {
        let mut rows = self.rows.lock();
        let row = rows
            .iter_mut()
            .find(|row| row.id() == id)
            .ok_or_else(|| StoreError::not_found(T::ENTITY, id))?;
        f(row);
        Ok(row.clone())
    }

    fn remove(&self, id: &str) -> Result<bool> {
        let mut rows = self.rows.lock();
        let idx = rows
            .iter()
            .position(|row| row.id() == id)
            .ok_or_else(|| StoreError::not_found(T::ENTITY, id))?;
        rows.remove(idx);
        Ok(true)
    }
}

fn next_id() -> String {
    Uuid::new_v4().to_string()
}

/// In-process task store with simulated latency.
#[derive(Debug)]
pub struct MemoryTaskStore {
    table: Table<Task>,
}

impl MemoryTaskStore {
    pub fn new(tasks: Vec<Task>, latency: Latency) -> Self {
        Self {
            table: Table::new(tasks, latency),
        }
    }

    /// Makes the next call of `op` fail with [`StoreError::Unavailable`].
    pub fn fail_next(&self, op: Op) {
        self.table.fail_next(op);
    }

    pub fn len(&self) -> usize {
        self.table.rows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TaskRepository for MemoryTaskStore {
    #[tracing::instrument(skip(self))]
    async fn get_all(&self) -> Result<Vec<Task>> {
        self.table.enter(Op::GetAll).await?;
        let tasks = self.table.all();
        debug!(count = tasks.len(), "fetched tasks");
        Ok(tasks)
    }

    #[tracing::instrument(skip(self))]
    async fn get_by_id(&self, id: &str) -> Result<Task> {
        self.table.enter(Op::GetById).await?;
        self.table.get(id)
    }

    #[tracing::instrument(skip(self, task), fields(title_len = task.title.len()))]
    async fn create(&self, task: NewTask) -> Result<Task> {
        self.table.enter(Op::Create).await?;
        let created = self.table.insert(Task::from_new(task, next_id(), Utc::now()));
        info!(id = %created.id, "created task");
        Ok(created)
    }

    #[tracing::instrument(skip(self, patch))]
    async fn update(&self, id: &str, patch: TaskPatch) -> Result<Task> {
        self.table.enter(Op::Update).await?;
        let updated = self.table.modify(id, |task| patch.apply(task))?;
        debug!(id = %updated.id, status = %updated.status, "updated task");
        Ok(updated)
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<bool> {
        self.table.enter(Op::Delete).await?;
        let removed = self.table.remove(id)?;
        info!(id, "deleted task");
        Ok(removed)
    }
}

/// In-process list store with simulated latency.
#[derive(Debug)]
pub struct MemoryListStore {
    table: Table<TaskList>,
}

impl MemoryListStore {
    pub fn new(lists: Vec<TaskList>, latency: Latency) -> Self {
        Self {
            table: Table::new(lists, latency),
        }
    }

    pub fn fail_next(&self, op: Op) {
        self.table.fail_next(op);
    }
}

#[async_trait]
impl ListRepository for MemoryListStore {
    #[tracing::instrument(skip(self))]
    async fn get_all(&self) -> Result<Vec<TaskList>> {
        self.table.enter(Op::GetAll).await?;
        let lists = self.table.all();
        debug!(count = lists.len(), "fetched lists");
        Ok(lists)
    }

    #[tracing::instrument(skip(self))]
    async fn get_by_id(&self, id: &str) -> Result<TaskList> {
        self.table.enter(Op::GetById).await?;
        self.table.get(id)
    }

    #[tracing::instrument(skip(self, list), fields(name = %list.name))]
    async fn create(&self, list: NewList) -> Result<TaskList> {
        self.table.enter(Op::Create).await?;
        let created = self
            .table
            .insert(TaskList::from_new(list, next_id(), Utc::now()));
        info!(id = %created.id, "created list");
        Ok(created)
    }

    #[tracing::instrument(skip(self, patch))]
    async fn update(&self, id: &str, patch: ListPatch) -> Result<TaskList> {
        self.table.enter(Op::Update).await?;
        self.table.modify(id, |list| patch.apply(list))
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<bool> {
        self.table.enter(Op::Delete).await?;
        let removed = self.table.remove(id)?;
        info!(id, "deleted list");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use chrono::NaiveDate;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::task::{Priority, Status};

    fn new_task(title: &str) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: None,
            priority: Priority::High,
            due_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            list_id: "A".to_string(),
            status: Status::Pending,
        }
    }

    #[tokio::test]
    async fn create_assigns_id_and_appends() {
        let store = MemoryTaskStore::new(vec![], Latency::none());
        let first = store.create(new_task("one")).await.expect("create");
        let second = store.create(new_task("two")).await.expect("create");

        assert!(!first.id.is_empty());
        assert_ne!(first.id, second.id);
        assert!(first.created_at.is_some());

        let all = store.get_all().await.expect("get_all");
        let titles: Vec<_> = all.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn update_merges_patch_and_returns_full_task() {
        let store = MemoryTaskStore::new(vec![], Latency::none());
        let created = store.create(new_task("one")).await.expect("create");

        let updated = store
            .update(&created.id, TaskPatch::status(Status::Completed))
            .await
            .expect("update");

        assert_eq!(updated.status, Status::Completed);
        assert_eq!(updated.title, "one");
        assert_eq!(updated.priority, Priority::High);
        assert_eq!(store.get_by_id(&created.id).await.expect("get"), updated);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let store = MemoryTaskStore::new(vec![], Latency::none());

        let err = store.delete("missing").await.expect_err("delete should fail");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "task not found: missing");

        let err = store
            .update("missing", TaskPatch::default())
            .await
            .expect_err("update should fail");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn delete_removes_row() {
        let store = MemoryTaskStore::new(vec![], Latency::none());
        let created = store.create(new_task("gone")).await.expect("create");

        assert!(store.delete(&created.id).await.expect("delete"));
        assert!(store.is_empty());
        assert!(store.get_by_id(&created.id).await.is_err());
    }

    #[tokio::test]
    async fn injected_fault_fires_once() {
        let store = MemoryListStore::new(vec![], Latency::none());
        store.fail_next(Op::GetAll);

        let err = store.get_all().await.expect_err("first call fails");
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(store.get_all().await.is_ok());
    }

    #[tokio::test]
    async fn list_create_initializes_bookkeeping() {
        let store = MemoryListStore::new(vec![], Latency::none());
        let list = store
            .create(NewList {
                name: "Work".to_string(),
                color: "#EF4444".to_string(),
            })
            .await
            .expect("create list");

        assert_eq!(list.task_count, 0);
        assert!(list.created_at.is_some());

        let renamed = store
            .update(
                &list.id,
                ListPatch {
                    name: Some("Office".to_string()),
                    ..ListPatch::default()
                },
            )
            .await
            .expect("rename");
        assert_eq!(renamed.name, "Office");
        assert_eq!(renamed.color, "#EF4444");
    }

    #[tokio::test(start_paused = true)]
    async fn latency_is_applied_per_operation() {
        let store = MemoryTaskStore::new(vec![], Latency::default());
        let started = tokio::time::Instant::now();
        store.get_all().await.expect("get_all");
        assert!(started.elapsed() >= Duration::from_millis(250));
    }

    #[test]
    fn seed_file_loads_lists_and_tasks() {
        let mut file = NamedTempFile::new().expect("tempfile");
        write!(
            file,
            r#"{{"lists":[{{"id":"A","name":"Home","color":"blue"}}],
                "tasks":[{{"id":"1","title":"Buy milk","listId":"A"}}]}}"#
        )
        .expect("write seed");

        let seed = Seed::load(file.path()).expect("load seed");
        assert_eq!(seed.lists.len(), 1);
        assert_eq!(seed.tasks[0].title, "Buy milk");
    }

    #[test]
    fn builtin_seed_references_known_lists() {
        let seed = Seed::builtin();
        assert!(!seed.lists.is_empty());
        for task in &seed.tasks {
            assert!(seed.lists.iter().any(|list| list.id == task.list_id));
        }
    }
}

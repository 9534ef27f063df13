use async_trait::async_trait;
use thiserror::Error;

use crate::task::{ListPatch, NewList, NewTask, Task, TaskList, TaskPatch};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Asynchronous access to stored tasks.
///
/// Every call may take an arbitrary amount of time and any call naming an
/// unknown id fails with [`StoreError::NotFound`].
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Task>>;

    async fn get_by_id(&self, id: &str) -> Result<Task>;

    /// Stores a new task and returns it with its assigned id.
    async fn create(&self, task: NewTask) -> Result<Task>;

    /// Merges `patch` into the stored task and returns the full result.
    async fn update(&self, id: &str, patch: TaskPatch) -> Result<Task>;

    async fn delete(&self, id: &str) -> Result<bool>;
}

/// Asynchronous access to stored lists. Same contract as [`TaskRepository`].
#[async_trait]
pub trait ListRepository: Send + Sync {
    async fn get_all(&self) -> Result<Vec<TaskList>>;

    async fn get_by_id(&self, id: &str) -> Result<TaskList>;

    async fn create(&self, list: NewList) -> Result<TaskList>;

    async fn update(&self, id: &str, patch: ListPatch) -> Result<TaskList>;

    async fn delete(&self, id: &str) -> Result<bool>;
}

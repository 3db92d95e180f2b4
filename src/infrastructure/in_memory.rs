//! In-memory repository implementation.
//!
//! Suitable for development, tests and single-process deployments. The
//! store is a `HashMap` behind `Arc<RwLock<...>>`; each port call takes the
//! lock exactly once.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{Task, TaskId};
use crate::infrastructure::{RepositoryError, TaskPage, TaskQuery, TaskRepository};

// =============================================================================
// In-Memory Task Repository
// =============================================================================

/// In-memory implementation of `TaskRepository`.
///
/// Cloning the repository shares the underlying storage.
///
/// # Example
///
/// ```ignore
/// use infrastructure::in_memory::InMemoryTaskRepository;
///
/// let repository = InMemoryTaskRepository::new();
/// let draft = repository.create(fields);
///
/// let saved = repository.save(&draft).await?;
/// let found = repository.find_by_id(&saved.task_id).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    tasks: Arc<RwLock<HashMap<TaskId, Task>>>,
}

impl InMemoryTaskRepository {
    /// Creates a new empty in-memory task repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no task has been stored.
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

/// Orders matches newest first, in place.
fn sort_newest_first(tasks: &mut [Task]) {
    tasks.sort_by(|left, right| right.created_at.cmp(&left.created_at));
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn save(&self, task: &Task) -> Result<Task, RepositoryError> {
        let mut guard = self.tasks.write().await;
        guard.insert(task.task_id.clone(), task.clone());
        Ok(task.clone())
    }

    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>, RepositoryError> {
        let guard = self.tasks.read().await;
        Ok(guard.get(id).cloned())
    }

    async fn find(&self, query: &TaskQuery) -> Result<TaskPage, RepositoryError> {
        let guard = self.tasks.read().await;
        let mut matching: Vec<Task> = guard
            .values()
            .filter(|task| query.predicate.matches(task))
            .cloned()
            .collect();
        drop(guard);

        let total = matching.len() as u64;
        sort_newest_first(&mut matching);
        if let Some(limit) = query.limit {
            matching.truncate(limit);
        }

        Ok(TaskPage::new(matching, total))
    }
}

// =============================================================================
// Tests
// =============================================================================

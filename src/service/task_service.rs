//! Task query and mutation service.
//!
//! Owns the create and complete rules, builds the list query, and classifies
//! persistence failures into [`ServiceError`].

use std::sync::Arc;

use crate::domain::{NewTask, Task, TaskId, TaskStatus, Timestamp};
use crate::infrastructure::{TaskClause, TaskPredicate, TaskQuery, TaskRepository};

use super::ServiceError;

/// Maximum number of tasks returned by a listing.
pub const LIST_LIMIT: usize = 5;

const CREATE_FALLBACK: &str = "Failed to create task";
const UPDATE_FALLBACK: &str = "Failed to update task";
const FETCH_FAILURE: &str = "Failed to fetch tasks";

/// Result of a listing: at most [`LIST_LIMIT`] tasks and the uncapped count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskList {
    pub tasks: Vec<Task>,
    pub total: u64,
}

/// Business operations over tasks.
#[derive(Clone)]
pub struct TaskService {
    repository: Arc<dyn TaskRepository>,
}

impl TaskService {
    /// Creates a service backed by `repository`.
    #[must_use]
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self { repository }
    }

    /// Creates a pending task and stores it.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::WriteFailure` if the store rejects the record,
    /// or `ServiceError::NotFound` if the store reports one.
    pub async fn create_task(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Task, ServiceError> {
        let draft = self.repository.create(NewTask {
            title: title.into(),
            description: description.into(),
            status: TaskStatus::Pending,
        });

        match self.repository.save(&draft).await {
            Ok(task) => {
                tracing::info!(task_id = %task.task_id, "Task created");
                Ok(task)
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to save new task");
                Err(ServiceError::from_write(error, CREATE_FALLBACK))
            }
        }
    }

    /// Marks the task with the given id as completed.
    ///
    /// An id that is not a well-formed identifier names no task and is
    /// reported as not found without touching the store.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if no task has the id, or
    /// `ServiceError::WriteFailure` if the lookup or the save fails.
    pub async fn complete_task(&self, id: &str) -> Result<Task, ServiceError> {
        let not_found = || ServiceError::NotFound(format!("Task with id {id} not found"));

        let Some(task_id) = TaskId::parse(id) else {
            tracing::debug!(id, "Rejected malformed task id");
            return Err(not_found());
        };

        let existing = self
            .repository
            .find_by_id(&task_id)
            .await
            .map_err(|error| {
                tracing::warn!(%error, %task_id, "Failed to load task for completion");
                ServiceError::from_write(error, UPDATE_FALLBACK)
            })?
            .ok_or_else(not_found)?;

        let completed = existing.complete(Timestamp::now());

        let saved = self.repository.save(&completed).await.map_err(|error| {
            tracing::warn!(%error, %task_id, "Failed to save completed task");
            ServiceError::from_write(error, UPDATE_FALLBACK)
        })?;

        tracing::info!(%task_id, "Task completed");
        Ok(saved)
    }

    /// Lists the most recent tasks that are not completed.
    ///
    /// A non-empty `search` keeps only tasks whose title or description
    /// contains it, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::RetrievalFailure` if the store cannot answer.
    pub async fn list_tasks(&self, search: Option<&str>) -> Result<TaskList, ServiceError> {
        let query = TaskQuery::new(list_predicate(search)).limit(LIST_LIMIT);

        let page = self.repository.find(&query).await.map_err(|error| {
            tracing::error!(%error, "Failed to fetch tasks");
            ServiceError::RetrievalFailure(FETCH_FAILURE.to_string())
        })?;

        Ok(TaskList {
            tasks: page.items,
            total: page.total,
        })
    }
}

/// Builds the listing predicate for an optional search term.
fn list_predicate(search: Option<&str>) -> TaskPredicate {
    let open = || TaskClause::status_not(TaskStatus::Completed);

    match search.filter(|term| !term.is_empty()) {
        Some(term) => TaskPredicate::any_of(vec![
            open().with_title_containing(term),
            open().with_description_containing(term),
        ]),
        None => TaskPredicate::any_of(vec![open()]),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Duration;
    use proptest::prelude::*;
    use rstest::rstest;

    use crate::infrastructure::{InMemoryTaskRepository, RepositoryError, TaskPage};

    // -------------------------------------------------------------------------
    // Test Doubles
    // -------------------------------------------------------------------------

    /// Store whose every call fails with the configured error.
    struct FailingRepository {
        error: RepositoryError,
        stored: Option<Task>,
    }

    #[async_trait]
    impl TaskRepository for FailingRepository {
        async fn save(&self, _task: &Task) -> Result<Task, RepositoryError> {
            Err(self.error.clone())
        }

        async fn find_by_id(&self, _id: &TaskId) -> Result<Option<Task>, RepositoryError> {
            match &self.stored {
                Some(task) => Ok(Some(task.clone())),
                None => Err(self.error.clone()),
            }
        }

        async fn find(&self, _query: &TaskQuery) -> Result<TaskPage, RepositoryError> {
            Err(self.error.clone())
        }
    }

    /// In-memory store that records every port call.
    #[derive(Default)]
    struct RecordingRepository {
        inner: InMemoryTaskRepository,
        calls: Mutex<Vec<&'static str>>,
        queries: Mutex<Vec<TaskQuery>>,
    }

    impl RecordingRepository {
        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TaskRepository for RecordingRepository {
        async fn save(&self, task: &Task) -> Result<Task, RepositoryError> {
            self.calls.lock().unwrap().push("save");
            self.inner.save(task).await
        }

        async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>, RepositoryError> {
            self.calls.lock().unwrap().push("find_by_id");
            self.inner.find_by_id(id).await
        }

        async fn find(&self, query: &TaskQuery) -> Result<TaskPage, RepositoryError> {
            self.calls.lock().unwrap().push("find");
            self.queries.lock().unwrap().push(query.clone());
            self.inner.find(query).await
        }
    }

    fn failing_service(error: RepositoryError) -> TaskService {
        TaskService::new(Arc::new(FailingRepository {
            error,
            stored: None,
        }))
    }

    fn in_memory_service() -> (TaskService, InMemoryTaskRepository) {
        let repository = InMemoryTaskRepository::new();
        (TaskService::new(Arc::new(repository.clone())), repository)
    }

    async fn seed(repository: &InMemoryTaskRepository, title: &str, offset_seconds: i64) -> Task {
        let created_at = Timestamp::from_datetime(
            *Timestamp::now().as_datetime() + Duration::seconds(offset_seconds),
        );
        let task = Task::new(TaskId::generate(), title, format!("{title} details"), created_at);
        repository.save(&task).await.unwrap()
    }

    // -------------------------------------------------------------------------
    // create_task
    // -------------------------------------------------------------------------

    #[rstest]
    #[tokio::test]
    async fn test_create_task_persists_pending_task() {
        let (service, repository) = in_memory_service();

        let task = service.create_task("Buy milk", "2% organic").await.unwrap();

        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.description, "2% organic");
        assert_eq!(task.created_at, task.updated_at);
        assert_eq!(
            repository.find_by_id(&task.task_id).await.unwrap(),
            Some(task)
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_create_task_assigns_distinct_ids() {
        let (service, _) = in_memory_service();

        let first = service.create_task("Same", "Same").await.unwrap();
        let second = service.create_task("Same", "Same").await.unwrap();

        assert_ne!(first.task_id, second.task_id);
    }

    #[rstest]
    #[case(RepositoryError::DatabaseError("disk full".to_string()), ServiceError::WriteFailure("disk full".to_string()))]
    #[case(RepositoryError::DatabaseError(String::new()), ServiceError::WriteFailure("Failed to create task".to_string()))]
    #[case(RepositoryError::NotFound("gone".to_string()), ServiceError::NotFound("gone".to_string()))]
    #[tokio::test]
    async fn test_create_task_classifies_save_errors(
        #[case] error: RepositoryError,
        #[case] expected: ServiceError,
    ) {
        let service = failing_service(error);
        assert_eq!(service.create_task("t", "d").await, Err(expected));
    }

    // -------------------------------------------------------------------------
    // complete_task
    // -------------------------------------------------------------------------

    #[rstest]
    #[tokio::test]
    async fn test_complete_task_marks_completed() {
        let (service, repository) = in_memory_service();
        let existing = seed(&repository, "Write report", 0).await;

        let completed = service
            .complete_task(&existing.task_id.to_string())
            .await
            .unwrap();

        assert_eq!(completed.task_id, existing.task_id);
        assert_eq!(completed.status, TaskStatus::Completed);
        assert!(completed.updated_at >= existing.updated_at);
        assert_eq!(completed.created_at, existing.created_at);

        let stored = repository.find_by_id(&existing.task_id).await.unwrap();
        assert_eq!(stored, Some(completed));
    }

    #[rstest]
    #[tokio::test]
    async fn test_complete_task_twice_succeeds() {
        let (service, repository) = in_memory_service();
        let existing = seed(&repository, "Write report", 0).await;
        let id = existing.task_id.to_string();

        let first = service.complete_task(&id).await.unwrap();
        let second = service.complete_task(&id).await.unwrap();

        assert_eq!(second.status, TaskStatus::Completed);
        assert!(second.updated_at >= first.updated_at);
    }

    #[rstest]
    #[tokio::test]
    async fn test_complete_unknown_id_is_not_found_without_write() {
        let repository = Arc::new(RecordingRepository::default());
        let service = TaskService::new(repository.clone());
        let id = TaskId::generate().to_string();

        let result = service.complete_task(&id).await;

        assert_eq!(
            result,
            Err(ServiceError::NotFound(format!("Task with id {id} not found")))
        );
        assert_eq!(repository.calls(), vec!["find_by_id"]);
    }

    #[rstest]
    #[case("nonexistent-id")]
    #[case("")]
    #[case("12345")]
    #[tokio::test]
    async fn test_complete_malformed_id_is_not_found_without_storage_call(#[case] id: &str) {
        let repository = Arc::new(RecordingRepository::default());
        let service = TaskService::new(repository.clone());

        let result = service.complete_task(id).await;

        assert_eq!(
            result,
            Err(ServiceError::NotFound(format!("Task with id {id} not found")))
        );
        assert!(repository.calls().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn test_complete_task_lookup_failure_is_write_failure() {
        let service = failing_service(RepositoryError::DatabaseError(String::new()));

        let result = service
            .complete_task(&TaskId::generate().to_string())
            .await;

        assert_eq!(
            result,
            Err(ServiceError::WriteFailure("Failed to update task".to_string()))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_complete_task_save_failure_is_write_failure() {
        let stored = Task::new(TaskId::generate(), "t", "d", Timestamp::now());
        let id = stored.task_id.to_string();
        let service = TaskService::new(Arc::new(FailingRepository {
            error: RepositoryError::DatabaseError("connection reset".to_string()),
            stored: Some(stored),
        }));

        let result = service.complete_task(&id).await;

        assert_eq!(
            result,
            Err(ServiceError::WriteFailure("connection reset".to_string()))
        );
    }

    // -------------------------------------------------------------------------
    // list_tasks
    // -------------------------------------------------------------------------

    #[rstest]
    #[tokio::test]
    async fn test_list_tasks_excludes_completed() {
        let (service, repository) = in_memory_service();
        seed(&repository, "Open", 0).await;
        let done = seed(&repository, "Done", 1).await;
        service.complete_task(&done.task_id.to_string()).await.unwrap();

        let list = service.list_tasks(None).await.unwrap();

        assert_eq!(list.total, 1);
        assert_eq!(list.tasks.len(), 1);
        assert_eq!(list.tasks[0].title, "Open");
    }

    #[rstest]
    #[tokio::test]
    async fn test_list_tasks_caps_at_five_newest_first() {
        let (service, repository) = in_memory_service();
        for offset in 0..7 {
            seed(&repository, &format!("Task {offset}"), offset).await;
        }

        let list = service.list_tasks(None).await.unwrap();

        assert_eq!(list.total, 7);
        let titles: Vec<&str> = list.tasks.iter().map(|task| task.title.as_str()).collect();
        assert_eq!(titles, vec!["Task 6", "Task 5", "Task 4", "Task 3", "Task 2"]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_list_tasks_search_matches_title_or_description() {
        let (service, repository) = in_memory_service();
        let by_title = Task::new(TaskId::generate(), "ALPHA launch", "plain", Timestamp::now());
        let by_description =
            Task::new(TaskId::generate(), "plain", "the Alpha notes", Timestamp::now());
        let neither = Task::new(TaskId::generate(), "beta", "gamma", Timestamp::now());
        for task in [&by_title, &by_description, &neither] {
            repository.save(task).await.unwrap();
        }

        let list = service.list_tasks(Some("alpha")).await.unwrap();

        assert_eq!(list.total, 2);
        assert!(list.tasks.iter().all(|task| task.task_id != neither.task_id));
    }

    #[rstest]
    #[tokio::test]
    async fn test_list_tasks_search_excludes_completed_matches() {
        let (service, repository) = in_memory_service();
        let done = Task::new(TaskId::generate(), "alpha", "alpha", Timestamp::now())
            .complete(Timestamp::now());
        repository.save(&done).await.unwrap();

        let list = service.list_tasks(Some("alpha")).await.unwrap();

        assert_eq!(list, TaskList::default());
    }

    #[rstest]
    #[tokio::test]
    async fn test_list_tasks_search_treats_wildcards_literally() {
        let (service, repository) = in_memory_service();
        seed(&repository, "Discount 500 off", 0).await;

        let list = service.list_tasks(Some("50%")).await.unwrap();

        assert_eq!(list.total, 0);
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[tokio::test]
    async fn test_list_tasks_without_search_builds_single_clause(#[case] search: Option<&str>) {
        let repository = Arc::new(RecordingRepository::default());
        let service = TaskService::new(repository.clone());

        service.list_tasks(search).await.unwrap();

        let queries = repository.queries.lock().unwrap().clone();
        assert_eq!(
            queries,
            vec![
                TaskQuery::new(TaskPredicate::any_of(vec![TaskClause::status_not(
                    TaskStatus::Completed
                )]))
                .limit(LIST_LIMIT)
            ]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_list_tasks_failure_is_retrieval_failure() {
        let service = failing_service(RepositoryError::DatabaseError(
            "relation \"task\" does not exist".to_string(),
        ));

        let result = service.list_tasks(None).await;

        assert_eq!(
            result,
            Err(ServiceError::RetrievalFailure(
                "Failed to fetch tasks".to_string()
            ))
        );
    }

    // -------------------------------------------------------------------------
    // Properties
    // -------------------------------------------------------------------------

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }

    fn text() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 %_]{1,16}"
    }

    proptest! {
        #[test]
        fn created_tasks_are_pending_with_equal_timestamps(title in text(), description in text()) {
            let (service, _) = in_memory_service();
            let task = block_on(service.create_task(title.clone(), description.clone())).unwrap();

            prop_assert_eq!(task.status, TaskStatus::Pending);
            prop_assert_eq!(task.created_at, task.updated_at);
            prop_assert_eq!(task.title, title);
            prop_assert_eq!(task.description, description);
        }

        #[test]
        fn listings_respect_filter_order_and_cap(
            entries in prop::collection::vec((text(), text(), any::<bool>()), 0..12),
            search in prop::option::of("[a-zA-Z%_]{0,3}"),
        ) {
            let (service, repository) = in_memory_service();
            let base = *Timestamp::now().as_datetime();
            let tasks: Vec<Task> = entries
                .iter()
                .enumerate()
                .map(|(offset, (title, description, completed))| {
                    let created_at =
                        Timestamp::from_datetime(base + Duration::seconds(offset as i64));
                    let task = Task::new(TaskId::generate(), title, description, created_at);
                    if *completed { task.complete(created_at) } else { task }
                })
                .collect();

            let list = block_on(async {
                for task in &tasks {
                    repository.save(task).await.unwrap();
                }
                service.list_tasks(search.as_deref()).await.unwrap()
            });

            let needle = search.as_deref().unwrap_or_default().to_lowercase();
            let mut expected: Vec<&Task> = tasks
                .iter()
                .filter(|task| !task.is_completed())
                .filter(|task| {
                    task.title.to_lowercase().contains(&needle)
                        || task.description.to_lowercase().contains(&needle)
                })
                .collect();
            expected.sort_by(|left, right| right.created_at.cmp(&left.created_at));

            prop_assert_eq!(list.total, expected.len() as u64);
            let expected_ids: Vec<&TaskId> = expected
                .iter()
                .take(LIST_LIMIT)
                .map(|task| &task.task_id)
                .collect();
            let listed_ids: Vec<&TaskId> = list.tasks.iter().map(|task| &task.task_id).collect();
            prop_assert_eq!(listed_ids, expected_ids);
        }

        #[test]
        fn completing_unknown_ids_never_writes(id in "[a-f0-9-]{0,36}") {
            let repository = Arc::new(RecordingRepository::default());
            let service = TaskService::new(repository.clone());

            let result = block_on(service.complete_task(&id));

            prop_assert!(matches!(result, Err(ServiceError::NotFound(_))));
            prop_assert!(!repository.calls().contains(&"save"));
        }
    }
}

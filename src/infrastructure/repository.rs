//! Persistence port for tasks.
//!
//! This module defines the storage contract the service depends on, the
//! predicate value object used to express list queries, and the errors a
//! store may report. Adapters translate [`TaskQuery`] into whatever their
//! backend understands.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{NewTask, Task, TaskId, TaskStatus, Timestamp};

// =============================================================================
// Repository Error
// =============================================================================

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// Entity was not found.
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Database connection or statement error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A stored row could not be mapped to a domain value.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl RepositoryError {
    /// Returns the message carried by the error, without the variant prefix.
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::NotFound(detail)
            | Self::DatabaseError(detail)
            | Self::SerializationError(detail) => detail,
        }
    }
}

// =============================================================================
// Predicate
// =============================================================================

/// One conjunction of conditions on a task.
///
/// Every condition that is set must hold for the clause to match. A clause
/// with no conditions matches every task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskClause {
    /// Task status must differ from this value.
    pub status_not: Option<TaskStatus>,
    /// Title must contain this text, ignoring case.
    pub title_contains: Option<String>,
    /// Description must contain this text, ignoring case.
    pub description_contains: Option<String>,
}

impl TaskClause {
    /// Creates a clause that excludes tasks with the given status.
    #[must_use]
    pub fn status_not(status: TaskStatus) -> Self {
        Self {
            status_not: Some(status),
            ..Self::default()
        }
    }

    /// Adds a case-insensitive substring condition on the title.
    #[must_use]
    pub fn with_title_containing(self, text: impl Into<String>) -> Self {
        Self {
            title_contains: Some(text.into()),
            ..self
        }
    }

    /// Adds a case-insensitive substring condition on the description.
    #[must_use]
    pub fn with_description_containing(self, text: impl Into<String>) -> Self {
        Self {
            description_contains: Some(text.into()),
            ..self
        }
    }

    /// Returns `true` if the task satisfies every condition of the clause.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.status_not.is_none_or(|status| task.status != status)
            && self
                .title_contains
                .as_deref()
                .is_none_or(|text| contains_ignore_case(&task.title, text))
            && self
                .description_contains
                .as_deref()
                .is_none_or(|text| contains_ignore_case(&task.description, text))
    }
}

/// A disjunction of [`TaskClause`]s.
///
/// An empty predicate matches every task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPredicate {
    clauses: Vec<TaskClause>,
}

impl TaskPredicate {
    /// Creates a predicate matching every task.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            clauses: Vec::new(),
        }
    }

    /// Creates a predicate matching tasks that satisfy any of the clauses.
    #[must_use]
    pub const fn any_of(clauses: Vec<TaskClause>) -> Self {
        Self { clauses }
    }

    /// Returns the clauses of the predicate.
    #[must_use]
    pub fn clauses(&self) -> &[TaskClause] {
        &self.clauses
    }

    /// Returns `true` if the task satisfies the predicate.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.clauses.is_empty() || self.clauses.iter().any(|clause| clause.matches(task))
    }
}

/// Literal, case-insensitive substring test.
///
/// No character in `needle` has pattern meaning.
#[must_use]
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

// =============================================================================
// Query
// =============================================================================

/// A filtered and optionally limited list query.
///
/// Matches are always returned most recently created first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    /// Which tasks match.
    pub predicate: TaskPredicate,
    /// Maximum number of records to return; `None` returns all matches.
    pub limit: Option<usize>,
}

impl TaskQuery {
    /// Creates a query for the given predicate with no limit.
    #[must_use]
    pub const fn new(predicate: TaskPredicate) -> Self {
        Self {
            predicate,
            limit: None,
        }
    }

    /// Caps the number of returned records.
    #[must_use]
    pub fn limit(self, limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..self
        }
    }
}

/// Records returned by a list query together with the uncapped match count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPage {
    /// The matching records, ordered and limited.
    pub items: Vec<Task>,
    /// Number of records matching the predicate, ignoring the limit.
    pub total: u64,
}

impl TaskPage {
    /// Creates a new page.
    #[must_use]
    pub const fn new(items: Vec<Task>, total: u64) -> Self {
        Self { items, total }
    }
}

// =============================================================================
// Task Repository
// =============================================================================

/// Storage contract for tasks.
///
/// Implementations own the durable representation. Callers hold a record
/// only for the duration of one request.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Builds an unsaved record from caller fields.
    ///
    /// Performs no I/O. Assigns a fresh identifier and a single timestamp
    /// used for both `created_at` and `updated_at`.
    fn create(&self, fields: NewTask) -> Task {
        Task::new(
            TaskId::generate(),
            fields.title,
            fields.description,
            Timestamp::now(),
        )
        .with_status(fields.status)
    }

    /// Durably stores a record, inserting or replacing by id.
    ///
    /// Returns the record as stored.
    async fn save(&self, task: &Task) -> Result<Task, RepositoryError>;

    /// Finds a task by its ID.
    ///
    /// Returns `Ok(None)` when no record has the given id.
    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>, RepositoryError>;

    /// Returns the records matching `query`, newest first, and the total
    /// match count.
    async fn find(&self, query: &TaskQuery) -> Result<TaskPage, RepositoryError>;
}

// =============================================================================
// Tests
// =============================================================================

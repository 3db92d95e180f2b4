//! `PostgreSQL` repository implementation.
//!
//! Tasks live in one relational table with a column per field. [`TaskRow`]
//! is the storage-side record; conversions to and from [`Task`] are the
//! only place where the two representations meet.
//!
//! # Table Schema
//!
//! ```sql
//! CREATE TABLE task (
//!     id UUID PRIMARY KEY,
//!     title TEXT NOT NULL,
//!     description TEXT NOT NULL,
//!     status VARCHAR NOT NULL DEFAULT 'Pending',
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! CREATE INDEX idx_task_created_at ON task(created_at DESC);
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::{Task, TaskId, TaskStatus, Timestamp};
use crate::infrastructure::{
    RepositoryError, TaskPage, TaskPredicate, TaskQuery, TaskRepository,
};

const TASK_COLUMNS: &str = "id, title, description, status, created_at, updated_at";

const SNAPSHOT_ISOLATION: &str = "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ";

// =============================================================================
// Row Mapping
// =============================================================================

/// A row of the `task` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TaskRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            id: *task.task_id.as_uuid(),
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status.as_str().to_string(),
            created_at: *task.created_at.as_datetime(),
            updated_at: *task.updated_at.as_datetime(),
        }
    }
}

impl TryFrom<TaskRow> for Task {
    type Error = RepositoryError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let status: TaskStatus = row
            .status
            .parse()
            .map_err(|error: crate::domain::UnknownStatus| {
                RepositoryError::SerializationError(error.to_string())
            })?;

        Ok(Self {
            task_id: TaskId::from_uuid(row.id),
            title: row.title,
            description: row.description,
            status,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn database_error(error: &sqlx::Error) -> RepositoryError {
    RepositoryError::DatabaseError(error.to_string())
}

// =============================================================================
// Query Translation
// =============================================================================

/// Appends a `WHERE` clause equivalent to `predicate`.
///
/// Substring tests use `POSITION` rather than `LIKE`, so the search text is
/// matched literally.
fn push_predicate(builder: &mut QueryBuilder<'_, Postgres>, predicate: &TaskPredicate) {
    if predicate.clauses().is_empty() {
        return;
    }

    builder.push(" WHERE ");
    for (index, clause) in predicate.clauses().iter().enumerate() {
        if index > 0 {
            builder.push(" OR ");
        }
        builder.push("(TRUE");
        if let Some(status) = clause.status_not {
            builder.push(" AND status <> ");
            builder.push_bind(status.as_str());
        }
        if let Some(text) = &clause.title_contains {
            builder.push(" AND POSITION(LOWER(");
            builder.push_bind(text.clone());
            builder.push(") IN LOWER(title)) > 0");
        }
        if let Some(text) = &clause.description_contains {
            builder.push(" AND POSITION(LOWER(");
            builder.push_bind(text.clone());
            builder.push(") IN LOWER(description)) > 0");
        }
        builder.push(")");
    }
}

fn count_statement(predicate: &TaskPredicate) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM task");
    push_predicate(&mut builder, predicate);
    builder
}

fn select_statement(query: &TaskQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {TASK_COLUMNS} FROM task"));
    push_predicate(&mut builder, &query.predicate);
    builder.push(" ORDER BY created_at DESC");
    if let Some(limit) = query.limit {
        builder.push(" LIMIT ");
        builder.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }
    builder
}

// =============================================================================
// PostgreSQL Task Repository
// =============================================================================

/// `PostgreSQL` implementation of `TaskRepository`.
///
/// # Example
///
/// ```ignore
/// use infrastructure::postgres::PostgresTaskRepository;
///
/// let pool = PgPool::connect("postgres://localhost/tasks").await?;
/// let repository = PostgresTaskRepository::new(pool);
/// let saved = repository.save(&repository.create(fields)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: PgPool,
}

impl PostgresTaskRepository {
    /// Creates a new `PostgreSQL` task repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn save(&self, task: &Task) -> Result<Task, RepositoryError> {
        let row = TaskRow::from(task);

        // created_at is left untouched on conflict.
        let stored: TaskRow = sqlx::query_as(&format!(
            "INSERT INTO task ({TASK_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (id) DO UPDATE SET \
                 title = EXCLUDED.title, \
                 description = EXCLUDED.description, \
                 status = EXCLUDED.status, \
                 updated_at = EXCLUDED.updated_at \
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(row.id)
        .bind(&row.title)
        .bind(&row.description)
        .bind(&row.status)
        .bind(row.created_at)
        .bind(row.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| database_error(&error))?;

        Task::try_from(stored)
    }

    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>, RepositoryError> {
        let row: Option<TaskRow> =
            sqlx::query_as(&format!("SELECT {TASK_COLUMNS} FROM task WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|error| database_error(&error))?;

        row.map(Task::try_from).transpose()
    }

    async fn find(&self, query: &TaskQuery) -> Result<TaskPage, RepositoryError> {
        // Count and rows must come from the same snapshot so that
        // `total >= items.len()` holds under concurrent inserts.
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| database_error(&error))?;

        sqlx::query(SNAPSHOT_ISOLATION)
            .execute(&mut *transaction)
            .await
            .map_err(|error| database_error(&error))?;

        let total: i64 = count_statement(&query.predicate)
            .build_query_scalar()
            .fetch_one(&mut *transaction)
            .await
            .map_err(|error| database_error(&error))?;

        let rows: Vec<TaskRow> = if total > 0 {
            select_statement(query)
                .build_query_as()
                .fetch_all(&mut *transaction)
                .await
                .map_err(|error| database_error(&error))?
        } else {
            Vec::new()
        };

        transaction
            .commit()
            .await
            .map_err(|error| database_error(&error))?;

        let tasks = rows
            .into_iter()
            .map(Task::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TaskPage::new(tasks, u64::try_from(total).unwrap_or_default()))
    }
}

// =============================================================================
// Tests
// =============================================================================

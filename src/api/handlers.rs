//! HTTP handlers for the Task Tracker API.
//!
//! Handlers validate the request shape, call [`TaskService`] and wrap the
//! result in the response envelope. Failures are converted to
//! [`ApiErrorResponse`] by `?`.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};

use super::dto::{
    CompleteTaskResponse, CreateTaskRequest, CreateTaskResponse, ListTasksQuery,
    ListTasksResponse, TaskResponse,
};
use super::error::ApiErrorResponse;
use crate::infrastructure::TaskRepository;
use crate::service::TaskService;

// =============================================================================
// Application State
// =============================================================================

/// Shared application dependencies.
#[derive(Clone)]
pub struct AppState {
    /// Task service backed by the configured repository.
    pub task_service: TaskService,
}

impl AppState {
    /// Creates a new `AppState` from an initialized repository.
    #[must_use]
    pub fn from_repository(task_repository: Arc<dyn TaskRepository>) -> Self {
        Self {
            task_service: TaskService::new(task_repository),
        }
    }
}

// =============================================================================
// POST /task/create-post Handler
// =============================================================================

/// Creates a new task.
///
/// # Request Body
///
/// ```json
/// {
///   "title": "Write report",
///   "description": "Quarterly numbers"
/// }
/// ```
///
/// # Response
///
/// - **201 Created**: `{"message": "Task Created", "task": {...}}`
///
/// # Errors
///
/// - **400 Bad Request**: Malformed body, validation failure, or the store
///   rejected the record
pub async fn create_task(
    State(state): State<AppState>,
    request: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateTaskResponse>), ApiErrorResponse> {
    let Json(request) = request?;
    let validated = request.validate()?;

    let task = state
        .task_service
        .create_task(validated.title, validated.description)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateTaskResponse {
            message: "Task Created".to_string(),
            task: TaskResponse::from(task),
        }),
    ))
}

// =============================================================================
// GET /task/all Handler
// =============================================================================

/// Lists the newest open tasks.
///
/// # Query Parameters
///
/// - `search`: Optional case-insensitive text matched against title or description
/// - `page`, `limit`: Accepted and validated, not applied
///
/// # Errors
///
/// - **400 Bad Request**: Malformed query parameters
/// - **500 Internal Server Error**: The store could not be queried
pub async fn list_tasks(
    State(state): State<AppState>,
    query: Result<Query<ListTasksQuery>, QueryRejection>,
) -> Result<Json<ListTasksResponse>, ApiErrorResponse> {
    let Query(query) = query?;
    query.validate()?;

    if query.page.is_some() || query.limit.is_some() {
        tracing::debug!(
            page = ?query.page,
            limit = ?query.limit,
            "Ignoring pagination parameters"
        );
    }

    let list = state.task_service.list_tasks(query.search.as_deref()).await?;

    Ok(Json(ListTasksResponse {
        message: "Tasks fetched successfully".to_string(),
        data: list.into(),
    }))
}

// =============================================================================
// PATCH /task/{id} Handler
// =============================================================================

/// Marks a task as completed.
///
/// # Errors
///
/// - **400 Bad Request**: The path segment is not valid UTF-8, or the
///   update could not be stored
/// - **404 Not Found**: No task has the given id
pub async fn complete_task(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<CompleteTaskResponse>, ApiErrorResponse> {
    let Path(id) = path?;
    let task = state.task_service.complete_task(&id).await?;

    Ok(Json(CompleteTaskResponse {
        message: "Task completed successfully".to_string(),
        data: TaskResponse::from(task),
    }))
}

// =============================================================================
// GET / Handler
// =============================================================================

/// Plain-text greeting.
pub async fn root() -> &'static str {
    "Hello World!"
}

// =============================================================================
// GET /health Handler
// =============================================================================

/// Health check response body.
#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
}

/// Health check endpoint.
///
/// # Response
///
/// - **200 OK**: Service is healthy
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// =============================================================================
// Tests
// =============================================================================

//! API module for HTTP handlers.
//!
//! This module contains route definitions and request/response handlers.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;

pub use dto::{
    CompleteTaskResponse, CreateTaskRequest, CreateTaskResponse, ListTasksQuery,
    ListTasksResponse, TaskListData, TaskResponse,
};
pub use error::{ApiError, ApiErrorResponse, FieldError, ValidationError};
pub use handlers::{
    AppState, HealthResponse, complete_task, create_task, health_check, list_tasks, root,
};
pub use routes::router;

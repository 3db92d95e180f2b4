//! Common test helpers for integration tests.
//!
//! This module provides shared utilities for building routers over test
//! repositories and reading JSON responses.
//!
//! # Usage
//!
//! ```ignore
//! mod common;
//! use common::{send, test_router};
//! ```
//!
//! # Note
//!
//! Each integration test file is compiled as its own crate, so helpers used by
//! only some files would otherwise trigger dead code warnings.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::Duration;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use task_tracker_api::api::{AppState, router};
use task_tracker_api::domain::{Task, TaskId, Timestamp};
use task_tracker_api::infrastructure::{
    InMemoryTaskRepository, RepositoryError, TaskPage, TaskQuery, TaskRepository,
};

// =============================================================================
// Router Helpers
// =============================================================================

/// Builds the full router over a fresh in-memory repository.
///
/// The repository is returned as well so tests can seed or inspect it.
pub fn test_router() -> (Router, InMemoryTaskRepository) {
    let repository = InMemoryTaskRepository::new();
    let router = router(AppState::from_repository(Arc::new(repository.clone())));
    (router, repository)
}

/// Builds the full router over a repository whose every call fails.
pub fn failing_router(message: &str) -> Router {
    router(AppState::from_repository(Arc::new(FailingTaskRepository {
        message: message.to_string(),
    })))
}

/// Sends one request through `router` and returns the status and JSON body.
///
/// A body that is not JSON is returned as a JSON string.
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    send_request(router, request).await
}

/// Sends a prepared request through `router`.
pub async fn send_request(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}

// =============================================================================
// Fixtures
// =============================================================================

/// Stores a pending task created `offset_seconds` from now.
pub async fn seed_task(
    repository: &InMemoryTaskRepository,
    title: &str,
    description: &str,
    offset_seconds: i64,
) -> Task {
    let created_at = Timestamp::from_datetime(
        *Timestamp::now().as_datetime() + Duration::seconds(offset_seconds),
    );
    let task = Task::new(TaskId::generate(), title, description, created_at);
    repository.save(&task).await.unwrap()
}

// =============================================================================
// Failing Repository
// =============================================================================

/// Repository whose every call fails with a database error.
pub struct FailingTaskRepository {
    pub message: String,
}

#[async_trait]
impl TaskRepository for FailingTaskRepository {
    async fn save(&self, _task: &Task) -> Result<Task, RepositoryError> {
        Err(RepositoryError::DatabaseError(self.message.clone()))
    }

    async fn find_by_id(&self, _id: &TaskId) -> Result<Option<Task>, RepositoryError> {
        Err(RepositoryError::DatabaseError(self.message.clone()))
    }

    async fn find(&self, _query: &TaskQuery) -> Result<TaskPage, RepositoryError> {
        Err(RepositoryError::DatabaseError(self.message.clone()))
    }
}

//! Data Transfer Objects for API requests and responses.
//!
//! This module contains DTOs that are separate from domain models,
//! providing a clean API contract.

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ValidationError;
use crate::domain::{Task, TaskStatus, Timestamp};
use crate::service::TaskList;

// =============================================================================
// Request DTOs
// =============================================================================

/// Request DTO for creating a new task.
///
/// Fields are kept loosely typed so that a missing or non-string value is
/// reported as a field error instead of a body rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTaskRequest {
    /// Title of the task.
    #[serde(default)]
    pub title: Option<Value>,
    /// Description of the task.
    #[serde(default)]
    pub description: Option<Value>,
}

/// Validated create request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCreateTask {
    pub title: String,
    pub description: String,
}

impl CreateTaskRequest {
    /// Checks both fields and reports every failure at once.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` listing each field that is missing, not a
    /// string, or blank.
    pub fn validate(&self) -> Result<ValidatedCreateTask, ValidationError> {
        match (
            validate_text("title", self.title.as_ref()),
            validate_text("description", self.description.as_ref()),
        ) {
            (Ok(title), Ok(description)) => Ok(ValidatedCreateTask { title, description }),
            (Err(error), Ok(_)) | (Ok(_), Err(error)) => Err(error),
            (Err(title_error), Err(description_error)) => {
                Err(title_error.merge(description_error))
            }
        }
    }
}

/// Validates a required, non-blank string field.
///
/// # Validation Rules
///
/// - Field must be present and not `null`
/// - Field must be a JSON string
/// - Field must not be empty after trimming
fn validate_text(field: &str, value: Option<&Value>) -> Result<String, ValidationError> {
    match value {
        None | Some(Value::Null) => Err(ValidationError::single(
            field,
            format!("{field} is required"),
        )),
        Some(Value::String(text)) => {
            let text = text.trim();
            if text.is_empty() {
                Err(ValidationError::single(
                    field,
                    format!("{field} should not be empty"),
                ))
            } else {
                Ok(text.to_string())
            }
        }
        Some(_) => Err(ValidationError::single(
            field,
            format!("{field} must be a string"),
        )),
    }
}

/// Query parameters for `GET /task/all`.
///
/// `page` and `limit` are accepted for older clients but do not change the
/// listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListTasksQuery {
    /// Case-insensitive search over title and description.
    pub search: Option<String>,
    /// Page number, must be positive.
    pub page: Option<u32>,
    /// Page size, must be positive.
    pub limit: Option<u32>,
}

impl ListTasksQuery {
    /// Checks the pagination parameters.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if `page` or `limit` is zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = ValidationError::default();
        if self.page == Some(0) {
            errors = errors.merge(ValidationError::single("page", "page must be a positive integer"));
        }
        if self.limit == Some(0) {
            errors = errors.merge(ValidationError::single(
                "limit",
                "limit must be a positive integer",
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

// =============================================================================
// Response DTOs
// =============================================================================

/// Response DTO for a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResponse {
    /// Task ID.
    pub id: String,
    /// Title of the task.
    pub title: String,
    /// Description of the task.
    pub description: String,
    /// Current status.
    pub status: TaskStatus,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
    /// Last update timestamp (RFC 3339).
    pub updated_at: String,
}

fn format_timestamp(timestamp: Timestamp) -> String {
    timestamp
        .as_datetime()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl From<&Task> for TaskResponse {
    fn from(task: &Task) -> Self {
        Self {
            id: task.task_id.to_string(),
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            created_at: format_timestamp(task.created_at),
            updated_at: format_timestamp(task.updated_at),
        }
    }
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self::from(&task)
    }
}

/// Body of `POST /task/create-post`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskResponse {
    pub message: String,
    pub task: TaskResponse,
}

/// Body of `GET /task/all`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListTasksResponse {
    pub message: String,
    pub data: TaskListData,
}

/// Listing payload: the returned tasks and the uncapped match count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskListData {
    pub tasks: Vec<TaskResponse>,
    pub total: u64,
}

impl From<TaskList> for TaskListData {
    fn from(list: TaskList) -> Self {
        Self {
            tasks: list.tasks.iter().map(TaskResponse::from).collect(),
            total: list.total,
        }
    }
}

/// Body of `PATCH /task/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteTaskResponse {
    pub message: String,
    pub data: TaskResponse,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    use crate::domain::TaskId;

    fn request(body: Value) -> CreateTaskRequest {
        serde_json::from_value(body).unwrap()
    }

    #[rstest]
    fn test_validate_create_request_trims_fields() {
        let validated = request(json!({"title": "  Buy milk ", "description": "2%"}))
            .validate()
            .unwrap();

        assert_eq!(
            validated,
            ValidatedCreateTask {
                title: "Buy milk".to_string(),
                description: "2%".to_string(),
            }
        );
    }

    #[rstest]
    #[case(json!({"description": "d"}), "title", "title is required")]
    #[case(json!({"title": null, "description": "d"}), "title", "title is required")]
    #[case(json!({"title": "   ", "description": "d"}), "title", "title should not be empty")]
    #[case(json!({"title": 42, "description": "d"}), "title", "title must be a string")]
    #[case(json!({"title": "t", "description": ""}), "description", "description should not be empty")]
    #[case(json!({"title": "t", "description": ["d"]}), "description", "description must be a string")]
    fn test_validate_create_request_rejects_field(
        #[case] body: Value,
        #[case] field: &str,
        #[case] message: &str,
    ) {
        let error = request(body).validate().unwrap_err();

        assert_eq!(error.errors.len(), 1);
        assert_eq!(error.errors[0].field, field);
        assert_eq!(error.errors[0].message, message);
    }

    #[rstest]
    fn test_validate_create_request_reports_both_fields() {
        let error = request(json!({})).validate().unwrap_err();
        let fields: Vec<&str> = error.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["title", "description"]);
    }

    #[rstest]
    #[case(None, None, true)]
    #[case(Some(1), Some(5), true)]
    #[case(Some(0), None, false)]
    #[case(None, Some(0), false)]
    fn test_list_query_validation(
        #[case] page: Option<u32>,
        #[case] limit: Option<u32>,
        #[case] valid: bool,
    ) {
        let query = ListTasksQuery {
            search: None,
            page,
            limit,
        };
        assert_eq!(query.validate().is_ok(), valid);
    }

    #[rstest]
    fn test_task_response_shape() {
        let timestamp = Timestamp::from_datetime(
            chrono::DateTime::parse_from_rfc3339("2024-03-01T12:30:00Z")
                .unwrap()
                .with_timezone(&chrono::Utc),
        );
        let task = Task::new(TaskId::generate(), "Title", "Description", timestamp);

        let json = serde_json::to_value(TaskResponse::from(&task)).unwrap();

        assert_eq!(json["id"], task.task_id.to_string());
        assert_eq!(json["status"], "Pending");
        assert_eq!(json["created_at"], "2024-03-01T12:30:00.000Z");
        assert_eq!(json["updated_at"], "2024-03-01T12:30:00.000Z");
        assert_eq!(json.as_object().unwrap().len(), 6);
    }
}

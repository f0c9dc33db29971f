/// Task endpoints
///
/// All routes require an authenticated session; the router layer resolves
/// the bearer token to a `CurrentUser` before any handler here runs.
///
/// # Endpoints
///
/// - `GET /tasks` - list the caller's tasks
/// - `POST /tasks` - create a task
/// - `PATCH /tasks/{id}` - sparse update of one task
/// - `DELETE /tasks/{id}` - delete one task

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use tasknest_shared::auth::middleware::CurrentUser;
use tasknest_shared::models::task::{deadline, CreateTask, TaskPatch, TaskPriority, TaskView};

/// Longest accepted description, matching the stored column's intent
const MAX_DESCRIPTION_CHARS: usize = 20000;

/// Create request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Task title
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: String,

    /// Free-form description
    #[serde(default)]
    #[validate(length(max = 20000, message = "Description must be at most 20000 characters"))]
    pub description: String,

    /// Deadline: RFC 3339 datetime, naive datetime, or bare date
    #[serde(default, deserialize_with = "deadline::deserialize")]
    pub deadline: Option<DateTime<Utc>>,

    /// Priority, defaults to medium
    #[serde(default)]
    pub priority: TaskPriority,
}

/// Delete confirmation
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// `GET /tasks`
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<TaskView>>> {
    let tasks = state.tasks.list(user.id).await?;

    let now = Utc::now();
    let views = tasks
        .iter()
        .map(|task| TaskView::from_task(task, now))
        .collect();

    Ok(Json(views))
}

/// `POST /tasks`
///
/// # Errors
///
/// - `422 Unprocessable Entity`: empty title or oversized description
pub async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskView>)> {
    req.validate().map_err(ApiError::from_validation)?;

    let task = state
        .tasks
        .create(CreateTask {
            owner_id: user.id,
            title: req.title,
            description: req.description,
            priority: req.priority,
            deadline: req.deadline,
        })
        .await?;

    let view = TaskView::from_task(&task, Utc::now());
    Ok((StatusCode::CREATED, Json(view)))
}

/// `PATCH /tasks/{id}`
///
/// Sparse update: only keys present in the body are applied; `deadline`
/// and `description` accept an explicit null (clear / reset to empty).
///
/// # Errors
///
/// - `400 Bad Request`: malformed id, or no fields provided
/// - `404 Not Found`: no task with that id owned by the caller
/// - `422 Unprocessable Entity`: null title/status/priority, empty title,
///   or oversized description
pub async fn update_task(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(task_id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> ApiResult<Json<TaskView>> {
    validate_patch(&patch)?;

    let task = state.tasks.patch(user.id, &task_id, patch).await?;

    let view = TaskView::from_task(&task, Utc::now());
    Ok(Json(view))
}

/// `DELETE /tasks/{id}`
///
/// # Errors
///
/// - `400 Bad Request`: malformed id
/// - `404 Not Found`: no task with that id owned by the caller
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    state.tasks.delete(user.id, &task_id).await?;

    Ok(Json(DeleteResponse {
        message: "Task deleted successfully".to_string(),
    }))
}

/// Field-level checks on a parsed patch. Title, status, and priority are
/// non-nullable; an explicit null for them never reaches the store.
fn validate_patch(patch: &TaskPatch) -> Result<(), ApiError> {
    let mut errors = Vec::new();

    match &patch.title {
        Some(None) => errors.push(detail("title", "Title cannot be null")),
        Some(Some(title)) if title.trim().is_empty() => {
            errors.push(detail("title", "Title must not be empty"))
        }
        _ => {}
    }

    if let Some(Some(description)) = &patch.description {
        if description.chars().count() > MAX_DESCRIPTION_CHARS {
            errors.push(detail(
                "description",
                "Description must be at most 20000 characters",
            ));
        }
    }

    if matches!(patch.status, Some(None)) {
        errors.push(detail("status", "Status cannot be null"));
    }

    if matches!(patch.priority, Some(None)) {
        errors.push(detail("priority", "Priority cannot be null"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::ValidationError(errors))
    }
}

fn detail(field: &str, message: &str) -> ValidationErrorDetail {
    ValidationErrorDetail {
        field: field.to_string(),
        message: message.to_string(),
    }
}

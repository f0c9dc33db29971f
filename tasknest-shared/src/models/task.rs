/// Task model and store operations
///
/// Tasks are owner-scoped work items. Every task has exactly one owner for
/// its lifetime; reads, patches, and deletes always filter on both the task
/// id and the caller's id, so cross-owner access is impossible at the store
/// level rather than by handler discipline.
///
/// Status and priority are closed enums in memory; their fixed string
/// tokens appear only in the store and in JSON.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title TEXT NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status TEXT NOT NULL DEFAULT 'not_started',
///     priority TEXT NOT NULL DEFAULT 'medium',
///     deadline TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task progress state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Finished,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::NotStarted
    }
}

impl TaskStatus {
    /// Fixed string token used at the store boundary
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not_started",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Finished => "finished",
        }
    }
}

/// Task priority level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

impl TaskPriority {
    /// Fixed string token used at the store boundary
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Urgent => "urgent",
        }
    }
}

/// Task record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task id
    pub id: Uuid,

    /// Owning account; set at creation, never mutated
    pub owner_id: Uuid,

    /// Non-empty title
    pub title: String,

    /// Free-form description, default empty
    pub description: String,

    /// Progress state
    pub status: TaskStatus,

    /// Priority level
    pub priority: TaskPriority,

    /// Optional deadline, always UTC
    pub deadline: Option<DateTime<Utc>>,

    /// Set once at creation
    pub created_at: DateTime<Utc>,

    /// Refreshed on every successful patch
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub deadline: Option<DateTime<Utc>>,
}

/// Sparse update set for a task
///
/// Distinguishes three states per field, taken directly from the parsed
/// request body rather than inferred afterwards:
///
/// - key absent → `None` → field untouched
/// - key present with null → `Some(None)`
/// - key present with a value → `Some(Some(value))`
///
/// Whether an explicit null is meaningful is per-field: `deadline` clears
/// the deadline, `description` resets to the empty default; `title`,
/// `status`, and `priority` are non-nullable and the handler rejects
/// `Some(None)` for them before the patch reaches the store.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    #[serde(default, deserialize_with = "double_option")]
    pub title: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub status: Option<Option<TaskStatus>>,

    #[serde(default, deserialize_with = "double_option")]
    pub priority: Option<Option<TaskPriority>>,

    #[serde(default, deserialize_with = "deadline::deserialize_patch")]
    pub deadline: Option<Option<DateTime<Utc>>>,
}

impl TaskPatch {
    /// True when no key was present in the request at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.deadline.is_none()
    }
}

/// Deserializes a field into `Some(inner)` so that an absent key (handled
/// by `#[serde(default)]`) stays distinguishable from an explicit null.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Deadline parsing and normalization
///
/// A deadline may arrive as an RFC 3339 datetime (any offset), a naive
/// datetime (assumed UTC), or a bare calendar date. Bare dates normalize to
/// that date's 23:59:59 UTC; everything else converts to UTC.
pub mod deadline {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use serde::Deserialize;

    /// Parses a deadline string into a UTC timestamp.
    pub fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(dt.with_timezone(&Utc));
        }

        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(naive.and_utc());
        }

        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            let end_of_day = date
                .and_hms_opt(23, 59, 59)
                .ok_or_else(|| format!("invalid deadline date: {raw}"))?;
            return Ok(end_of_day.and_utc());
        }

        Err(format!("invalid deadline: {raw}"))
    }

    /// Serde helper for create bodies: absent or null → `None`.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) => parse(&s).map(Some).map_err(serde::de::Error::custom),
        }
    }

    /// Serde helper for patch bodies: null → `Some(None)` (clear), a value
    /// → `Some(Some(parsed))`. Combined with `#[serde(default)]`, an absent
    /// key stays `None`.
    pub fn deserialize_patch<'de, D>(
        deserializer: D,
    ) -> Result<Option<Option<DateTime<Utc>>>, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(Some(None)),
            Some(s) => parse(&s)
                .map(|dt| Some(Some(dt)))
                .map_err(serde::de::Error::custom),
        }
    }
}

/// Task projection returned to clients, with derived deadline fields
///
/// The derived fields are computed at read time against the clock passed
/// in, never stored. With no deadline all three are absent/null and
/// `is_overdue` is false.
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub user_id: Uuid,
    pub deadline: Option<DateTime<Utc>>,
    pub time_left_seconds: Option<i64>,
    pub time_left_human: Option<String>,
    pub is_overdue: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskView {
    /// Builds the client view of a task as of `now`.
    pub fn from_task(task: &Task, now: DateTime<Utc>) -> Self {
        let (time_left_seconds, time_left_human, is_overdue) = match task.deadline {
            Some(deadline) => {
                let secs = (deadline - now).num_seconds();
                (Some(secs), Some(format_time_left(secs)), secs < 0)
            }
            None => (None, None, false),
        };

        Self {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            priority: task.priority,
            user_id: task.owner_id,
            deadline: task.deadline,
            time_left_seconds,
            time_left_human,
            is_overdue,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

/// Formats a signed seconds delta as `"{d}d {h}h {m}m {s}s left"`, or the
/// same with an `overdue` suffix when the delta is negative.
pub fn format_time_left(seconds: i64) -> String {
    let overdue = seconds < 0;
    let mut total = seconds.unsigned_abs();

    let days = total / 86400;
    total %= 86400;
    let hours = total / 3600;
    total %= 3600;
    let minutes = total / 60;
    let secs = total % 60;

    let text = format!("{days}d {hours}h {minutes}m {secs}s");
    if overdue {
        format!("{text} overdue")
    } else {
        format!("{text} left")
    }
}

impl Task {
    /// Creates a new task owned by `data.owner_id`, in `not_started` state.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (owner_id, title, description, status, priority, deadline)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, owner_id, title, description, status, priority, deadline,
                      created_at, updated_at
            "#,
        )
        .bind(data.owner_id)
        .bind(data.title)
        .bind(data.description)
        .bind(TaskStatus::NotStarted)
        .bind(data.priority)
        .bind(data.deadline)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by id, scoped to its owner.
    pub async fn find_by_id_and_owner(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, owner_id, title, description, status, priority, deadline,
                   created_at, updated_at
            FROM tasks
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists all tasks owned by `owner_id`.
    ///
    /// No ORDER BY: the order is store-native and unspecified.
    pub async fn list_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, owner_id, title, description, status, priority, deadline,
                   created_at, updated_at
            FROM tasks
            WHERE owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Applies a sparse patch to a task, scoped to id AND owner in one
    /// atomic update.
    ///
    /// Only fields whose key was present in the patch appear in the SET
    /// clause; `updated_at` is always refreshed. Returns `None` when no
    /// task with that id is owned by the caller.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
        patch: TaskPatch,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build the SET clause from the fields that were present.
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 2; // $1 = id, $2 = owner_id

        if patch.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if patch.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if patch.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if patch.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }
        if patch.deadline.is_some() {
            bind_count += 1;
            query.push_str(&format!(", deadline = ${}", bind_count));
        }

        query.push_str(
            " WHERE id = $1 AND owner_id = $2 \
             RETURNING id, owner_id, title, description, status, priority, deadline, \
             created_at, updated_at",
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id).bind(owner_id);

        if let Some(title) = patch.title {
            // The boundary rejects explicit null for title/status/priority.
            q = q.bind(title.unwrap_or_default());
        }
        if let Some(description) = patch.description {
            // Explicit null resets description to its empty default.
            q = q.bind(description.unwrap_or_default());
        }
        if let Some(status) = patch.status {
            q = q.bind(status.unwrap_or_default());
        }
        if let Some(priority) = patch.priority {
            q = q.bind(priority.unwrap_or_default());
        }
        if let Some(deadline) = patch.deadline {
            q = q.bind(deadline);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Deletes a task, scoped to id AND owner in a single operation.
    ///
    /// Returns false when zero rows matched (absent or owned by someone
    /// else — indistinguishable by design).
    pub async fn delete(pool: &PgPool, id: Uuid, owner_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

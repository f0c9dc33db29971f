/// Task service
///
/// Owner-scoped orchestration of task records. Every operation takes the
/// authenticated caller's id and folds it into the store filter, so a task
/// owned by someone else is indistinguishable from one that does not exist.

use sqlx::PgPool;
use uuid::Uuid;

use tasknest_shared::models::task::{CreateTask, Task, TaskPatch};

/// Error type for task service operations
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// No task with that id is owned by the caller
    #[error("task not found")]
    NotFound,

    /// Patch carried no fields at all
    #[error("no fields provided to update")]
    NoFieldsProvided,

    /// Task id is not a valid identifier
    #[error("invalid task id")]
    InvalidIdentifier,

    /// Store operation failed
    #[error("database error")]
    Database(#[from] sqlx::Error),
}

/// Task orchestrator
pub struct TaskService {
    db: PgPool,
}

impl TaskService {
    /// Creates the service with its injected store handle.
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Creates a task owned by the caller. Status starts at `not_started`.
    pub async fn create(&self, data: CreateTask) -> Result<Task, TaskError> {
        let task = Task::create(&self.db, data).await?;
        Ok(task)
    }

    /// Lists all of the caller's tasks, in store-native (unspecified) order.
    pub async fn list(&self, owner_id: Uuid) -> Result<Vec<Task>, TaskError> {
        let tasks = Task::list_by_owner(&self.db, owner_id).await?;
        Ok(tasks)
    }

    /// Applies a sparse patch to one of the caller's tasks.
    ///
    /// Only fields present in the patch change; `updated_at` is always
    /// refreshed. The final update filters on id AND owner in one atomic
    /// operation, so a concurrent delete degrades to `NotFound`.
    pub async fn patch(
        &self,
        owner_id: Uuid,
        task_id: &str,
        patch: TaskPatch,
    ) -> Result<Task, TaskError> {
        let id = parse_task_id(task_id)?;

        Task::find_by_id_and_owner(&self.db, id, owner_id)
            .await?
            .ok_or(TaskError::NotFound)?;

        if patch.is_empty() {
            return Err(TaskError::NoFieldsProvided);
        }

        Task::update(&self.db, id, owner_id, patch)
            .await?
            .ok_or(TaskError::NotFound)
    }

    /// Deletes one of the caller's tasks.
    ///
    /// Single delete scoped to id AND owner; zero rows matched means
    /// `NotFound`, never a cross-owner deletion.
    pub async fn delete(&self, owner_id: Uuid, task_id: &str) -> Result<(), TaskError> {
        let id = parse_task_id(task_id)?;

        if Task::delete(&self.db, id, owner_id).await? {
            Ok(())
        } else {
            Err(TaskError::NotFound)
        }
    }
}

fn parse_task_id(raw: &str) -> Result<Uuid, TaskError> {
    Uuid::parse_str(raw).map_err(|_| TaskError::InvalidIdentifier)
}

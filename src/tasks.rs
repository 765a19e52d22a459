use std::sync::Arc;

use crate::error::AppError;
use crate::models::task::normalize_title;
use crate::models::{Task, TaskChanges};
use crate::notifier::{dispatch_task_created, Notifier};
use crate::store::{TaskStore, UserStore};

/// Owner-scoped CRUD over tasks.
///
/// Titles are trimmed before they are stored; a title that is empty after trimming is
/// rejected. Lookups for update and delete are keyed on both the task id and the
/// caller's id, so another user's task reads as `AppError::NotFound`.
#[derive(Clone)]
pub struct TaskService {
    tasks: Arc<dyn TaskStore>,
    users: Arc<dyn UserStore>,
    notifier: Arc<dyn Notifier>,
}

impl TaskService {
    pub fn new(
        tasks: Arc<dyn TaskStore>,
        users: Arc<dyn UserStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            tasks,
            users,
            notifier,
        }
    }

    /// Creates a task and queues the notification email.
    pub async fn create(&self, user_id: i32, title: &str) -> Result<Task, AppError> {
        let title = normalize_title(title)?;
        let owner = self
            .users
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Account no longer exists".into()))?;

        let task = self.tasks.insert_task(owner.id, &title).await?;
        log::info!("User {} created task {}", owner.id, task.id);

        dispatch_task_created(self.notifier.clone(), owner, task.title.clone());
        Ok(task)
    }

    pub async fn list(&self, user_id: i32) -> Result<Vec<Task>, AppError> {
        self.tasks.list_tasks(user_id).await
    }

    pub async fn update(
        &self,
        user_id: i32,
        task_id: i32,
        changes: &TaskChanges,
    ) -> Result<Task, AppError> {
        let changes = changes.normalized()?;
        self.tasks
            .update_task(user_id, task_id, &changes)
            .await?
            .ok_or_else(not_found)
    }

    pub async fn delete(&self, user_id: i32, task_id: i32) -> Result<(), AppError> {
        if self.tasks.delete_task(user_id, task_id).await? {
            log::info!("User {} deleted task {}", user_id, task_id);
            Ok(())
        } else {
            Err(not_found())
        }
    }
}

fn not_found() -> AppError {
    AppError::NotFound("To-do not found".into())
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

/// Maximum stored title length, matching the `todos.title` column.
pub const MAX_TITLE_LEN: usize = 200;

/// A to-do item, exclusively owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct Task {
    /// Surrogate key assigned by the store.
    pub id: i32,
    /// Always stored trimmed and non-empty.
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    /// Owner; never changes after creation.
    pub user_id: i32,
}

/// Payload for `POST /todos`.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: Option<String>,
}

/// Payload for `PUT /todos/{id}`. Absent fields keep their stored value.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

/// Trims a title and rejects it if nothing is left or it does not fit the column.
pub fn normalize_title(raw: &str) -> Result<String, AppError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Title is required".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::Validation(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }
    Ok(title.to_string())
}

impl TaskChanges {
    /// Returns a copy with the title normalized, if one was supplied.
    pub fn normalized(&self) -> Result<TaskChanges, AppError> {
        let title = self.title.as_deref().map(normalize_title).transpose()?;
        Ok(TaskChanges {
            title,
            completed: self.completed,
        })
    }

    /// Applies the changes to a task in place.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }
}

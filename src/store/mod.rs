//! Persistence ports for users and tasks.
//!
//! Handlers and services only ever see these traits. `postgres` backs them with
//! `sqlx` in production; `memory` is a self-contained implementation used by tests
//! that enforces the same uniqueness, ownership and cascade rules.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{NewUser, Task, TaskChanges, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user. Fails with `AppError::Conflict` if the email or user name is taken.
    async fn insert_user(&self, new_user: NewUser) -> Result<User, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_user_by_id(&self, id: i32) -> Result<Option<User>, AppError>;

    /// Removes a user together with every task they own. Returns `false` if absent.
    async fn delete_user(&self, id: i32) -> Result<bool, AppError>;
}

/// Task persistence. Every lookup is keyed on `(task_id, user_id)` so a task owned by
/// someone else is indistinguishable from a missing one.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, user_id: i32, title: &str) -> Result<Task, AppError>;

    /// Tasks owned by `user_id`, in insertion order.
    async fn list_tasks(&self, user_id: i32) -> Result<Vec<Task>, AppError>;

    async fn update_task(
        &self,
        user_id: i32,
        task_id: i32,
        changes: &TaskChanges,
    ) -> Result<Option<Task>, AppError>;

    async fn delete_task(&self, user_id: i32, task_id: i32) -> Result<bool, AppError>;
}

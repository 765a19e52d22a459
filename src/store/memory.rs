use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use super::{TaskStore, UserStore};
use crate::error::AppError;
use crate::models::user::{MAX_EMAIL_LEN, MAX_USER_NAME_LEN};
use crate::models::{NewUser, Task, TaskChanges, User};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    tasks: Vec<Task>,
    next_user_id: i32,
    next_task_id: i32,
}

/// Process-local store with the same constraints as the Postgres schema.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn user_count(&self) -> usize {
        self.tables().users.len()
    }

    pub fn task_count(&self) -> usize {
        self.tables().tasks.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, new_user: NewUser) -> Result<User, AppError> {
        if new_user.user_name.chars().count() > MAX_USER_NAME_LEN
            || new_user.email.chars().count() > MAX_EMAIL_LEN
        {
            return Err(AppError::Database(
                "value too long for type character varying(120)".into(),
            ));
        }
        let mut tables = self.tables();
        let taken = tables
            .users
            .iter()
            .any(|u| u.email == new_user.email || u.user_name == new_user.user_name);
        if taken {
            return Err(AppError::Conflict("Email or username already exists".into()));
        }
        tables.next_user_id += 1;
        let user = User {
            id: tables.next_user_id,
            user_name: new_user.user_name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.tables().users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        Ok(self.tables().users.iter().find(|u| u.id == id).cloned())
    }

    async fn delete_user(&self, id: i32) -> Result<bool, AppError> {
        let mut tables = self.tables();
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        if tables.users.len() == before {
            return Ok(false);
        }
        tables.tasks.retain(|t| t.user_id != id);
        Ok(true)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, user_id: i32, title: &str) -> Result<Task, AppError> {
        let mut tables = self.tables();
        if !tables.users.iter().any(|u| u.id == user_id) {
            return Err(AppError::Database(format!(
                "todos.user_id {} violates foreign key",
                user_id
            )));
        }
        tables.next_task_id += 1;
        let task = Task {
            id: tables.next_task_id,
            title: title.to_string(),
            completed: false,
            created_at: Utc::now(),
            user_id,
        };
        tables.tasks.push(task.clone());
        Ok(task)
    }

    async fn list_tasks(&self, user_id: i32) -> Result<Vec<Task>, AppError> {
        Ok(self
            .tables()
            .tasks
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_task(
        &self,
        user_id: i32,
        task_id: i32,
        changes: &TaskChanges,
    ) -> Result<Option<Task>, AppError> {
        let mut tables = self.tables();
        let task = tables
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id && t.user_id == user_id);
        Ok(task.map(|task| {
            changes.apply_to(task);
            task.clone()
        }))
    }

    async fn delete_task(&self, user_id: i32, task_id: i32) -> Result<bool, AppError> {
        let mut tables = self.tables();
        let before = tables.tasks.len();
        tables
            .tasks
            .retain(|t| !(t.id == task_id && t.user_id == user_id));
        Ok(tables.tasks.len() < before)
    }
}

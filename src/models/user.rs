use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Column widths of `users.user_name` and `users.email`, in characters.
pub const MAX_USER_NAME_LEN: usize = 120;
pub const MAX_EMAIL_LEN: usize = 120;

/// An account, created either by password registration or by Google sign-in.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    #[serde(rename = "userName")]
    pub user_name: String,
    pub email: String,
    /// `None` for accounts created through federation; those cannot log in with a password.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Values for a user row about to be inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_name: String,
    pub email: String,
    pub password_hash: Option<String>,
}

impl User {
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

pub mod extractors;
pub mod middleware;
pub mod password;
pub mod session;
pub mod token;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;
use crate::models::user::{MAX_EMAIL_LEN, MAX_USER_NAME_LEN};
use crate::models::NewUser;
use crate::store::UserStore;

// Re-export necessary items
pub use extractors::AuthenticatedUserId;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use session::OAuthStateSession;
pub use token::{Claims, TokenService};

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(
        required(message = "Email and password are required"),
        length(min = 1, message = "Email and password are required")
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "Email and password are required"),
        length(min = 1, message = "Email and password are required")
    )]
    pub password: Option<String>,
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address for the new account; the account's external identity.
    #[validate(
        required(message = "Email and password are required"),
        email(message = "Email must be a valid address"),
        length(max = 120, message = "Email must be at most 120 characters")
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "Email and password are required"),
        length(min = 1, message = "Email and password are required")
    )]
    pub password: Option<String>,
    /// Display name, unique across accounts.
    #[serde(rename = "userName")]
    #[validate(
        required(message = "userName is required"),
        length(min = 1, max = 120, message = "userName must be 1 to 120 characters")
    )]
    pub user_name: Option<String>,
}

/// Body returned by a successful password login.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
}

/// Password registration and login.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: TokenService,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, tokens: TokenService, bcrypt_cost: u32) -> Self {
        Self {
            users,
            tokens,
            bcrypt_cost,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Creates a password account and returns its id.
    ///
    /// Only a salted bcrypt hash of the password is stored.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        user_name: &str,
    ) -> Result<i32, AppError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AppError::Validation("Email and password are required".into()));
        }
        let (email, user_name) = (email.trim(), user_name.trim());
        if user_name.is_empty() {
            return Err(AppError::Validation("userName is required".into()));
        }
        if email.chars().count() > MAX_EMAIL_LEN {
            return Err(AppError::Validation(format!(
                "Email must be at most {} characters",
                MAX_EMAIL_LEN
            )));
        }
        if user_name.chars().count() > MAX_USER_NAME_LEN {
            return Err(AppError::Validation(format!(
                "userName must be at most {} characters",
                MAX_USER_NAME_LEN
            )));
        }

        let password_hash = hash_password(password, self.bcrypt_cost)?;
        let inserted = self
            .users
            .insert_user(NewUser {
                user_name: user_name.to_string(),
                email: email.to_string(),
                password_hash: Some(password_hash),
            })
            .await;
        let user = match inserted {
            Ok(user) => user,
            Err(AppError::Conflict(_)) => return Err(self.which_conflict(email).await?),
            Err(e) => return Err(e),
        };
        log::info!("Registered user {}", user.id);
        Ok(user.id)
    }

    /// Checks the password and issues a session token.
    ///
    /// Unknown emails, wrong passwords and accounts without a password all yield the
    /// same `AppError::Unauthorized`.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AppError> {
        let invalid = || AppError::Unauthorized("Invalid email or password".into());

        let user = self
            .users
            .find_user_by_email(email.trim())
            .await?
            .ok_or_else(invalid)?;
        if !user.has_password() {
            log::debug!("Password login refused for federated user {}", user.id);
            return Err(invalid());
        }
        let hash = user.password_hash.as_deref().unwrap_or_default();
        if !verify_password(password, hash)? {
            return Err(invalid());
        }
        self.tokens.issue(user.id)
    }

    /// Names the key a failed registration collided on.
    async fn which_conflict(&self, email: &str) -> Result<AppError, AppError> {
        let message = match self.users.find_user_by_email(email).await? {
            Some(_) => "Email already exists",
            None => "Username already exists",
        };
        Ok(AppError::Conflict(message.into()))
    }
}

//! # Federated sign-in
//!
//! Drives the authorization-code login against an external identity provider and maps
//! the verified identity onto a local account.
//!
//! ## Flow
//!
//! 1. **[`begin`](FederationService::begin)**: asks the provider for an authorization URL
//!    together with a fresh anti-forgery `state`. The route stores the state in the
//!    browser's session and redirects.
//! 2. **[`check_state`]**: on the callback, the stored state (already removed from the
//!    session) must equal the one echoed back by the provider, otherwise `AppError::Csrf`.
//! 3. **[`complete`](FederationService::complete)**: the provider exchanges the code and
//!    verifies the identity token, the identity is resolved to a user (created if absent),
//!    and a session token is issued. The caller is sent to the front end with the token
//!    in the query string.
//!
//! All provider traffic happens before the first write, so no database work waits on
//! the network.

pub mod google;
pub mod id_token;

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::auth::TokenService;
use crate::error::AppError;
use crate::models::user::{MAX_EMAIL_LEN, MAX_USER_NAME_LEN};
use crate::models::{NewUser, User};
use crate::store::UserStore;

pub use google::GoogleProvider;

/// Identity claims taken from a verified provider token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedIdentity {
    pub email: String,
    pub display_name: Option<String>,
}

/// Where to send the browser, and the `state` it must bring back.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: Url,
    pub state: String,
}

/// An external OAuth2/OIDC provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn authorization_request(&self) -> AuthorizationRequest;

    /// Exchanges an authorization code and verifies the returned identity token.
    ///
    /// Failures are `AppError::Upstream` with a message safe to show the client.
    async fn exchange_code(&self, code: &str) -> Result<FederatedIdentity, AppError>;
}

/// Compares the state kept in the session against the one on the callback.
pub fn check_state(stored: Option<&str>, received: Option<&str>) -> Result<(), AppError> {
    match (stored, received) {
        (Some(stored), Some(received)) if stored == received => Ok(()),
        (stored, received) => {
            log::warn!(
                "OAuth state mismatch or missing (stored present: {}, received present: {})",
                stored.is_some(),
                received.is_some()
            );
            Err(AppError::Csrf("State mismatch. Please try again.".into()))
        }
    }
}

#[derive(Clone)]
pub struct FederationService {
    provider: Arc<dyn IdentityProvider>,
    users: Arc<dyn UserStore>,
    tokens: TokenService,
    frontend_url: String,
}

impl FederationService {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        users: Arc<dyn UserStore>,
        tokens: TokenService,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            users,
            tokens,
            frontend_url: frontend_url.into(),
        }
    }

    pub fn begin(&self) -> AuthorizationRequest {
        self.provider.authorization_request()
    }

    /// Finishes a login whose state has already been checked and returns the front-end
    /// URL carrying the new session token.
    pub async fn complete(&self, code: &str) -> Result<Url, AppError> {
        let identity = self.provider.exchange_code(code).await?;
        let user = self.resolve_user(&identity).await?;
        let token = self.tokens.issue(user.id)?;
        log::info!("User {} signed in through federation", user.id);
        self.frontend_redirect(&token)
    }

    /// Finds the account for a federated email or creates one without a password.
    ///
    /// When a concurrent callback inserts the same email first, the resulting conflict
    /// is answered by re-reading that row, so both callers end up with the same user.
    /// If the conflict came from the user name instead, the name is disambiguated with
    /// the email and the insert retried once.
    pub async fn resolve_user(&self, identity: &FederatedIdentity) -> Result<User, AppError> {
        if let Some(user) = self.users.find_user_by_email(&identity.email).await? {
            return Ok(user);
        }

        if identity.email.chars().count() > MAX_EMAIL_LEN {
            log::warn!("Federated email exceeds {} characters", MAX_EMAIL_LEN);
            return Err(AppError::Validation(format!(
                "Email must be at most {} characters",
                MAX_EMAIL_LEN
            )));
        }

        let base_name = identity
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| email_local_part(&identity.email));
        let candidates = [
            truncate_chars(&base_name, MAX_USER_NAME_LEN),
            disambiguated_name(&base_name, &identity.email),
        ];

        for user_name in candidates {
            let new_user = NewUser {
                user_name,
                email: identity.email.clone(),
                password_hash: None,
            };
            match self.users.insert_user(new_user).await {
                Ok(user) => {
                    log::info!("Provisioned federated user {}", user.id);
                    return Ok(user);
                }
                Err(AppError::Conflict(_)) => {
                    if let Some(user) = self.users.find_user_by_email(&identity.email).await? {
                        log::debug!("Federated user {} was created concurrently", user.id);
                        return Ok(user);
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::Internal(format!(
            "Failed to provision a user name for {}",
            identity.email
        )))
    }

    fn frontend_redirect(&self, token: &str) -> Result<Url, AppError> {
        let mut url = Url::parse(&format!("{}/Home", self.frontend_url))
            .map_err(|e| AppError::Internal(format!("Invalid FRONTEND_URL: {}", e)))?;
        url.query_pairs_mut().append_pair("access_token", token);
        Ok(url)
    }
}

fn email_local_part(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect::<String>().trim_end().to_string()
}

/// `"<name> (<email>)"`, shortening the name so the whole fits a user name column.
fn disambiguated_name(name: &str, email: &str) -> String {
    let suffix = format!(" ({})", email);
    let room = MAX_USER_NAME_LEN.saturating_sub(suffix.chars().count());
    let name = truncate_chars(name, room);
    truncate_chars(&format!("{}{}", name, suffix), MAX_USER_NAME_LEN)
}

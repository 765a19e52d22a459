#![doc = "The `todoforge` library crate."]
#![doc = ""]
#![doc = "Multi-user to-do lists behind password or Google sign-in. The crate holds the"]
#![doc = "domain services, storage ports, authentication and routing; `main.rs` wires them"]
#![doc = "to Postgres, SMTP and Google and runs the server."]

pub mod auth;
pub mod catch_panic;
pub mod config;
pub mod error;
pub mod models;
pub mod notifier;
pub mod oauth;
pub mod routes;
pub mod store;
pub mod tasks;

use std::sync::Arc;

use actix_cors::Cors;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::body::MessageBody;
use actix_web::cookie::Key;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::middleware::Logger;
use actix_web::{web, App};

use crate::auth::{AuthService, TokenService};
use crate::catch_panic::CatchPanic;
use crate::error::AppError;
use crate::notifier::Notifier;
use crate::oauth::{FederationService, IdentityProvider};
use crate::store::{TaskStore, UserStore};
use crate::tasks::TaskService;

pub const SESSION_COOKIE: &str = "todo_session";

/// Services shared by every request handler.
pub struct AppState {
    pub auth: AuthService,
    pub tasks: TaskService,
    pub federation: FederationService,
}

/// External collaborators the services are built from.
pub struct Collaborators {
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub provider: Arc<dyn IdentityProvider>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(
        collaborators: Collaborators,
        tokens: TokenService,
        bcrypt_cost: u32,
        frontend_url: &str,
    ) -> Self {
        let Collaborators {
            users,
            tasks,
            provider,
            notifier,
        } = collaborators;
        Self {
            auth: AuthService::new(users.clone(), tokens.clone(), bcrypt_cost),
            tasks: TaskService::new(tasks, users.clone(), notifier),
            federation: FederationService::new(provider, users, tokens, frontend_url),
        }
    }
}

/// Builds the application with its middleware stack and every route.
pub fn create_app(
    state: web::Data<AppState>,
    session_key: Key,
    secure_cookies: bool,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let session = SessionMiddleware::builder(CookieSessionStore::default(), session_key)
        .cookie_name(SESSION_COOKIE.to_owned())
        .cookie_secure(secure_cookies)
        .build();

    App::new()
        .app_data(state)
        .app_data(web::JsonConfig::default().error_handler(|err, _req| {
            AppError::Validation(format!("Invalid JSON body: {}", err)).into()
        }))
        .app_data(
            web::PathConfig::default()
                .error_handler(|_, _| AppError::NotFound("To-do not found".into()).into()),
        )
        .wrap(CatchPanic)
        .wrap(session)
        .wrap(
            Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600),
        )
        .wrap(Logger::default())
        .configure(routes::config)
}

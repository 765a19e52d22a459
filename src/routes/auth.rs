use crate::{
    auth::{AuthenticatedUserId, LoginRequest, LoginResponse, OAuthStateSession, RegisterRequest},
    error::AppError,
    AppState,
};
use actix_web::{get, http::header, post, web, HttpResponse, Responder};
use serde_json::json;
use validator::Validate;

/// Register a new user
///
/// ## Responses:
/// - `201 Created`: `{ "msg": "User registered successfully" }`.
/// - `400 Bad Request`: email, password or userName missing or malformed.
/// - `409 Conflict`: the email or userName is already taken.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;
    let RegisterRequest {
        email,
        password,
        user_name,
    } = register_data.into_inner();

    state
        .auth
        .register(
            email.as_deref().unwrap_or_default(),
            password.as_deref().unwrap_or_default(),
            user_name.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(HttpResponse::Created().json(json!({
        "msg": "User registered successfully"
    })))
}

/// Login user
///
/// Authenticates a user by email and password and returns a bearer token.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;
    let access_token = state
        .auth
        .login(
            login_data.email.as_deref().unwrap_or_default(),
            login_data.password.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(HttpResponse::Ok().json(LoginResponse { access_token }))
}

/// Clears the browser session and returns to the index.
#[get("/logout")]
pub async fn logout(session: OAuthStateSession) -> impl Responder {
    session.clear();
    HttpResponse::Found()
        .insert_header((header::LOCATION, "/"))
        .finish()
}

/// Echoes the id of the bearer token's owner. Mounted behind `AuthMiddleware`.
pub async fn protected(user_id: AuthenticatedUserId) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "logged_in_as": user_id.0.to_string()
    }))
}

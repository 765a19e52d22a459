use crate::{
    auth::OAuthStateSession,
    error::AppError,
    oauth::check_state,
    AppState,
};
use actix_web::{get, http::header, web, HttpResponse};
use serde::Deserialize;

/// Query string Google appends to the redirect URI.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set instead of `code` when the user declined consent.
    pub error: Option<String>,
}

/// Starts Google sign-in.
///
/// Remembers a fresh anti-forgery `state` in the browser session and redirects to
/// Google's consent screen.
#[get("/login/google")]
pub async fn google_login(
    state: web::Data<AppState>,
    session: OAuthStateSession,
) -> Result<HttpResponse, AppError> {
    let request = state.federation.begin();
    session.remember_state(&request.state)?;

    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, request.url.as_str()))
        .finish())
}

/// Google redirects here after sign-in.
///
/// ## Responses:
/// - `302 Found`: to `<FRONTEND_URL>/Home?access_token=...`.
/// - `400 Bad Request`: the `state` does not match the session's, or no code was sent.
/// - `500 Internal Server Error`: the token exchange or ID token verification failed.
#[get("/callback")]
pub async fn callback(
    state: web::Data<AppState>,
    session: OAuthStateSession,
    params: web::Query<CallbackParams>,
) -> Result<HttpResponse, AppError> {
    let stored = session.take_state();
    check_state(stored.as_deref(), params.state.as_deref())?;

    let code = match (&params.code, &params.error) {
        (Some(code), _) => code,
        (None, Some(error)) => {
            log::info!("Google sign-in returned error: {}", error);
            return Err(AppError::Validation("Google sign-in was not completed".into()));
        }
        (None, None) => return Err(AppError::Validation("Missing authorization code".into())),
    };

    let redirect = state.federation.complete(code).await?;
    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, redirect.as_str()))
        .finish())
}

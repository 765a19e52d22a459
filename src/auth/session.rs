//! Per-browser storage for the OAuth anti-forgery `state` value.
//!
//! A thin wrapper around Actix sessions so handlers deal with "remember" and
//! "take" instead of cookie keys and serialization errors.

use actix_session::Session;
use actix_web::{dev::Payload, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;

use crate::error::AppError;

pub(crate) const OAUTH_STATE_KEY: &str = "oauth_state";

#[derive(Clone)]
pub struct OAuthStateSession(Session);

impl OAuthStateSession {
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Stores the `state` sent to the provider, replacing any earlier attempt.
    pub fn remember_state(&self, state: &str) -> Result<(), AppError> {
        self.0
            .insert(OAUTH_STATE_KEY, state)
            .map_err(|e| AppError::Internal(format!("failed to persist session: {}", e)))
    }

    /// Removes and returns the stored `state`. A value that cannot be decoded counts as absent.
    pub fn take_state(&self) -> Option<String> {
        match self.0.remove_as::<String>(OAUTH_STATE_KEY) {
            Some(Ok(state)) => Some(state),
            Some(Err(raw)) => {
                log::warn!("undecodable oauth state in session: {}", raw);
                None
            }
            None => None,
        }
    }

    pub fn clear(&self) {
        self.0.purge();
    }
}

impl FromRequest for OAuthStateSession {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(OAuthStateSession::new) })
    }
}

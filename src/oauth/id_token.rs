use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use super::FederatedIdentity;
use crate::error::AppError;

pub const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// The subset of OpenID Connect claims this service reads.
#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
}

/// Checks signature, audience, issuer and expiry of provider identity tokens.
pub struct IdTokenVerifier {
    validation: Validation,
}

impl IdTokenVerifier {
    pub fn new(audience: &str, issuers: &[&str], algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.set_audience(&[audience]);
        validation.set_issuer(issuers);
        Self { validation }
    }

    /// Google signs identity tokens with RS256; the audience is our client id.
    pub fn google(client_id: &str) -> Self {
        Self::new(client_id, &GOOGLE_ISSUERS, Algorithm::RS256)
    }

    /// Verifies `token` with the key named by its `kid` header.
    ///
    /// `key_for` maps a key id to the provider's public key, or `None` if unknown.
    pub fn verify<F>(&self, token: &str, key_for: F) -> Result<FederatedIdentity, AppError>
    where
        F: FnOnce(&str) -> Option<DecodingKey>,
    {
        let header = decode_header(token).map_err(|e| rejected(&e))?;
        let kid = header
            .kid
            .ok_or_else(|| rejected(&"identity token has no key id"))?;
        let key = key_for(&kid).ok_or_else(|| rejected(&format!("unknown key id {}", kid)))?;

        let claims = decode::<IdTokenClaims>(token, &key, &self.validation)
            .map_err(|e| rejected(&e))?
            .claims;

        if claims.email_verified == Some(false) {
            return Err(rejected(&"email address is not verified"));
        }
        let email = claims
            .email
            .filter(|email| !email.trim().is_empty())
            .ok_or_else(|| rejected(&"identity token carries no email"))?;

        Ok(FederatedIdentity {
            email,
            display_name: claims.name,
        })
    }
}

fn rejected(reason: &dyn std::fmt::Display) -> AppError {
    log::error!("Error verifying ID token: {}", reason);
    AppError::Upstream("Failed to verify Google ID token".into())
}

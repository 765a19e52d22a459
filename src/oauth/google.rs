//! # Google OpenID Connect provider
//!
//! Authorization-code flow against Google's endpoints using the `oauth2` crate.
//! Token responses are parsed with an extra `id_token` field; that token is then
//! verified against Google's published signing keys (JWKS) before its claims are
//! trusted.

use async_trait::async_trait;
use jsonwebtoken::{jwk::JwkSet, DecodingKey};
use oauth2::basic::{
    BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
    BasicTokenType,
};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    ExtraTokenFields, RedirectUrl, Scope, StandardRevocableToken, StandardTokenResponse,
    TokenUrl,
};
use serde::{Deserialize, Serialize};

use super::id_token::IdTokenVerifier;
use super::{AuthorizationRequest, FederatedIdentity, IdentityProvider};
use crate::config::GoogleConfig;
use crate::error::AppError;

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_CERTS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const SCOPES: [&str; 3] = ["profile", "email", "openid"];

/// The OpenID Connect addition to Google's token response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GoogleTokenFields {
    pub id_token: Option<String>,
}

impl ExtraTokenFields for GoogleTokenFields {}

type GoogleTokenResponse = StandardTokenResponse<GoogleTokenFields, BasicTokenType>;

/// OAuth client type with auth URL and token URL set.
type GoogleClient = oauth2::Client<
    BasicErrorResponse,
    GoogleTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

pub struct GoogleProvider {
    client: GoogleClient,
    http: reqwest::Client,
    verifier: IdTokenVerifier,
}

impl GoogleProvider {
    pub fn new(config: &GoogleConfig) -> Result<Self, AppError> {
        let invalid = |e: oauth2::url::ParseError| {
            AppError::Internal(format!("Invalid Google OAuth endpoint: {}", e))
        };
        let client: GoogleClient = oauth2::Client::new(ClientId::new(config.client_id.clone()))
            .set_client_secret(ClientSecret::new(config.client_secret.clone()))
            .set_auth_uri(AuthUrl::new(GOOGLE_AUTH_URL.to_string()).map_err(invalid)?)
            .set_token_uri(TokenUrl::new(GOOGLE_TOKEN_URL.to_string()).map_err(invalid)?)
            .set_redirect_uri(RedirectUrl::new(config.redirect_uri.clone()).map_err(invalid)?);

        // The token endpoint must not redirect.
        let http = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            http,
            verifier: IdTokenVerifier::google(&config.client_id),
        })
    }

    async fn fetch_signing_keys(&self) -> Result<JwkSet, AppError> {
        let response = self
            .http
            .get(GOOGLE_CERTS_URL)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| {
                log::error!("Error fetching Google signing keys: {}", e);
                AppError::Upstream("Failed to verify Google ID token".into())
            })?;
        response.json::<JwkSet>().await.map_err(|e| {
            log::error!("Malformed Google signing keys: {}", e);
            AppError::Upstream("Failed to verify Google ID token".into())
        })
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorization_request(&self) -> AuthorizationRequest {
        let (url, state) = SCOPES
            .iter()
            .fold(
                self.client.authorize_url(CsrfToken::new_random),
                |request, scope| request.add_scope(Scope::new(scope.to_string())),
            )
            .url();
        AuthorizationRequest {
            url,
            state: state.secret().clone(),
        }
    }

    async fn exchange_code(&self, code: &str) -> Result<FederatedIdentity, AppError> {
        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| {
                log::error!("Error fetching token from Google: {}", e);
                AppError::Upstream("Failed to fetch token from Google".into())
            })?;

        let id_token = token.extra_fields().id_token.clone().ok_or_else(|| {
            log::error!("Google token response carried no id_token");
            AppError::Upstream("Failed to verify Google ID token".into())
        })?;

        let keys = self.fetch_signing_keys().await?;
        self.verifier.verify(&id_token, |kid| {
            keys.find(kid)
                .and_then(|jwk| DecodingKey::from_jwk(jwk).ok())
        })
    }
}

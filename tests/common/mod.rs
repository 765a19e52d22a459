#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::{test, web};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use url::Url;

use todoforge::auth::TokenService;
use todoforge::error::AppError;
use todoforge::models::User;
use todoforge::notifier::{Notifier, NotifyError};
use todoforge::oauth::{AuthorizationRequest, FederatedIdentity, IdentityProvider};
use todoforge::store::MemoryStore;
use todoforge::{AppState, Collaborators};

pub const JWT_SECRET: &str = "integration-test-jwt-secret";
pub const FRONTEND_URL: &str = "http://127.0.0.1:5173";
/// Authorization code the fake provider treats as an outage.
pub const FAILING_CODE: &str = "provider-down";

/// Identity provider that hands out numbered states and a fixed identity.
pub struct FakeProvider {
    identity: FederatedIdentity,
    issued: AtomicUsize,
}

impl FakeProvider {
    pub fn new(email: &str, name: Option<&str>) -> Self {
        Self {
            identity: FederatedIdentity {
                email: email.to_string(),
                display_name: name.map(str::to_string),
            },
            issued: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn authorization_request(&self) -> AuthorizationRequest {
        let n = self.issued.fetch_add(1, Ordering::SeqCst);
        let state = format!("state-{}", n);
        let url = Url::parse_with_params(
            "https://accounts.example.com/o/oauth2/auth",
            &[("state", state.as_str()), ("scope", "profile email openid")],
        )
        .unwrap();
        AuthorizationRequest { url, state }
    }

    async fn exchange_code(&self, code: &str) -> Result<FederatedIdentity, AppError> {
        if code == FAILING_CODE {
            return Err(AppError::Upstream("Failed to fetch token from Google".into()));
        }
        Ok(self.identity.clone())
    }
}

/// Forwards every notification into a channel.
pub struct ChannelNotifier(pub mpsc::UnboundedSender<(String, String)>);

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn notify_task_created(&self, user: &User, title: &str) -> Result<(), NotifyError> {
        let _ = self.0.send((user.email.clone(), title.to_string()));
        Ok(())
    }
}

pub struct TestContext {
    pub state: web::Data<AppState>,
    pub store: Arc<MemoryStore>,
    pub tokens: TokenService,
    pub mail: mpsc::UnboundedReceiver<(String, String)>,
}

pub fn context() -> TestContext {
    context_with_provider(FakeProvider::new("gina@example.com", Some("Gina")))
}

pub fn context_with_provider(provider: FakeProvider) -> TestContext {
    let store = Arc::new(MemoryStore::new());
    let tokens = TokenService::new(JWT_SECRET, 3600);
    let (tx, rx) = mpsc::unbounded_channel();
    let state = web::Data::new(AppState::new(
        Collaborators {
            users: store.clone(),
            tasks: store.clone(),
            provider: Arc::new(provider),
            notifier: Arc::new(ChannelNotifier(tx)),
        },
        tokens.clone(),
        4,
        FRONTEND_URL,
    ));
    TestContext {
        state,
        store,
        tokens,
        mail: rx,
    }
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

pub async fn register<S, B>(app: &S, email: &str, password: &str, user_name: &str) -> StatusCode
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(json!({
            "email": email,
            "password": password,
            "userName": user_name
        }))
        .to_request();
    test::call_service(app, req).await.status()
}

pub async fn login<S, B>(app: &S, email: &str, password: &str) -> Result<String, StatusCode>
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({ "email": email, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    if resp.status() != StatusCode::OK {
        return Err(resp.status());
    }
    let body: Value = test::read_body_json(resp).await;
    Ok(body["access_token"].as_str().unwrap().to_string())
}

/// Registers and logs in, returning the bearer token.
pub async fn sign_up<S, B>(app: &S, email: &str, user_name: &str) -> String
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    assert_eq!(
        register(app, email, "pw123", user_name).await,
        StatusCode::CREATED
    );
    login(app, email, "pw123").await.expect("login after register")
}

pub fn location<B>(resp: &ServiceResponse<B>) -> Url {
    let raw = resp
        .headers()
        .get(header::LOCATION)
        .expect("Location header")
        .to_str()
        .unwrap();
    Url::parse(raw).unwrap_or_else(|_| Url::parse("http://localhost").unwrap().join(raw).unwrap())
}

pub fn query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

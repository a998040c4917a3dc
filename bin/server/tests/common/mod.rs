//! Shared harness for agri-kb-server integration tests.
//!
//! Builds the full router over in-memory stores and a scripted identity
//! provider, then drives it with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use agri_kb_catalog::MemoryCropStore;
use agri_kb_platform_access::{
    AuthorizationRequest, GoogleOAuthConfig, IdentityProvider, IntrospectedToken,
    MemorySessionStore, MemoryUserStore, PendingAuthorization, ProviderError, ProviderProfile,
    Role, User, hash_password,
};
use agri_kb_server::{
    app::build_router,
    auth::AppState,
    config::{AppEnv, ServerConfig, SessionConfig},
};
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use axum_extra::extract::cookie::Cookie;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const CLIENT_ID: &str = "agri-kb-test-client";
pub const CSRF_TOKEN: &str = "csrf-123";
pub const GOOD_CODE: &str = "good-code";
pub const FRONTEND_URL: &str = "http://localhost:3000";
pub const JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Identity provider that answers from fixtures instead of calling Google.
#[derive(Default)]
pub struct FakeProvider {
    profile: Mutex<Option<ProviderProfile>>,
    tokens: Mutex<HashMap<String, IntrospectedToken>>,
}

impl FakeProvider {
    /// Sets the profile returned when `GOOD_CODE` is exchanged.
    pub fn sign_in_as(&self, profile: ProviderProfile) {
        *self.profile.lock().expect("profile lock") = Some(profile);
    }

    /// Makes `access_token` introspectable.
    pub fn register_token(&self, access_token: &str, audience: &str, subject: &str) {
        self.tokens.lock().expect("tokens lock").insert(
            access_token.to_string(),
            IntrospectedToken {
                audience: audience.to_string(),
                subject: subject.to_string(),
            },
        );
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn client_id(&self) -> &str {
        CLIENT_ID
    }

    fn authorization_request(&self) -> AuthorizationRequest {
        AuthorizationRequest {
            url: format!("https://accounts.example.test/auth?state={CSRF_TOKEN}"),
            pending: PendingAuthorization {
                csrf_token: CSRF_TOKEN.to_string(),
                pkce_verifier: "verifier".to_string(),
                nonce: "nonce".to_string(),
            },
        }
    }

    async fn exchange_code(
        &self,
        code: &str,
        _pending: &PendingAuthorization,
    ) -> agri_kb_core::Result<ProviderProfile, ProviderError> {
        let profile = self.profile.lock().expect("profile lock").clone();
        match profile {
            Some(profile) if code == GOOD_CODE => Ok(profile),
            _ => Err(ProviderError::TokenExchange {
                reason: format!("unknown code {code}"),
            }
            .into()),
        }
    }

    async fn introspect(
        &self,
        access_token: &str,
    ) -> agri_kb_core::Result<Option<IntrospectedToken>, ProviderError> {
        Ok(self
            .tokens
            .lock()
            .expect("tokens lock")
            .get(access_token)
            .cloned())
    }
}

pub fn google_profile(subject: &str, email: &str, email_verified: bool) -> ProviderProfile {
    ProviderProfile {
        subject: subject.to_string(),
        email: email.to_string(),
        email_verified,
        given_name: Some("Grace".to_string()),
        family_name: Some("Hopper".to_string()),
        picture: Some("https://example.test/grace.png".to_string()),
        access_token: "ya29.issued-at-sign-in".to_string(),
    }
}

pub fn test_config() -> ServerConfig {
    ServerConfig {
        app_env: AppEnv::Development,
        listen_addr: "127.0.0.1:0".to_string(),
        database_url: None,
        database_max_connections: 1,
        jwt_secret: JWT_SECRET.to_string(),
        frontend_url: FRONTEND_URL.to_string(),
        static_dir: None,
        session: SessionConfig::default(),
        google: GoogleOAuthConfig::new(
            CLIENT_ID.to_string(),
            "client-secret".to_string(),
            "http://localhost:5000/auth/google/callback".to_string(),
        ),
    }
}

/// The assembled application plus handles to its collaborators.
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub provider: Arc<FakeProvider>,
}

impl TestApp {
    pub fn new() -> Self {
        let provider = Arc::new(FakeProvider::default());
        let state = Arc::new(AppState::new(
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemorySessionStore::new()),
            Arc::new(MemoryCropStore::new()),
            Arc::clone(&provider) as Arc<dyn IdentityProvider>,
            test_config(),
        ));
        let router = build_router(Arc::clone(&state));
        Self {
            router,
            state,
            provider,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// Stores a local account with `password` and `role`.
    pub async fn create_user(&self, email: &str, password: &str, role: Role) -> User {
        let username = email.split('@').next().unwrap_or(email).to_string();
        let mut user = User::local(
            username,
            email.to_string(),
            Some(hash_password(password).expect("hash")),
            "Test".to_string(),
            "User".to_string(),
        );
        user.set_role(role);
        self.state.users.create(&user).await.expect("create user");
        user
    }

    /// Access token for `user`, as the server would issue at sign-in.
    pub fn token_for(&self, user: &User) -> String {
        self.state.tokens.issue(user.id()).expect("issue token")
    }

    pub async fn user_count(&self) -> usize {
        self.state.users.list().await.expect("list users").len()
    }
}

/// Request builder for tests.
pub struct TestRequest {
    method: Method,
    uri: String,
    cookies: Vec<(String, String)>,
    bearer: Option<String>,
    body: Option<Value>,
}

impl TestRequest {
    pub fn new(method: Method, uri: &str) -> Self {
        Self {
            method,
            uri: uri.to_string(),
            cookies: Vec::new(),
            bearer: None,
            body: None,
        }
    }

    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri)
    }

    pub fn post(uri: &str) -> Self {
        Self::new(Method::POST, uri)
    }

    pub fn put(uri: &str) -> Self {
        Self::new(Method::PUT, uri)
    }

    pub fn delete(uri: &str) -> Self {
        Self::new(Method::DELETE, uri)
    }

    pub fn cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.push((name.to_string(), value.to_string()));
        self
    }

    /// Sends `token` in the access-token cookie.
    pub fn token(self, token: &str) -> Self {
        self.cookie("token", token)
    }

    pub fn bearer(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_string());
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn build(self) -> Request<Body> {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        if !self.cookies.is_empty() {
            let header_value = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(header::COOKIE, header_value);
        }
        if let Some(token) = self.bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        match self.body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        }
    }
}

/// Cookies set by `response`, keyed by name.
pub fn set_cookies(response: &Response) -> HashMap<String, Cookie<'static>> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| Cookie::parse(value.to_string()).ok())
        .map(|cookie| (cookie.name().to_string(), cookie))
        .collect()
}

/// Value of the `name` cookie set by `response`, if it was set non-empty.
pub fn cookie_value(response: &Response, name: &str) -> Option<String> {
    set_cookies(response)
        .get(name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// Asserts the status and the `message` field of an error response.
pub async fn assert_error(response: Response, status: StatusCode, message: &str) {
    assert_eq!(response.status(), status);
    let body = body_json(response).await;
    assert_eq!(body["message"], message);
}

/// Logs in through the API and returns the response.
pub async fn login(app: &TestApp, email: &str, password: &str) -> Response {
    app.send(
        TestRequest::post("/api/users/login")
            .json(serde_json::json!({ "email": email, "password": password }))
            .build(),
    )
    .await
}

/// Starts Google sign-in and returns the `auth_state` cookie value.
pub async fn begin_google_login(app: &TestApp) -> String {
    let response = app.send(TestRequest::get("/auth/google").build()).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    cookie_value(&response, "auth_state").expect("auth_state cookie")
}

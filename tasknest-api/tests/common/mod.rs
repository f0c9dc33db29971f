/// Common test utilities for integration tests
///
/// Provides shared infrastructure:
/// - test database setup (migrations applied on connect)
/// - a router wired with a stub identity verifier
/// - request helpers driving the router via `tower::Service`

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;
use tower::Service as _;
use uuid::Uuid;

use tasknest_api::app::{build_router, AppState};
use tasknest_api::config::{ApiConfig, AuthConfig, Config, DatabaseConfig};
use tasknest_shared::auth::federated::{AssertionError, FederatedIdentity, IdentityVerifier};

/// Signing secret used by every test session
pub const TEST_JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Stub verifier accepting assertions of the form `"<email>|<subject_id>"`
///
/// Stands in for the Google verifier so federated flows run without a
/// network. Anything not in fixture form fails as a malformed assertion.
pub struct StubVerifier;

#[async_trait]
impl IdentityVerifier for StubVerifier {
    async fn verify(&self, assertion: &str) -> Result<FederatedIdentity, AssertionError> {
        let (email, subject_id) = assertion
            .split_once('|')
            .ok_or_else(|| AssertionError::Malformed("not a fixture assertion".to_string()))?;

        Ok(FederatedIdentity {
            issuer: "accounts.google.com".to_string(),
            subject_id: subject_id.to_string(),
            email: email.to_string(),
            email_verified: true,
            display_name: Some("Stub User".to_string()),
        })
    }
}

/// Test context containing the pool and a ready-to-call router
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
}

impl TestContext {
    /// Connects to the test database, applies migrations, and builds the app.
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set for integration tests"))?;

        let db = PgPool::connect(&database_url).await?;

        // Path relative to the crate manifest, not this file
        sqlx::migrate!("../migrations").run(&db).await?;

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: 5,
            },
            auth: AuthConfig {
                jwt_secret: TEST_JWT_SECRET.to_string(),
                token_expiry_days: 7,
                google_client_id: "test-client-id".to_string(),
            },
        };

        let state = AppState::new(db.clone(), config, Arc::new(StubVerifier));
        let app = build_router(state);

        Ok(TestContext { db, app })
    }
}

/// Returns a unique email so tests never collide on the unique index.
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, Uuid::new_v4())
}

/// Sends a JSON request to the app and returns status plus parsed body.
pub async fn send_json(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().call(request).await.unwrap();
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}

/// Registers an account and returns the token envelope. Panics on failure.
pub async fn register(app: &axum::Router, email: &str, name: &str, password: &str) -> Value {
    let (status, body) = send_json(
        app,
        "POST",
        "/auth/register",
        None,
        Some(serde_json::json!({
            "email": email,
            "name": name,
            "password": password,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    body
}

/// Creates a task for the given session token and returns the task view.
pub async fn create_task(app: &axum::Router, token: &str, body: Value) -> Value {
    let (status, task) = send_json(app, "POST", "/tasks", Some(token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "create task failed: {task}");
    task
}

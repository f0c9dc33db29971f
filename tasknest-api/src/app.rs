/// Application state and router builder
///
/// `AppState` is built once at startup from the pool, the configuration,
/// and the federated identity verifier, then cloned cheaply into each
/// request handler via Axum's `State` extractor.
///
/// # Router layout
///
/// ```text
/// /
/// ├── /health              # health check (public)
/// ├── /auth/               # authentication (public)
/// │   ├── POST /register
/// │   ├── POST /login
/// │   └── POST /federated
/// └── /tasks/              # task CRUD (session required)
///     ├── GET    /
///     ├── POST   /
///     ├── PATCH  /:id
///     └── DELETE /:id
/// ```

use crate::{config::Config, error::ApiError, routes, services};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tasknest_shared::auth::{federated::IdentityVerifier, middleware};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Auth orchestrator
    pub auth: Arc<services::auth::AuthService>,

    /// Task orchestrator
    pub tasks: Arc<services::tasks::TaskService>,
}

impl AppState {
    /// Creates new application state, wiring the services to the pool.
    pub fn new(db: PgPool, config: Config, verifier: Arc<dyn IdentityVerifier>) -> Self {
        let config = Arc::new(config);

        let auth = Arc::new(services::auth::AuthService::new(
            db.clone(),
            config.auth.jwt_secret.clone(),
            config.auth.token_expiry_days,
            verifier,
        ));
        let tasks = Arc::new(services::tasks::TaskService::new(db.clone()));

        Self {
            db,
            config,
            auth,
            tasks,
        }
    }

    /// Gets the session token signing secret.
    pub fn jwt_secret(&self) -> &str {
        &self.config.auth.jwt_secret
    }
}

/// Builds the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public, no auth required)
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/federated", post(routes::auth::federated_login));

    // Task routes (require a valid session)
    let task_routes = Router::new()
        .route(
            "/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/:id",
            axum::routing::patch(routes::tasks::update_task).delete(routes::tasks::delete_task),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/auth", auth_routes)
        .nest("/tasks", task_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Session authentication layer
///
/// Verifies the bearer token, resolves it to the account it names, and
/// injects `CurrentUser` into request extensions. Unauthenticated requests
/// are rejected here, before any task handler runs.
async fn session_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = middleware::authenticate(&state.db, state.jwt_secret(), req.headers()).await?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

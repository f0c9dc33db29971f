/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /auth/register` - register a local account
/// - `POST /auth/login` - local login
/// - `POST /auth/federated` - federated (Google Sign-In) login
///
/// All three return the same token envelope:
/// `{access_token, token_type: "bearer", user}`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    services::auth::AuthSession,
};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tasknest_shared::models::user::UserView;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    /// Password
    #[validate(length(min = 8, max = 72, message = "Password must be 8-72 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Federated login request
#[derive(Debug, Deserialize)]
pub struct FederatedLoginRequest {
    /// Opaque assertion from the identity provider
    pub credential: String,
}

/// Token envelope returned by every auth endpoint
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// Signed bearer token
    pub access_token: String,

    /// Always "bearer"
    pub token_type: String,

    /// Public user view (credentials stripped)
    pub user: UserView,
}

impl From<AuthSession> for TokenResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            access_token: session.token,
            token_type: "bearer".to_string(),
            user: session.user,
        }
    }
}

/// `POST /auth/register`
///
/// # Errors
///
/// - `400 Bad Request`: email already registered
/// - `422 Unprocessable Entity`: validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<TokenResponse>)> {
    req.validate().map_err(ApiError::from_validation)?;

    let session = state
        .auth
        .register(&req.email, &req.name, &req.password)
        .await?;

    Ok((StatusCode::CREATED, Json(TokenResponse::from(session))))
}

/// `POST /auth/login`
///
/// # Errors
///
/// - `401 Unauthorized`: unknown email, wrong password, or federated-only
///   account (same response shape for all three)
/// - `422 Unprocessable Entity`: validation failed
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    req.validate().map_err(ApiError::from_validation)?;

    let session = state.auth.login(&req.email, &req.password).await?;

    Ok(Json(TokenResponse::from(session)))
}

/// `POST /auth/federated`
///
/// # Errors
///
/// - `401 Unauthorized`: any verifier or trust-policy failure, collapsed
///   into one generic response
pub async fn federated_login(
    State(state): State<AppState>,
    Json(req): Json<FederatedLoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let session = state.auth.federated_login(&req.credential).await?;

    Ok(Json(TokenResponse::from(session)))
}

/// Session authentication for Axum
///
/// Protected routes pass every inbound request through [`authenticate`]:
/// the bearer token is extracted from the `Authorization` header, verified,
/// and resolved to the account it names. The resulting [`CurrentUser`] is
/// inserted into request extensions by the router layer, so handlers never
/// see an unauthenticated request.
///
/// # Example
///
/// ```no_run
/// use axum::Extension;
/// use tasknest_shared::auth::middleware::CurrentUser;
///
/// async fn handler(Extension(user): Extension<CurrentUser>) -> String {
///     format!("hello, {}", user.email)
/// }
/// ```

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use sqlx::PgPool;
use uuid::Uuid;

use super::jwt::{verify_token, TokenError};
use crate::models::user::User;

/// Authenticated caller, resolved from the session token
///
/// Carries only what handlers need; credentials never ride along.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// Account id
    pub id: Uuid,

    /// Normalized account email (the token subject)
    pub email: String,

    /// Display name
    pub name: String,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

/// Error type for session authentication
#[derive(Debug)]
pub enum AuthError {
    /// No Authorization header on the request
    MissingCredentials,

    /// Authorization header is not a bearer token
    InvalidFormat(String),

    /// Token failed verification or names no known account
    InvalidToken(String),

    /// Store lookup failed
    DatabaseError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Missing credentials").into_response()
            }
            AuthError::InvalidFormat(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
            AuthError::DatabaseError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

/// Authenticates a request from its headers.
///
/// Verifies the bearer token and resolves its subject email to an account.
/// A token whose subject no longer exists is rejected the same way as a bad
/// signature.
pub async fn authenticate(
    pool: &PgPool,
    secret: &str,
    headers: &HeaderMap,
) -> Result<CurrentUser, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = verify_token(token, secret).map_err(|e| match e {
        TokenError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        _ => AuthError::InvalidToken("Invalid token".to_string()),
    })?;

    let user = User::find_by_email(pool, &claims.sub)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?
        .ok_or_else(|| AuthError::InvalidToken("Invalid token".to_string()))?;

    Ok(CurrentUser::from(&user))
}

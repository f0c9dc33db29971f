/// Health check endpoint
///
/// Public, unauthenticated. Pings the store so load balancers see an
/// unhealthy instance when the database is unreachable.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Json};
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "healthy" on a 200
    pub status: &'static str,

    /// Server version
    pub version: &'static str,
}

/// `GET /health`
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    tasknest_shared::db::pool::health_check(&state.db)
        .await
        .map_err(|e| ApiError::ServiceUnavailable(format!("Database unreachable: {}", e)))?;

    Ok(Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    }))
}

//! # TaskNest API Server
//!
//! Multi-user task tracking with local and federated (Google) sign-in.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p tasknest-api
//! ```

use std::sync::Arc;

use tasknest_api::{
    app::{build_router, AppState},
    config::Config,
};
use tasknest_shared::auth::google::GoogleIdVerifier;
use tasknest_shared::db::{migrations, pool};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tasknest_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "TaskNest API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;
    let bind_address = config.bind_address();

    // An unreachable store is fatal at startup.
    let db = pool::create_pool(pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    migrations::run_migrations(&db).await?;

    let verifier = Arc::new(GoogleIdVerifier::new(config.auth.google_client_id.clone()));
    let state = AppState::new(db, config, verifier);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}

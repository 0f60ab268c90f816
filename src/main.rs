//! Blog authentication server
//!
//! Serves the register/login/logout/refresh endpoints over PostgreSQL.

use blog_auth::{build_app, AuthConfig, AuthService, PgStore, ServerConfig};

use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("blog_auth=info,tower_http=info")),
        )
        .init();

    let server = ServerConfig::from_env()?;
    let auth_config = AuthConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&server.database_url)
        .await?;

    let store = Arc::new(PgStore::new(pool));
    store.migrate().await?;

    let service = AuthService::with_store(store, auth_config)?;
    let app = build_app(Arc::new(service));

    let listener = tokio::net::TcpListener::bind(&server.bind_address).await?;
    tracing::info!("Server running on http://{}", server.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}

// ABOUTME: Server bootstrap for Tasklane
// ABOUTME: Loads configuration, opens the database and serves the HTTP API

use std::net::SocketAddr;

use axum::http::{HeaderValue, Method};
use tasklane_agents::{Agent, AgentCreateInput, AgentStorage, UserType};
use tasklane_api::{create_router, DbState};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub mod config;

#[cfg(test)]
mod tests;

pub use config::{Config, ConfigError};

pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let pool = tasklane_storage::connect(Some(config.database_path.clone())).await?;
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let state = DbState::new(pool.clone(), config.upload_dir.clone());

    let cors = CorsLayer::new()
        .allow_origin(config.cors_origin.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let app = create_router(state, config.max_upload_bytes)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        database = %config.database_path.display(),
        uploads = %config.upload_dir.display(),
        "Server listening on {}",
        addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!("Server stopped");
    Ok(())
}

/// Create the initial admin account in the configured database
pub async fn create_admin(
    config: &Config,
    name: String,
    email: String,
    mobile: String,
) -> anyhow::Result<Agent> {
    let pool = tasklane_storage::connect(Some(config.database_path.clone())).await?;
    let storage = AgentStorage::new(pool.clone());

    let admin = storage
        .create_agent(AgentCreateInput {
            name,
            email,
            mobile,
            user_type: UserType::Admin,
            parent_agent_id: None,
            created_by: None,
        })
        .await?;

    pool.close().await;
    info!("Created admin {} <{}>", admin.id, admin.email);
    Ok(admin)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

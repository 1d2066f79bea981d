//! Warden Core - HTTP service scaffold with pluggable authentication.
//!
//! Authentication strategies are registered once at startup and selected
//! per route by name.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

mod api;
mod auth;
mod config;
mod error;
mod logging;

use crate::api::build_router;
use crate::auth::{InMemoryUserStore, Registry, StrategyContext, UserLookup, BUILTIN_STRATEGIES};
use crate::config::Config;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Registered authentication strategies.
    pub registry: Arc<Registry>,
    /// Deadline for a single verification.
    pub verify_timeout: Duration,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    if let Err(e) = dotenvy::dotenv() {
        // Missing .env is expected in production
        eprintln!("Note: No .env file loaded ({e})");
    }

    // Initialize logging
    logging::init();

    tracing::info!("Starting Warden Core v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::load()
        .and_then(|config| config.validate().map(|()| config))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load configuration");
            anyhow::anyhow!("Configuration error: {}", e)
        })?;

    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        users = config.auth.users.len(),
        verify_timeout_ms = config.auth.verify_timeout_ms,
        "Configuration loaded"
    );

    // Register authentication strategies; any failure aborts startup
    let user_store = InMemoryUserStore::new(config.auth.users.clone());
    if user_store.len() < config.auth.users.len() {
        tracing::warn!("Duplicate user emails in configuration; later entries win");
    }
    let users: Arc<dyn UserLookup> = Arc::new(user_store);
    let context = StrategyContext {
        auth: config.auth.clone(),
        users,
    };
    let registry = Registry::discover(&context, BUILTIN_STRATEGIES).map_err(|e| {
        tracing::error!(error = %e, "Failed to register authentication strategies");
        anyhow::anyhow!("{}", e)
    })?;

    tracing::info!(strategies = ?registry.names(), "Authentication strategies ready");

    // Build application state
    let state = AppState {
        registry: Arc::new(registry),
        verify_timeout: config.auth.verify_timeout(),
    };

    // Build router
    let app = build_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!(address = %addr, "Server listening");
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

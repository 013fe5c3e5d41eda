//! HTTP server exposing the query pipeline
//!
//! Provides `POST /query` and `GET /health`, with CORS restricted to a single
//! configured origin.

pub mod api;
pub mod state;

use anyhow::{Context, Result};
use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerSection;
use state::AppState;

/// Start the web server and run until Ctrl-C
pub async fn serve(config: &ServerSection, state: AppState) -> Result<()> {
    let app = create_router(state, &config.allowed_origin)?;

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Starting web server on http://{}", addr);
    tracing::info!("Accepting browser requests from {}", config.allowed_origin);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down");
    Ok(())
}

/// Create the router with all routes
pub fn create_router(state: AppState, allowed_origin: &str) -> Result<Router> {
    let cors = cors_layer(allowed_origin)?;

    Ok(Router::new()
        .route("/query", post(api::query))
        .route("/health", get(api::health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// CORS for exactly one origin with credentials.
///
/// Methods and headers mirror the preflight request, since wildcards are not
/// allowed together with credentials.
fn cors_layer(allowed_origin: &str) -> Result<CorsLayer> {
    let origin = HeaderValue::from_str(allowed_origin)
        .with_context(|| format!("Invalid allowed origin: {}", allowed_origin))?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

use std::{env, sync::Arc};

pub mod core;
pub mod error_handler;
pub mod middleware_layer;
pub mod routes;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use elicitation::{SeedStore, TextGenerator};
use tokio::signal;
use tracing::{error, info};

use crate::{
    core::app_state::{AppState, ServerState},
    error_handler::AppError,
    middleware_layer::json_extractor::{ensure_request_id, json_error_mapper},
    routes::{
        finalize::finalize_route::finalize_route, health::health_route::health_route,
        next_step::next_step_route::next_step_route,
        start_session::start_session_route::start_session_route,
    },
};

const DEFAULT_API_ADDRESS: &str = "0.0.0.0:8080";

/// Builds state from the environment and serves until Ctrl+C.
pub async fn start() -> Result<(), AppError> {
    let host_url = env::var("API_ADDRESS").unwrap_or_else(|_| DEFAULT_API_ADDRESS.to_string());

    let state = Arc::new(ServerState::from_env()?);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&host_url)
        .await
        .map_err(AppError::Bind)?;
    info!(address = %host_url, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("server stopped");
    Ok(())
}

/// Full router with middleware; generic so tests can inject fakes.
pub fn build_router<G, S>(state: Arc<AppState<G, S>>) -> Router
where
    G: TextGenerator + 'static,
    S: SeedStore + 'static,
{
    Router::new()
        .route("/sessions", post(start_session_route::<G, S>))
        .route("/sessions/{id}/next", post(next_step_route::<G, S>))
        .route("/sessions/{id}/finalize", post(finalize_route::<G, S>))
        .route("/health", get(health_route::<G, S>))
        .layer(middleware::from_fn(json_error_mapper))
        .layer(middleware::from_fn(ensure_request_id))
        .with_state(state)
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

use std::sync::Arc;

use axum::{extract::State, response::Response};
use elicitation::{SeedStore, TextGenerator};
use tracing::{instrument, warn};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    routes::health::health_response::HealthResponse,
};

/// `GET /health`: backend probe snapshot. Always `200`; degraded backends are
/// reported in the body because sessions keep working on fallbacks.
#[instrument(name = "health_route", skip_all)]
pub async fn health_route<G, S>(State(state): State<Arc<AppState<G, S>>>) -> Response
where
    G: TextGenerator + 'static,
    S: SeedStore + 'static,
{
    let backends = state.engine.generator().health().await;
    let healthy = backends.iter().all(|b| b.ok);
    if !healthy {
        warn!("one or more generation backends are unhealthy");
    }

    ApiResponse::ok(HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        backends,
    })
}

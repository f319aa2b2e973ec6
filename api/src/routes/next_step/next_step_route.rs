use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    response::Response,
};
use elicitation::{SeedStore, TextGenerator};
use tracing::{info, instrument};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::AppResult,
    routes::next_step::{next_step_request::NextStepRequest, next_step_response::NextStepResponse},
};

/// `POST /sessions/{id}/next`: next question batch or the final brief.
///
/// Replaying the same transcript is safe; nothing here counts calls.
#[instrument(
    name = "next_step_route",
    skip(state, body),
    fields(answered = body.transcript.len())
)]
pub async fn next_step_route<G, S>(
    State(state): State<Arc<AppState<G, S>>>,
    Path(session_id): Path<String>,
    Json(body): Json<NextStepRequest>,
) -> AppResult<Response>
where
    G: TextGenerator + 'static,
    S: SeedStore + 'static,
{
    let outcome: NextStepResponse = state.engine.next_step(&session_id, body.transcript).await?;
    info!(done = outcome.is_done(), "next step served");
    Ok(ApiResponse::ok(outcome))
}

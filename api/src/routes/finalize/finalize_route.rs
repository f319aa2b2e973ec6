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
    routes::finalize::{finalize_request::FinalizeRequest, finalize_response::FinalizeResponse},
};

/// `POST /sessions/{id}/finalize`: hands the accepted brief to the document queue.
#[instrument(name = "finalize_route", skip(state, body))]
pub async fn finalize_route<G, S>(
    State(state): State<Arc<AppState<G, S>>>,
    Path(session_id): Path<String>,
    Json(body): Json<FinalizeRequest>,
) -> AppResult<Response>
where
    G: TextGenerator + 'static,
    S: SeedStore + 'static,
{
    let ticket = state
        .engine
        .finalize(&session_id, body.final_brief, body.transcript)
        .await?;
    info!(job_id = %ticket.job_id, "brief finalized");

    Ok(ApiResponse::ok(FinalizeResponse {
        job_id: ticket.job_id,
    }))
}

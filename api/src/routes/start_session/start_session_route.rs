use std::sync::Arc;

use axum::{
    extract::{Json, State},
    response::Response,
};
use elicitation::{SeedStore, TextGenerator};
use tracing::{info, instrument};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::AppResult,
    routes::start_session::{
        start_session_request::StartSessionRequest, start_session_response::StartSessionResponse,
    },
};

/// `POST /sessions`: validates the seed topic and creates the session.
#[instrument(name = "start_session_route", skip_all, fields(keywords = body.topic.len()))]
pub async fn start_session_route<G, S>(
    State(state): State<Arc<AppState<G, S>>>,
    Json(body): Json<StartSessionRequest>,
) -> AppResult<Response>
where
    G: TextGenerator + 'static,
    S: SeedStore + 'static,
{
    let seed = state.engine.start_session(body.topic).await?;
    info!(session_id = %seed.session_id, "session created");

    Ok(ApiResponse::ok(StartSessionResponse {
        session_id: seed.session_id,
        topic: seed.topic.keywords().to_vec(),
        created_at: seed.created_at,
    }))
}

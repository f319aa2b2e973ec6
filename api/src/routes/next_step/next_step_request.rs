use elicitation::Answer;
use serde::Deserialize;

/// Body of `POST /sessions/{id}/next`: the full transcript so far.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextStepRequest {
    pub transcript: Vec<Answer>,
}

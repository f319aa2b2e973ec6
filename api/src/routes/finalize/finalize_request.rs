use elicitation::{Answer, FinalBrief};
use serde::Deserialize;

/// Body of `POST /sessions/{id}/finalize`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeRequest {
    /// Brief as accepted by the user (possibly with another `selectedTitle`).
    pub final_brief: FinalBrief,
    #[serde(default)]
    pub transcript: Vec<Answer>,
}

use serde::Deserialize;

/// Body of `POST /sessions`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    /// Seed keywords; the first one is the primary topic.
    pub topic: Vec<String>,
}

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionResponse {
    pub session_id: String,
    /// Topic as stored, after trimming and blank removal.
    pub topic: Vec<String>,
    pub created_at: DateTime<Utc>,
}

use ai_llm_service::health_service::HealthStatus;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `ok` when every backend answered, `degraded` otherwise.
    pub status: &'static str,
    pub backends: Vec<HealthStatus>,
}

//! The seam between the engine and the generative backend.
//!
//! The engine is generic over [`TextGenerator`] (static dispatch, no boxed
//! futures). [`LlmServiceProfiles`] is the production implementation; tests
//! plug in scripted generators.

use std::future::Future;
use std::time::Duration;

use ai_llm_service::health_service::HealthStatus;
use ai_llm_service::{AiLlmError, LlmServiceProfiles};
use thiserror::Error;

/// Which backend profile a request should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Latency-sensitive calls: question batches, topic research.
    Fast,
    /// Quality-sensitive calls: summary, title candidates.
    Slow,
}

/// One "complete this instruction" request.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub profile: Profile,
    pub system: Option<&'a str>,
    pub prompt: &'a str,
    /// Ask the backend to constrain output to a JSON document.
    pub json: bool,
}

/// Why a backend call produced nothing usable.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("backend error: {0}")]
    Backend(#[from] AiLlmError),

    #[error("backend call timed out after {0:?}")]
    Timeout(Duration),

    /// Response arrived but violates the expected payload contract.
    #[error("unusable backend output: {0}")]
    Contract(String),
}

impl GenerationError {
    /// Whether a fresh request has a chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationError::Backend(e) => e.is_transient(),
            GenerationError::Timeout(_) | GenerationError::Contract(_) => true,
        }
    }
}

/// Generative text backend as seen by the engine.
pub trait TextGenerator: Send + Sync {
    /// Runs one request and returns the raw text output.
    fn generate(
        &self,
        request: GenerationRequest<'_>,
    ) -> impl Future<Output = Result<String, GenerationError>> + Send;

    /// Backend health, for the `/health` endpoint. Empty when not applicable.
    fn health(&self) -> impl Future<Output = Vec<HealthStatus>> + Send {
        async { Vec::new() }
    }
}

impl TextGenerator for LlmServiceProfiles {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<String, GenerationError> {
        let out = match request.profile {
            Profile::Fast => {
                self.generate_fast(request.prompt, request.system, request.json)
                    .await?
            }
            Profile::Slow => {
                self.generate_slow(request.prompt, request.system, request.json)
                    .await?
            }
        };
        Ok(out)
    }

    async fn health(&self) -> Vec<HealthStatus> {
        self.health_all().await
    }
}

/// Runs `request` bounded by `timeout`; an elapsed timer becomes [`GenerationError::Timeout`].
pub async fn generate_bounded<G: TextGenerator>(
    generator: &G,
    request: GenerationRequest<'_>,
    timeout: Duration,
) -> Result<String, GenerationError> {
    match tokio::time::timeout(timeout, generator.generate(request)).await {
        Ok(result) => result,
        Err(_) => Err(GenerationError::Timeout(timeout)),
    }
}

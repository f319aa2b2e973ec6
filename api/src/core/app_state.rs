use ai_llm_service::LlmServiceProfiles;
use ai_llm_service::config::default_config::profiles_from_env;
use ai_llm_service::error_handler::env_opt_u64;
use elicitation::{ConfiguredStore, ElicitationEngine, EngineConfig, FileJobQueue};

use crate::error_handler::AppError;

/// Shared state for all HTTP handlers.
///
/// Generic over the backend and store so tests can run the real router
/// against scripted generators and in-memory stores.
pub struct AppState<G, S> {
    pub engine: ElicitationEngine<G, S>,
}

/// State used by the production server.
pub type ServerState = AppState<LlmServiceProfiles, ConfiguredStore>;

impl<G, S> AppState<G, S> {
    pub fn new(engine: ElicitationEngine<G, S>) -> Self {
        Self { engine }
    }
}

impl ServerState {
    /// Load shared state from environment variables.
    ///
    /// Backend: `LLM_KIND` and the provider variables (see `ai-llm-service`),
    /// `LLM_HEALTH_TIMEOUT_SECS` for the health probe.
    /// Engine: `ELICITATION_*` (see [`EngineConfig::from_env`]).
    pub fn from_env() -> Result<Self, AppError> {
        let (fast, slow) = profiles_from_env()?;
        let health_timeout = env_opt_u64("LLM_HEALTH_TIMEOUT_SECS")?;
        let profiles = LlmServiceProfiles::new(fast, Some(slow), health_timeout)?;

        let cfg = EngineConfig::from_env()?;
        let store = ConfiguredStore::from_config(&cfg);
        let jobs = FileJobQueue::new(cfg.data_dir.join("jobs"));

        Ok(Self::new(ElicitationEngine::new(profiles, store, jobs, cfg)))
    }
}

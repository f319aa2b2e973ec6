//! Runtime configuration for the engine.
//!
//! Defaults are the production values; every numeric knob can be overridden
//! from the environment (see [`EngineConfig::from_env`]).

use std::path::PathBuf;
use std::time::Duration;

use ai_llm_service::error_handler::{env_opt_u32, env_opt_u64, opt_env};

use crate::errors::ElicitationError;
use crate::model::TargetLength;

/// Upper bound on questions per batch, regardless of configuration.
pub const MAX_BATCH_SIZE: usize = 8;

/// Which seed store implementation to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// JSON documents under `data_dir`.
    File,
    /// Process-local map; sessions vanish on restart.
    Memory,
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum transcript length; reaching it terminates the session.
    pub hard_cap: usize,
    /// Topic research is used only while the transcript is shorter than this.
    pub research_phase_limit: usize,
    /// Target number of questions per batch (1..=8).
    pub batch_size: usize,
    /// Backend attempts per question batch before the templated fallback.
    pub max_attempts: usize,
    /// Timeout applied to every single backend call.
    pub call_timeout: Duration,
    /// Number of title candidates in a final brief.
    pub title_count: usize,
    /// Target length used when the backend gives none (hard cap, fallback).
    pub default_target_length: TargetLength,
    /// Root directory for seeds, research cache, and job files.
    pub data_dir: PathBuf,
    /// Seed store implementation.
    pub store: StoreKind,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hard_cap: 30,
            research_phase_limit: 15,
            batch_size: MAX_BATCH_SIZE,
            max_attempts: 3,
            call_timeout: Duration::from_secs(45),
            title_count: 6,
            default_target_length: TargetLength::Medium,
            data_dir: PathBuf::from("data/elicitation"),
            store: StoreKind::File,
        }
    }
}

impl EngineConfig {
    /// Loads overrides from the environment on top of [`Default`].
    ///
    /// - `ELICITATION_HARD_CAP`, `ELICITATION_RESEARCH_LIMIT`
    /// - `ELICITATION_BATCH_SIZE` (clamped to 1..=8)
    /// - `ELICITATION_MAX_ATTEMPTS` (min 1)
    /// - `ELICITATION_CALL_TIMEOUT_SECS`
    /// - `ELICITATION_DATA_DIR`, `ELICITATION_STORE` (`file` | `memory`)
    ///
    /// # Errors
    /// [`ElicitationError::Config`] when a value is set but invalid.
    pub fn from_env() -> Result<Self, ElicitationError> {
        let mut cfg = Self::default();
        let cfg_err = |e: ai_llm_service::AiLlmError| ElicitationError::Config(e.to_string());

        if let Some(v) = env_opt_u32("ELICITATION_HARD_CAP").map_err(cfg_err)? {
            if v == 0 {
                return Err(ElicitationError::Config(
                    "ELICITATION_HARD_CAP must be > 0".into(),
                ));
            }
            cfg.hard_cap = v as usize;
        }
        if let Some(v) = env_opt_u32("ELICITATION_RESEARCH_LIMIT").map_err(cfg_err)? {
            cfg.research_phase_limit = v as usize;
        }
        if let Some(v) = env_opt_u32("ELICITATION_BATCH_SIZE").map_err(cfg_err)? {
            cfg.batch_size = (v as usize).clamp(1, MAX_BATCH_SIZE);
        }
        if let Some(v) = env_opt_u32("ELICITATION_MAX_ATTEMPTS").map_err(cfg_err)? {
            cfg.max_attempts = (v as usize).max(1);
        }
        if let Some(v) = env_opt_u64("ELICITATION_CALL_TIMEOUT_SECS").map_err(cfg_err)? {
            cfg.call_timeout = Duration::from_secs(v.max(1));
        }
        if let Some(dir) = opt_env("ELICITATION_DATA_DIR") {
            cfg.data_dir = PathBuf::from(dir);
        }
        if let Some(kind) = opt_env("ELICITATION_STORE") {
            cfg.store = match kind.trim().to_ascii_lowercase().as_str() {
                "file" => StoreKind::File,
                "memory" => StoreKind::Memory,
                other => {
                    return Err(ElicitationError::Config(format!(
                        "ELICITATION_STORE must be `file` or `memory`, got `{other}`"
                    )));
                }
            };
        }

        Ok(cfg)
    }

    /// Number of questions the next batch may carry for a transcript of `answered` entries.
    pub fn batch_limit(&self, answered: usize) -> usize {
        self.batch_size
            .clamp(1, MAX_BATCH_SIZE)
            .min(self.hard_cap.saturating_sub(answered))
    }
}

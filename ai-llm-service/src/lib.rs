//! Generative text backend shared by the elicitation engine.
//!
//! - [`config`]: model configs and env-driven constructors.
//! - [`service_profiles`]: `fast`/`slow` generation profiles with cached clients.
//! - [`health_service`]: resilient backend probes for `/health`.
//! - [`error_handler`]: the unified [`AiLlmError`](error_handler::AiLlmError).

pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod service_profiles;
pub mod services;

pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::AiLlmError;
pub use service_profiles::LlmServiceProfiles;

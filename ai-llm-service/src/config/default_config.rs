//! Default LLM configs loaded strictly from environment variables.
//!
//! Two roles are used by the elicitation engine:
//!
//! - **Fast** → question batches and topic research (latency-sensitive)
//! - **Slow** → final summary and title candidates (quality-sensitive)
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_KIND`          = `ollama` (default) or `openai`
//! - `LLM_MAX_TOKENS`    = optional max output tokens (u32)
//! - `LLM_TIMEOUT_SECS`  = optional HTTP timeout (u64, default 60)
//!
//! Ollama:
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (mandatory)
//! - `OLLAMA_MODEL`                = slow/quality model (mandatory)
//! - `OLLAMA_MODEL_FAST`           = fast model (optional, falls back to `OLLAMA_MODEL`)
//!
//! OpenAI:
//! - `OPENAI_API_KEY`    = API key (mandatory)
//! - `OPENAI_BASE_URL`   = endpoint (default `https://api.openai.com`)
//! - `OPENAI_MODEL`      = slow/quality model (mandatory)
//! - `OPENAI_MODEL_FAST` = fast model (optional, falls back to `OPENAI_MODEL`)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, env_opt_u32, env_opt_u64, must_env, opt_env,
        validate_http_endpoint,
    },
};

/// Resolves the Ollama endpoint.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
///
/// # Errors
///
/// - [`ConfigError::MissingVar`] if both are missing
/// - [`ConfigError::InvalidNumber`] if `OLLAMA_PORT` is invalid
fn ollama_endpoint() -> Result<String, AiLlmError> {
    if let Some(url) = opt_env("OLLAMA_URL") {
        validate_http_endpoint("OLLAMA_URL", &url)?;
        return Ok(url);
    }
    if let Some(port) = opt_env("OLLAMA_PORT") {
        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidNumber {
                var: "OLLAMA_PORT",
                reason: "expected u16 (1..=65535)",
            })?;
        return Ok(format!("http://localhost:{port}"));
    }
    Err(AiLlmError::Config(ConfigError::MissingVar(
        "OLLAMA_URL or OLLAMA_PORT",
    )))
}

/// Selected provider from `LLM_KIND` (Ollama when unset).
pub fn provider_from_env() -> Result<LlmProvider, AiLlmError> {
    match opt_env("LLM_KIND") {
        Some(kind) => Ok(kind.parse::<LlmProvider>()?),
        None => Ok(LlmProvider::Ollama),
    }
}

/// Builds `(fast, slow)` profiles for the provider selected by `LLM_KIND`.
///
/// # Errors
/// Any [`ConfigError`] raised while reading the provider's variables.
pub fn profiles_from_env() -> Result<(LlmModelConfig, LlmModelConfig), AiLlmError> {
    match provider_from_env()? {
        LlmProvider::Ollama => Ok((config_ollama_fast()?, config_ollama_slow()?)),
        LlmProvider::OpenAI => Ok((config_openai_fast()?, config_openai_slow()?)),
    }
}

/// Constructs a config for the **slow/quality** Ollama model.
///
/// # Defaults
/// - `temperature = Some(0.4)`
pub fn config_ollama_slow() -> Result<LlmModelConfig, AiLlmError> {
    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model: must_env("OLLAMA_MODEL")?,
        endpoint: ollama_endpoint()?,
        api_key: None,
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: Some(0.4),
        top_p: None,
        timeout_secs: env_opt_u64("LLM_TIMEOUT_SECS")?,
    })
}

/// Constructs a config for the **fast** Ollama model.
///
/// # Defaults
/// - `temperature = Some(0.7)`, `top_p = Some(0.9)`
pub fn config_ollama_fast() -> Result<LlmModelConfig, AiLlmError> {
    let model = match opt_env("OLLAMA_MODEL_FAST") {
        Some(m) => m,
        None => must_env("OLLAMA_MODEL")?,
    };

    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model,
        endpoint: ollama_endpoint()?,
        api_key: None,
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: Some(0.7),
        top_p: Some(0.9),
        timeout_secs: env_opt_u64("LLM_TIMEOUT_SECS")?,
    })
}

fn openai_endpoint() -> Result<String, AiLlmError> {
    let url = opt_env("OPENAI_BASE_URL").unwrap_or_else(|| "https://api.openai.com".into());
    validate_http_endpoint("OPENAI_BASE_URL", &url)?;
    Ok(url)
}

/// Constructs a config for the **slow/quality** OpenAI model.
pub fn config_openai_slow() -> Result<LlmModelConfig, AiLlmError> {
    Ok(LlmModelConfig {
        provider: LlmProvider::OpenAI,
        model: must_env("OPENAI_MODEL")?,
        endpoint: openai_endpoint()?,
        api_key: Some(must_env("OPENAI_API_KEY")?),
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: Some(0.4),
        top_p: None,
        timeout_secs: env_opt_u64("LLM_TIMEOUT_SECS")?,
    })
}

/// Constructs a config for the **fast** OpenAI model.
pub fn config_openai_fast() -> Result<LlmModelConfig, AiLlmError> {
    let model = match opt_env("OPENAI_MODEL_FAST") {
        Some(m) => m,
        None => must_env("OPENAI_MODEL")?,
    };

    Ok(LlmModelConfig {
        provider: LlmProvider::OpenAI,
        model,
        endpoint: openai_endpoint()?,
        api_key: Some(must_env("OPENAI_API_KEY")?),
        max_tokens: env_opt_u32("LLM_MAX_TOKENS")?,
        temperature: Some(0.7),
        top_p: Some(0.9),
        timeout_secs: env_opt_u64("LLM_TIMEOUT_SECS")?,
    })
}

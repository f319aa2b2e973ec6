use crate::config::llm_provider::LlmProvider;

/// Configuration for one generation profile.
///
/// `model` and `max_tokens` are the two knobs the elicitation engine cares
/// about; sampling parameters are passed through untouched.
///
/// # Examples
///
/// ```
/// use ai_llm_service::{LlmModelConfig, LlmProvider};
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::Ollama,
///     model: "qwen3:14b".to_string(),
///     endpoint: "http://localhost:11434".to_string(),
///     api_key: None,
///     max_tokens: Some(1024),
///     temperature: Some(0.7),
///     top_p: Some(0.9),
///     timeout_secs: Some(45),
/// };
/// assert_eq!(cfg.timeout().as_secs(), 45);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The backend provider.
    pub provider: LlmProvider,

    /// Model identifier (e.g. `"gpt-4o-mini"`, `"qwen3:14b"`).
    pub model: String,

    /// Base URL of the backend.
    pub endpoint: String,

    /// API key for providers that require authentication.
    pub api_key: Option<String>,

    /// Maximum output size in tokens.
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling cutoff.
    pub top_p: Option<f32>,

    /// Request timeout in seconds (60 when unset).
    pub timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    /// Effective HTTP timeout for this profile.
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs.unwrap_or(60))
    }

    /// Endpoint without trailing slashes.
    pub fn base_url(&self) -> &str {
        self.endpoint.trim().trim_end_matches('/')
    }
}

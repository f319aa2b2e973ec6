//! Health probes for the generative backends.
//!
//! - Ollama: `GET {endpoint}/api/tags`, model is looked up in `models[].name`
//! - OpenAI: `GET {endpoint}/v1/models` with Bearer auth, model is looked up in `data[].id`
//!
//! [`HealthService::check`] never fails: every error becomes `ok=false`, which
//! is what a `/health` endpoint wants.

use std::time::Instant;

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{
    AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet,
};

/// A serializable health snapshot for a single profile.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub provider: String,
    pub endpoint: String,
    pub model: String,
    pub ok: bool,
    pub latency_ms: u128,
    pub message: String,
}

impl HealthStatus {
    fn new(cfg: &LlmModelConfig, ok: bool, latency_ms: u128, message: impl Into<String>) -> Self {
        Self {
            provider: format!("{:?}", cfg.provider),
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            ok,
            latency_ms,
            message: message.into(),
        }
    }
}

/// Probe client reused across all checks.
pub struct HealthService {
    client: reqwest::Client,
}

impl HealthService {
    /// Creates a health service with a client timeout in seconds (default 10).
    ///
    /// # Errors
    /// [`AiLlmError::HttpTransport`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, AiLlmError> {
        let timeout = std::time::Duration::from_secs(timeout_secs.unwrap_or(10));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AiLlmError::HttpTransport)?;
        debug!(timeout_secs = timeout.as_secs(), "HealthService initialized");
        Ok(Self { client })
    }

    /// Checks a single profile. Never returns an error.
    pub async fn check(&self, cfg: &LlmModelConfig) -> HealthStatus {
        let start = Instant::now();
        let result = match cfg.provider {
            LlmProvider::Ollama => self.probe_ollama(cfg).await,
            LlmProvider::OpenAI => self.probe_openai(cfg).await,
        };
        let latency = start.elapsed().as_millis();

        let status = match result {
            Ok(true) => HealthStatus::new(cfg, true, latency, "backend is healthy; model is available"),
            Ok(false) => HealthStatus::new(cfg, false, latency, "backend is up, but model is not listed"),
            Err(e) => HealthStatus::new(cfg, false, latency, e.to_string()),
        };

        if status.ok {
            info!(provider = %status.provider, model = %status.model, latency_ms = latency, "health probe ok");
        } else {
            warn!(provider = %status.provider, model = %status.model, message = %status.message, "health probe failed");
        }
        status
    }

    /// Checks several profiles sequentially.
    pub async fn check_many(&self, configs: &[LlmModelConfig]) -> Vec<HealthStatus> {
        let mut out = Vec::with_capacity(configs.len());
        for cfg in configs {
            out.push(self.check(cfg).await);
        }
        out
    }

    async fn probe_ollama(&self, cfg: &LlmModelConfig) -> Result<bool, AiLlmError> {
        #[derive(Deserialize)]
        struct Tag {
            name: String,
        }
        #[derive(Deserialize)]
        struct Tags {
            #[serde(default)]
            models: Vec<Tag>,
        }

        let url = format!("{}/api/tags", cfg.base_url());
        let resp = self.client.get(&url).send().await?;
        let resp = ensure_success(Provider::Ollama, url, resp).await?;
        let tags: Tags = resp.json().await.map_err(|e| decode(Provider::Ollama, e))?;
        Ok(tags.models.iter().any(|m| m.name == cfg.model))
    }

    async fn probe_openai(&self, cfg: &LlmModelConfig) -> Result<bool, AiLlmError> {
        #[derive(Deserialize)]
        struct ModelItem {
            id: String,
        }
        #[derive(Deserialize)]
        struct Models {
            #[serde(default)]
            data: Vec<ModelItem>,
        }

        let api_key = cfg
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::new(Provider::OpenAI, ProviderErrorKind::MissingApiKey))?;

        let url = format!("{}/v1/models", cfg.base_url());
        let resp = self
            .client
            .get(&url)
            .header(header::AUTHORIZATION, format!("Bearer {api_key}"))
            .send()
            .await?;
        let resp = ensure_success(Provider::OpenAI, url, resp).await?;
        let models: Models = resp.json().await.map_err(|e| decode(Provider::OpenAI, e))?;
        Ok(models.data.iter().any(|m| m.id == cfg.model))
    }
}

async fn ensure_success(
    provider: Provider,
    url: String,
    resp: reqwest::Response,
) -> Result<reqwest::Response, AiLlmError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let snippet = make_snippet(&resp.text().await.unwrap_or_default());
    Err(ProviderError::new(
        provider,
        ProviderErrorKind::HttpStatus(HttpError {
            status,
            url,
            snippet,
        }),
    )
    .into())
}

fn decode(provider: Provider, e: reqwest::Error) -> AiLlmError {
    ProviderError::new(provider, ProviderErrorKind::Decode(e.to_string())).into()
}

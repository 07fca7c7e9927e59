//! HTTP embedding backend for OpenAI-shaped `/embeddings` endpoints.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use vault_core::{defaults, EmbeddingBackend, Error, Result, Vector};

use super::error::{to_vault_error, OpenAIErrorCode};
use super::types::*;

/// Embedding calls slower than this are logged as slow.
pub const SLOW_EMBED_MS: u64 = 5000;

/// Where and how to reach the embedding endpoint.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key for authentication (optional for local endpoints).
    pub api_key: Option<String>,
    /// Model to use for embeddings.
    pub embed_model: String,
    /// Expected embedding dimension.
    pub embed_dimension: usize,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::EMBED_BASE_URL.to_string(),
            api_key: None,
            embed_model: defaults::EMBED_MODEL.to_string(),
            embed_dimension: defaults::EMBED_DIMENSION,
            timeout_seconds: defaults::EMBED_TIMEOUT_SECS,
        }
    }
}

impl OpenAIConfig {
    /// Read configuration from `EMBED_*` environment variables.
    ///
    /// `EMBED_API_KEY` falls back to `OPENAI_API_KEY`.
    pub fn from_env() -> Self {
        let base = Self::default();
        Self {
            base_url: env_string("EMBED_BASE_URL").unwrap_or(base.base_url),
            api_key: env_string("EMBED_API_KEY").or_else(|| env_string("OPENAI_API_KEY")),
            embed_model: env_string("EMBED_MODEL").unwrap_or(base.embed_model),
            embed_dimension: env_parsed("EMBED_DIM").unwrap_or(base.embed_dimension),
            timeout_seconds: env_parsed("EMBED_TIMEOUT_SECS").unwrap_or(base.timeout_seconds),
        }
    }

    fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.base_url.trim_end_matches('/'))
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse().ok())
}

/// Embedding collaborator reached over HTTP.
pub struct OpenAIBackend {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIBackend {
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "openai",
            url = %config.base_url,
            model = %config.embed_model,
            dimension = config.embed_dimension,
            has_api_key = config.api_key.is_some(),
            "Embedding backend ready"
        );

        Ok(Self { client, config })
    }

    /// Build from `EMBED_*` variables, see [`OpenAIConfig::from_env`].
    pub fn from_env() -> Result<Self> {
        Self::new(OpenAIConfig::from_env())
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    /// Turn a non-2xx embeddings response into an embedding error.
    async fn rejection(response: reqwest::Response) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let (error_type, message) = match serde_json::from_str::<OpenAIErrorResponse>(&body) {
            Ok(parsed) => (parsed.error.error_type, parsed.error.message),
            Err(_) => (String::new(), format!("{}: {}", status, body)),
        };
        let code = OpenAIErrorCode::from_response(status.as_u16(), &error_type);
        warn!(
            status = status.as_u16(),
            error_code = ?code,
            "Embedding endpoint returned an error"
        );
        to_vault_error(code, &message)
    }
}

#[async_trait]
impl EmbeddingBackend for OpenAIBackend {
    #[instrument(skip(self, texts), fields(subsystem = "inference", component = "openai", op = "embed_texts", input_count = texts.len()))]
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let start = Instant::now();

        let mut request = self.client.post(self.config.embeddings_url()).json(&EmbeddingRequest {
            model: self.config.embed_model.clone(),
            input: texts.to_vec(),
            encoding_format: Some("float".to_string()),
        });
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("Request failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let mut body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Failed to parse response: {}", e)))?;
        if body.data.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                body.data.len()
            )));
        }

        // Entries may arrive out of input order.
        body.data.sort_by_key(|d| d.index);
        let vectors: Vec<Vector> = body
            .data
            .into_iter()
            .map(|d| Vector::from(d.embedding))
            .collect();

        if let Some(got) = vectors.first().map(|v| v.as_slice().len()) {
            if got != self.config.embed_dimension {
                warn!(
                    expected = self.config.embed_dimension,
                    got, "Embedding dimension differs from EMBED_DIM"
                );
            }
        }

        let elapsed = start.elapsed().as_millis() as u64;
        if elapsed > SLOW_EMBED_MS {
            warn!(duration_ms = elapsed, "Slow embedding call");
        } else {
            debug!(duration_ms = elapsed, result_count = vectors.len(), "Embedded");
        }
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.config.embed_dimension
    }

    fn model_name(&self) -> &str {
        &self.config.embed_model
    }
}

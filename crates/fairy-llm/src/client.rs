//! Minimal Ollama HTTP client.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Default Ollama server URL.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Default request timeout (seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors talking to the Ollama server.
#[derive(Error, Debug)]
pub enum OllamaError {
    #[error("cannot build HTTP client: {0}")]
    Client(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("Ollama returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse response: {0}")]
    Decode(String),
}

/// Shared client for one Ollama server.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaClient {
    /// Client for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, OllamaError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OllamaError::Client(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!("Ollama client for {}", base_url);
        Ok(Self { client, base_url })
    }

    /// Client for the default local server.
    pub fn local() -> Result<Self, OllamaError> {
        Self::new(DEFAULT_OLLAMA_URL, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Server base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Non-streaming completion via `/api/generate`.
    pub async fn generate(&self, model: &str, prompt: &str) -> Result<String, OllamaError> {
        let start = Instant::now();
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| OllamaError::Request(e.to_string()))?;

        let result: GenerateResponse = Self::decode(response).await?;
        let elapsed = start.elapsed().as_millis() as u64;
        debug!(model, duration_ms = elapsed, "Generation complete");
        if elapsed > 20_000 {
            warn!(model, duration_ms = elapsed, "Slow generation");
        }
        Ok(result.response)
    }

    /// Batch embedding via `/api/embed`. One vector per input, in order.
    pub async fn embed(&self, model: &str, input: &[&str]) -> Result<Vec<Vec<f32>>, OllamaError> {
        if input.is_empty() {
            return Ok(vec![]);
        }

        let response = self
            .client
            .post(format!("{}/api/embed", self.base_url))
            .json(&EmbedRequest { model, input })
            .send()
            .await
            .map_err(|e| OllamaError::Request(e.to_string()))?;

        let result: EmbedResponse = Self::decode(response).await?;
        debug!(model, count = result.embeddings.len(), "Embedding complete");
        Ok(result.embeddings)
    }

    /// Whether the server answers `/api/tags`.
    pub async fn health_check(&self) -> bool {
        match self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Ollama health check failed: {e}");
                false
            }
        }
    }

    async fn decode<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, OllamaError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OllamaError::Status {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json()
            .await
            .map_err(|e| OllamaError::Decode(e.to_string()))
    }
}

//! Embedding client (C2): encodes text batches into fixed-dimension vectors.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use lawagent_core::{CoreError, Result};
use tracing::instrument;

use crate::retry::with_retry;
use crate::types::{EmbeddingRequestBody, EmbeddingResponseBody};

#[derive(Debug, Clone)]
pub struct EmbeddingClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub max_retries: u32,
    pub timeout: Duration,
}

impl EmbeddingClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            max_retries: 3,
            timeout: Duration::from_secs(300),
        }
    }
}

/// Encodes text into vectors. Dimension is auto-detected on first call and
/// then immutable for the life of the client.
pub struct EmbeddingClient {
    config: EmbeddingClientConfig,
    http: reqwest::Client,
    dimension: AtomicUsize,
}

impl EmbeddingClient {
    pub fn new(config: EmbeddingClientConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            dimension: AtomicUsize::new(0),
        }
    }

    /// Configure (or lock in) the embedding dimension explicitly, bypassing
    /// auto-detection on first call.
    pub fn with_dimension(self, dim: usize) -> Self {
        self.dimension.store(dim, Ordering::SeqCst);
        self
    }

    pub fn dimension(&self) -> usize {
        self.dimension.load(Ordering::SeqCst)
    }

    /// Encode `texts`, preserving input order one-to-one.
    #[instrument(skip(self, texts), fields(model = %self.config.model, n_texts = texts.len()))]
    pub async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let vectors = with_retry(self.config.max_retries, || self.send_request(texts)).await?;

        if self.dimension() == 0 {
            if let Some(first) = vectors.first() {
                self.dimension.store(first.len(), Ordering::SeqCst);
            }
        }

        Ok(vectors)
    }

    async fn send_request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.config.base_url.trim_end_matches('/'));
        let body = EmbeddingRequestBody {
            model: &self.config.model,
            input: texts,
        };

        let response = tokio::time::timeout(
            self.config.timeout,
            self.http
                .post(&url)
                .bearer_auth(&self.config.api_key)
                .json(&body)
                .send(),
        )
        .await
        .map_err(|_| CoreError::Timeout {
            seconds: self.config.timeout.as_secs(),
            detail: "embedding request".to_string(),
        })?
        .map_err(|e| CoreError::provider(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CoreError::provider(format!("http {status}: {text}")));
        }

        let parsed: EmbeddingResponseBody = response
            .json()
            .await
            .map_err(|e| CoreError::provider(format!("invalid response body: {e}")))?;

        if parsed.data.len() != texts.len() {
            return Err(CoreError::provider(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        let mut ordered: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        for datum in parsed.data {
            if datum.index < ordered.len() {
                ordered[datum.index] = Some(datum.embedding);
            }
        }

        ordered
            .into_iter()
            .enumerate()
            .map(|(i, v)| v.ok_or_else(|| CoreError::provider(format!("missing embedding at index {i}"))))
            .collect()
    }
}

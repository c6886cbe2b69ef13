use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::Embedder;
use crate::error::{EmbeddingsError, Result};

/// Default `OpenAI` API base URL
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Inputs sent per request when embedding a batch
const MAX_BATCH_INPUTS: usize = 96;

/// Scoring oracle backed by an `OpenAI`-compatible `/embeddings` endpoint
pub struct OpenAiEmbedder {
    name: String,
    client: Client,
    model: String,
    api_key: Option<SecretString>,
    base_url: String,
    dimensions: Option<u32>,
}

impl OpenAiEmbedder {
    /// Create a new `OpenAI` embedder
    pub fn new(model: String, api_key: Option<SecretString>, base_url: Option<String>, dimensions: Option<u32>) -> Self {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());

        Self {
            name: format!("openai/{model}"),
            client: Client::new(),
            model,
            api_key,
            base_url,
            dimensions,
        }
    }

    async fn request(&self, input: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.base_url.trim_end_matches('/'));

        let wire_request = OpenAiEmbeddingRequest {
            input,
            model: &self.model,
            encoding_format: "float",
            dimensions: self.dimensions,
        };

        tracing::debug!(oracle = %self.name, inputs = input.len(), "sending embeddings request");

        let mut builder = self.client.post(&url).json(&wire_request);
        if let Some(ref api_key) = self.api_key {
            builder = builder.bearer_auth(api_key.expose_secret());
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(oracle = %self.name, error = %e, "embeddings request failed");
            EmbeddingsError::ConnectionError(format!("failed to send request to {url}: {e}"))
        })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "unknown error".to_owned());

            tracing::error!(oracle = %self.name, status = %status, "embeddings API error: {error_text}");

            return Err(EmbeddingsError::ProviderApiError {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let wire_response: OpenAiEmbeddingResponse = response.json().await.map_err(|e| {
            tracing::error!(oracle = %self.name, error = %e, "failed to parse embeddings response");
            EmbeddingsError::InvalidResponse(e.to_string())
        })?;

        order_by_index(wire_response.data, input.len())
    }
}

/// Wire format for the `OpenAI` embeddings API request
#[derive(Serialize)]
struct OpenAiEmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
    encoding_format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<u32>,
}

/// Wire format for the `OpenAI` embeddings API response
#[derive(Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<OpenAiEmbeddingData>,
}

#[derive(Deserialize)]
struct OpenAiEmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

/// Place each returned vector at its input position
///
/// The API does not promise response order, only an `index` per entry.
fn order_by_index(data: Vec<OpenAiEmbeddingData>, expected: usize) -> Result<Vec<Vec<f32>>> {
    let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];

    for entry in data {
        let slot = slots
            .get_mut(entry.index)
            .ok_or_else(|| EmbeddingsError::InvalidResponse(format!("unexpected embedding index {}", entry.index)))?;
        *slot = Some(entry.embedding);
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| slot.ok_or_else(|| EmbeddingsError::InvalidResponse(format!("missing embedding for input {i}"))))
        .collect()
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.request(&[text.to_owned()]).await?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingsError::InvalidResponse("empty embeddings response".to_owned()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(MAX_BATCH_INPUTS) {
            vectors.extend(self.request(chunk).await?);
        }
        Ok(vectors)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

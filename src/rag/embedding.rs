//! Text embeddings.
//!
//! Queries and ingested chunks must go through the same model so their
//! vectors are comparable.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::core::config::settings::EmbeddingSettings;
use crate::core::errors::ProviderError;
use crate::core::http::{bounded, build_client, ensure_success};

const PROVIDER: &str = "embeddings";

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Length of every vector this provider returns.
    fn dimension(&self) -> usize;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or(ProviderError::Empty { provider: PROVIDER })
    }
}

/// Client for an OpenAI-compatible `/v1/embeddings` endpoint.
#[derive(Clone)]
pub struct HttpEmbeddingProvider {
    base_url: String,
    model: String,
    api_key: Option<String>,
    dimension: usize,
    client: Client,
    timeout: Duration,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

impl HttpEmbeddingProvider {
    pub fn new(settings: &EmbeddingSettings, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone().filter(|k| !k.trim().is_empty()),
            dimension: settings.dimension,
            client: build_client(PROVIDER, timeout)?,
            timeout,
        })
    }
}

fn into_vectors(
    mut response: EmbeddingResponse,
    expected_len: usize,
    dimension: usize,
) -> Result<Vec<Vec<f32>>, ProviderError> {
    if response.data.len() != expected_len {
        return Err(ProviderError::decode(
            PROVIDER,
            format!(
                "expected {} embeddings, got {}",
                expected_len,
                response.data.len()
            ),
        ));
    }
    response.data.sort_by_key(|item| item.index);

    let vectors: Vec<Vec<f32>> = response.data.into_iter().map(|i| i.embedding).collect();
    if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
        return Err(ProviderError::decode(
            PROVIDER,
            format!("dimension {} does not match configured {}", bad.len(), dimension),
        ));
    }
    Ok(vectors)
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let response: EmbeddingResponse = bounded(PROVIDER, self.timeout, async {
            let mut req = self.client.post(&url).json(&body);
            if let Some(key) = &self.api_key {
                req = req.bearer_auth(key);
            }
            let res = req
                .send()
                .await
                .map_err(|e| ProviderError::http(PROVIDER, e))?;
            let res = ensure_success(PROVIDER, res).await?;
            res.json()
                .await
                .map_err(|e| ProviderError::decode(PROVIDER, e.to_string()))
        })
        .await?;

        into_vectors(response, texts.len(), self.dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn vectors_follow_input_order() {
        let response: EmbeddingResponse = serde_json::from_value(json!({
            "object": "list",
            "data": [
                { "index": 1, "embedding": [0.0, 1.0] },
                { "index": 0, "embedding": [1.0, 0.0] }
            ]
        }))
        .expect("deserialize");
        let vectors = into_vectors(response, 2, 2).expect("vectors");
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn wrong_dimension_is_rejected() {
        let response: EmbeddingResponse = serde_json::from_value(json!({
            "data": [{ "index": 0, "embedding": [0.5, 0.5, 0.5] }]
        }))
        .expect("deserialize");
        let err = into_vectors(response, 1, 384).expect_err("dimension");
        assert!(err.to_string().contains("384"));
    }

    #[test]
    fn missing_items_are_rejected() {
        let response: EmbeddingResponse =
            serde_json::from_value(json!({ "data": [] })).expect("deserialize");
        assert!(into_vectors(response, 1, 2).is_err());
    }
}

//! Pinecone data-plane client.
//!
//! Talks to a single serverless index through its host URL. Index
//! lifecycle (create/delete) is left to the Pinecone console.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::store::{VectorMatch, VectorRecord, VectorStore};
use crate::core::config::settings::VectorStoreSettings;
use crate::core::errors::ProviderError;
use crate::core::http::{bounded, build_client, ensure_success};

const PROVIDER: &str = "pinecone";
const API_VERSION: &str = "2024-07";

#[derive(Clone)]
pub struct PineconeStore {
    host: Option<String>,
    api_key: Option<String>,
    namespace: Option<String>,
    client: Client,
    timeout: Duration,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize, Default)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<VectorMatch>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Deserialize, Default)]
struct IndexStats {
    #[serde(default)]
    dimension: Option<usize>,
}

impl PineconeStore {
    pub fn new(settings: &VectorStoreSettings, timeout: Duration) -> Result<Self, ProviderError> {
        let host = settings
            .index_host
            .as_deref()
            .map(normalize_host)
            .filter(|h| !h.is_empty());
        Ok(Self {
            host,
            api_key: settings.api_key.clone().filter(|k| !k.trim().is_empty()),
            namespace: settings.namespace.clone().filter(|n| !n.is_empty()),
            client: build_client(PROVIDER, timeout)?,
            timeout,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.host.is_some() && self.api_key.is_some()
    }

    fn credentials(&self) -> Result<(&str, &str), ProviderError> {
        let host = self
            .host
            .as_deref()
            .ok_or_else(|| ProviderError::not_configured(PROVIDER, "PINECONE_INDEX_HOST not set"))?;
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::not_configured(PROVIDER, "PINECONE_API_KEY not set"))?;
        Ok((host, key))
    }

    async fn post<B: Serialize + Sync + ?Sized, R: DeserializeOwned + Send>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ProviderError> {
        let (host, key) = self.credentials()?;
        let url = format!("{}{}", host, path);

        bounded(PROVIDER, self.timeout, async {
            let res = self
                .client
                .post(&url)
                .header("Api-Key", key)
                .header("X-Pinecone-API-Version", API_VERSION)
                .json(body)
                .send()
                .await
                .map_err(|e| ProviderError::http(PROVIDER, e))?;
            let res = ensure_success(PROVIDER, res).await?;
            res.json::<R>()
                .await
                .map_err(|e| ProviderError::decode(PROVIDER, e.to_string()))
        })
        .await
    }
}

fn normalize_host(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() || trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

#[async_trait]
impl VectorStore for PineconeStore {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<VectorMatch>, ProviderError> {
        let body = QueryRequest {
            vector,
            top_k,
            include_metadata,
            include_values: false,
            namespace: self.namespace.as_deref(),
        };
        let response: QueryResponse = self.post("/query", &body).await?;
        Ok(response.matches)
    }

    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<usize, ProviderError> {
        if records.is_empty() {
            return Ok(0);
        }
        let mut body = json!({ "vectors": records });
        if let (Some(ns), Some(obj)) = (self.namespace.as_deref(), body.as_object_mut()) {
            obj.insert("namespace".to_string(), json!(ns));
        }
        let response: UpsertResponse = self.post("/vectors/upsert", &body).await?;
        Ok(response.upserted_count)
    }

    async fn dimension(&self) -> Result<Option<usize>, ProviderError> {
        let stats: IndexStats = self.post("/describe_index_stats", &json!({})).await?;
        Ok(stats.dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_gets_scheme_and_loses_trailing_slash() {
        assert_eq!(
            normalize_host("ayurwell-index-abc.svc.pinecone.io/"),
            "https://ayurwell-index-abc.svc.pinecone.io"
        );
        assert_eq!(normalize_host("http://localhost:5080"), "http://localhost:5080");
        assert_eq!(normalize_host("  "), "");
    }

    #[test]
    fn query_body_uses_camel_case_keys() {
        let vector = [0.1f32, 0.2];
        let body = QueryRequest {
            vector: &vector,
            top_k: 3,
            include_metadata: true,
            include_values: false,
            namespace: None,
        };
        let value = serde_json::to_value(&body).expect("serialize");
        assert_eq!(value["topK"], 3);
        assert_eq!(value["includeMetadata"], true);
        assert!(value.get("namespace").is_none());
    }

    #[test]
    fn query_response_tolerates_missing_metadata() {
        let response: QueryResponse = serde_json::from_value(serde_json::json!({
            "matches": [
                { "id": "a_0", "score": 0.82, "metadata": { "text": "Ashwagandha", "source": "a.pdf" } },
                { "id": "a_1", "score": 0.41 }
            ],
            "namespace": ""
        }))
        .expect("deserialize");
        assert_eq!(response.matches.len(), 2);
        assert_eq!(
            response.matches[0].metadata.as_ref().map(|m| m.text.as_str()),
            Some("Ashwagandha")
        );
        assert!(response.matches[1].metadata.is_none());
    }

    #[tokio::test]
    async fn unconfigured_store_fails_fast() {
        let store = PineconeStore::new(&VectorStoreSettings::default(), Duration::from_secs(1))
            .expect("client");
        assert!(!store.is_configured());
        let err = store.query(&[0.0; 4], 3, true).await.expect_err("no host");
        assert!(matches!(err, ProviderError::NotConfigured { .. }));
    }
}

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};

use crate::core::config::settings::WebSearchSettings;
use crate::core::errors::ProviderError;
use crate::core::http::{bounded, build_client, ensure_success};

const PROVIDER: &str = "tavily";

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[async_trait]
pub trait WebSearchProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ProviderError>;
}

#[derive(Clone)]
pub struct TavilySearch {
    base_url: String,
    api_key: Option<String>,
    search_depth: String,
    max_results: Option<u32>,
    client: Client,
    timeout: Duration,
}

impl TavilySearch {
    pub fn new(settings: &WebSearchSettings, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone().filter(|k| !k.trim().is_empty()),
            search_depth: settings.search_depth.clone(),
            max_results: settings.max_results,
            client: build_client(PROVIDER, timeout)?,
            timeout,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn request_body(&self, query: &str) -> Value {
        let mut body = json!({
            "query": query,
            "search_depth": self.search_depth,
        });
        if let (Some(max), Some(obj)) = (self.max_results, body.as_object_mut()) {
            obj.insert("max_results".to_string(), json!(max));
        }
        body
    }
}

#[async_trait]
impl WebSearchProvider for TavilySearch {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::not_configured(PROVIDER, "TAVILY_API_KEY not set"))?;
        let url = format!("{}/search", self.base_url);
        let body = self.request_body(query);

        let payload: Value = bounded(PROVIDER, self.timeout, async {
            let res = self
                .client
                .post(&url)
                .bearer_auth(api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| ProviderError::http(PROVIDER, e))?;
            let res = ensure_success(PROVIDER, res).await?;
            res.json()
                .await
                .map_err(|e| ProviderError::decode(PROVIDER, e.to_string()))
        })
        .await?;

        Ok(parse_results(&payload))
    }
}

fn parse_results(payload: &Value) -> Vec<SearchResult> {
    let items = payload
        .get("results")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    let mut results = Vec::new();
    for item in items {
        let snippet = item.get("content").and_then(|v| v.as_str()).unwrap_or("");
        if snippet.is_empty() {
            continue;
        }
        let title = item.get("title").and_then(|v| v.as_str()).unwrap_or("");
        let url = item.get("url").and_then(|v| v.as_str()).unwrap_or("");
        results.push(SearchResult {
            title: title.to_string(),
            url: url.to_string(),
            snippet: snippet.to_string(),
        });
    }
    results
}

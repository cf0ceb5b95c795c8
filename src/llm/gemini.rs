use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;

use super::provider::LlmProvider;
use super::types::{Content, GenerateContentRequest, GenerateContentResponse, ImageInput, Part};
use crate::core::config::settings::LlmSettings;
use crate::core::errors::ProviderError;
use crate::core::http::{bounded, build_client, ensure_success};

const PROVIDER: &str = "gemini";

#[derive(Clone)]
pub struct GeminiProvider {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: Client,
    timeout: Duration,
}

impl GeminiProvider {
    pub fn new(settings: &LlmSettings, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone().filter(|k| !k.trim().is_empty()),
            client: build_client(PROVIDER, timeout)?,
            timeout,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url,
            urlencoding::encode(&self.model)
        )
    }

    async fn generate(&self, parts: Vec<Part>) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::not_configured(PROVIDER, "GOOGLE_API_KEY not set"))?;

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
        };

        bounded(PROVIDER, self.timeout, async {
            let res = self
                .client
                .post(self.endpoint())
                .header("x-goog-api-key", api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| ProviderError::http(PROVIDER, e))?;
            let res = ensure_success(PROVIDER, res).await?;

            let payload: GenerateContentResponse = res
                .json()
                .await
                .map_err(|e| ProviderError::decode(PROVIDER, e.to_string()))?;
            extract_text(&payload)
        })
        .await
    }
}

fn extract_text(payload: &GenerateContentResponse) -> Result<String, ProviderError> {
    if let Some(text) = payload.text() {
        return Ok(text);
    }
    let reason = payload
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.clone());
    match reason {
        Some(reason) => Err(ProviderError::decode(
            PROVIDER,
            format!("prompt blocked: {}", reason),
        )),
        None => Err(ProviderError::Empty { provider: PROVIDER }),
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, ProviderError> {
        self.generate(vec![Part::text(prompt)]).await
    }

    async fn generate_with_image(
        &self,
        image: &ImageInput,
        prompt: &str,
    ) -> Result<String, ProviderError> {
        let encoded = STANDARD.encode(&image.bytes);
        self.generate(vec![
            Part::inline(image.mime_type.clone(), encoded),
            Part::text(prompt),
        ])
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).expect("response should deserialize")
    }

    #[test]
    fn joins_text_parts_of_first_candidate() {
        let payload = parse(json!({
            "candidates": [
                { "content": { "role": "model", "parts": [{ "text": "Vata " }, { "text": "imbalance" }] },
                  "finishReason": "STOP" },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }));
        assert_eq!(extract_text(&payload).expect("text"), "Vata imbalance");
    }

    #[test]
    fn blocked_prompt_is_reported() {
        let payload = parse(json!({ "promptFeedback": { "blockReason": "SAFETY" } }));
        let err = extract_text(&payload).expect_err("blocked prompt");
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn missing_candidates_is_empty() {
        let payload = parse(json!({}));
        assert!(matches!(
            extract_text(&payload),
            Err(ProviderError::Empty { .. })
        ));
    }

    #[test]
    fn image_request_serializes_inline_data_first() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::inline("image/png", STANDARD.encode([1u8, 2, 3])),
                    Part::text("describe"),
                ],
            }],
        };
        let value = serde_json::to_value(&body).expect("serialize");
        assert_eq!(
            value,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        { "inline_data": { "mime_type": "image/png", "data": "AQID" } },
                        { "text": "describe" }
                    ]
                }]
            })
        );
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let provider =
            GeminiProvider::new(&LlmSettings::default(), Duration::from_secs(1)).expect("client");
        assert!(!provider.is_configured());
        let err = provider.generate_text("hi").await.expect_err("no key");
        assert!(matches!(err, ProviderError::NotConfigured { .. }));
    }
}

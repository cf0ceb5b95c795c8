use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use ayurwell_backend::core::config::{AppPaths, ConfigService, Settings};
use ayurwell_backend::core::errors::ProviderError;
use ayurwell_backend::llm::{ImageInput, LlmProvider};
use ayurwell_backend::rag::{
    ChunkMetadata, EmbeddingProvider, InMemoryVectorStore, VectorRecord, VectorStore,
};
use ayurwell_backend::server::router::router;
use ayurwell_backend::state::{AppState, ProviderStatus, Providers};
use ayurwell_backend::tools::{SearchResult, WebSearchProvider};

struct EchoLlm;

#[async_trait]
impl LlmProvider for EchoLlm {
    fn name(&self) -> &str {
        "echo"
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, ProviderError> {
        if prompt.starts_with("You are an expert at refining") {
            return Ok("vata remedies".to_string());
        }
        Ok("Warm sesame oil massage helps.".to_string())
    }

    async fn generate_with_image(
        &self,
        _image: &ImageInput,
        _prompt: &str,
    ) -> Result<String, ProviderError> {
        Ok("a turmeric root".to_string())
    }
}

/// Every text maps to the same direction, so stored records score 1.0.
struct ConstantEmbedder;

#[async_trait]
impl EmbeddingProvider for ConstantEmbedder {
    fn dimension(&self) -> usize {
        2
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
    }
}

struct NoSearch;

#[async_trait]
impl WebSearchProvider for NoSearch {
    fn name(&self) -> &str {
        "none"
    }

    async fn search(&self, _query: &str) -> Result<Vec<SearchResult>, ProviderError> {
        Ok(Vec::new())
    }
}

async fn spawn_app(records: Vec<VectorRecord>) -> (SocketAddr, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = Arc::new(AppPaths::from_dirs(
        dir.path().to_path_buf(),
        dir.path().join("data"),
    ));
    let config = ConfigService::new(paths.clone());

    let store = Arc::new(InMemoryVectorStore::with_dimension(2));
    store.upsert(records).await.expect("seed store");

    let providers = Providers {
        llm: Arc::new(EchoLlm),
        embedder: Arc::new(ConstantEmbedder),
        store,
        search: Arc::new(NoSearch),
        status: ProviderStatus::default(),
    };
    let state = Arc::new(AppState::assemble(paths, config, Settings::default(), providers));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.expect("serve");
    });
    (addr, dir)
}

fn kb_record() -> VectorRecord {
    VectorRecord {
        id: "vata.pdf_0".to_string(),
        values: vec![1.0, 0.0],
        metadata: ChunkMetadata {
            text: "Abhyanga pacifies Vata.".to_string(),
            source: "vata.pdf".to_string(),
        },
    }
}

#[tokio::test]
async fn chat_round_trip_over_http() {
    let (addr, _dir) = spawn_app(vec![kb_record()]).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("http://{}/chat", addr))
        .json(&json!({ "message": "My Vata is high", "session_id": "s1" }))
        .send()
        .await
        .expect("request");
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.expect("json");
    assert_eq!(body["source"], "AyurWell Knowledge Base");
    assert_eq!(body["response"], "Warm sesame oil massage helps.");

    let history: Value = client
        .get(format!("http://{}/api/sessions/s1/history", addr))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(
        history["rendered"],
        "User: My Vata is high\nAyurWell: Warm sesame oil massage helps."
    );
    assert_eq!(history["turns"].as_array().map(Vec::len), Some(2));

    let res = client
        .delete(format!("http://{}/api/sessions/s1", addr))
        .send()
        .await
        .expect("request");
    assert_eq!(res.status(), 200);
    let res = client
        .get(format!("http://{}/api/sessions/s1/history", addr))
        .send()
        .await
        .expect("request");
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn greeting_and_validation_responses() {
    let (addr, _dir) = spawn_app(Vec::new()).await;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(format!("http://{}/chat", addr))
        .json(&json!({ "message": "Namaste" }))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(body["source"], "Greeting");
    assert!(body["response"]
        .as_str()
        .unwrap_or_default()
        .starts_with("Namaste! 🙏 I am AyurWell"));

    let res = client
        .post(format!("http://{}/chat", addr))
        .json(&json!({}))
        .send()
        .await
        .expect("request");
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.expect("json");
    assert_eq!(body, json!({ "error": "No message or image provided" }));

    let res = client
        .post(format!("http://{}/chat", addr))
        .json(&json!({ "image": "data:image/png;base64,%%%" }))
        .send()
        .await
        .expect("request");
    assert_eq!(res.status(), 500);
    let body: Value = res.json().await.expect("json");
    assert!(body["error"]
        .as_str()
        .unwrap_or_default()
        .starts_with("Image processing failed:"));
}

#[tokio::test]
async fn image_without_context_reports_vision_source() {
    let (addr, _dir) = spawn_app(Vec::new()).await;
    let body: Value = reqwest::Client::new()
        .post(format!("http://{}/chat", addr))
        .json(&json!({ "image": "AQID" }))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(body["source"], "Gemini Vision + RAG");
}

#[tokio::test]
async fn index_page_and_health() {
    let (addr, _dir) = spawn_app(Vec::new()).await;
    let client = reqwest::Client::new();

    let page = client
        .get(format!("http://{}/", addr))
        .send()
        .await
        .expect("request")
        .text()
        .await
        .expect("text");
    assert!(page.contains("AyurWell"));

    let health: Value = client
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(health["status"], "ok");
    assert_eq!(health["providers"]["llm"], false);
    assert_eq!(health["retrieval"]["strategies"], json!(["knowledge_base", "web_search"]));
}

#[tokio::test]
async fn large_photo_upload_is_accepted() {
    let (addr, _dir) = spawn_app(Vec::new()).await;
    // 3 MiB of base64, well past axum's 2 MB default body cap.
    let image = format!("data:image/jpeg;base64,{}", "A".repeat(3 * 1024 * 1024));
    let res = reqwest::Client::new()
        .post(format!("http://{}/chat", addr))
        .json(&json!({ "message": "What herb is this?", "image": image }))
        .send()
        .await
        .expect("request");
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.expect("json");
    assert_eq!(body["response"], "Warm sesame oil massage helps.");
}

#[tokio::test]
async fn malformed_bodies_get_json_errors() {
    let (addr, _dir) = spawn_app(Vec::new()).await;
    let client = reqwest::Client::new();

    let wrong_type = client
        .post(format!("http://{}/chat", addr))
        .json(&json!({ "message": 5 }))
        .send()
        .await
        .expect("request");
    let not_json = client
        .post(format!("http://{}/chat", addr))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("request");
    let no_content_type = client
        .post(format!("http://{}/chat", addr))
        .body(r#"{"message":"hi"}"#)
        .send()
        .await
        .expect("request");

    for res in [wrong_type, not_json, no_content_type] {
        assert_eq!(res.status(), 400);
        let body: Value = res.json().await.expect("json");
        assert!(!body["error"].as_str().unwrap_or_default().is_empty());
    }
}

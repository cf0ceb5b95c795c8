use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "providers": state.providers,
        "vector_backend": state.settings.vector_store.backend,
        "retrieval": {
            "strategies": state.settings.retrieval.strategies,
            "relevance_threshold": state.settings.retrieval.relevance_threshold,
        }
    }))
}

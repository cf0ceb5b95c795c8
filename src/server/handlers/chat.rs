use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::Json;

use crate::context::ChatRequest;
use crate::core::errors::ApiError;
use crate::state::AppState;

const EMBEDDED_INDEX: &str = include_str!("../../../static/index.html");

/// Serves `static/index.html` from disk when present so the page can be
/// edited without a rebuild; falls back to the copy compiled in.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let path = state.paths.static_dir.join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(page) => Html(page),
        Err(_) => Html(EMBEDDED_INDEX.to_string()),
    }
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) =
        payload.map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
    let reply = state.pipeline.handle(payload).await.map_err(|err| {
        tracing::error!("chat request failed: {}", err);
        err
    })?;
    Ok(Json(reply))
}

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let log = state
        .pipeline
        .conversations()
        .get(&session_id)
        .await
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;
    let log = log.lock().await;

    let turns: Vec<Value> = log
        .turns()
        .map(|turn| {
            json!({
                "role": turn.role,
                "label": turn.label(),
                "text": turn.text,
                "created_at": turn.created_at,
            })
        })
        .collect();

    Ok(Json(json!({
        "session_id": session_id,
        "rendered": log.render(),
        "turns": turns,
    })))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.pipeline.conversations().remove(&session_id).await {
        return Err(ApiError::NotFound("Session not found".to_string()));
    }
    tracing::info!("Cleared conversation {}", session_id);
    Ok(Json(json!({"status": "deleted", "session_id": session_id})))
}

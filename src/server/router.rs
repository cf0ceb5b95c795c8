use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::core::config::settings::ServerSettings;
use crate::server::handlers::{chat, health, sessions};
use crate::state::AppState;

/// Creates the application router with all routes and middleware.
///
/// This function sets up:
/// - The chat page and chat endpoint
/// - Health check
/// - Conversation history endpoints
/// - CORS, request tracing and the body size cap
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state.settings.server);
    let body_limit = DefaultBodyLimit::max(state.settings.server.max_body_bytes());
    Router::new()
        .route("/", get(chat::index))
        .route("/chat", post(chat::chat))
        .route("/health", get(health::health))
        .route(
            "/api/sessions/:session_id/history",
            get(sessions::get_history),
        )
        .route("/api/sessions/:session_id", delete(sessions::delete_session))
        .with_state(state)
        .layer(body_limit)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(server: &ServerSettings) -> CorsLayer {
    let allowed_origins = resolve_allowed_origins(server)
        .into_iter()
        .filter_map(|origin| HeaderValue::from_str(&origin).ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
}

fn resolve_allowed_origins(server: &ServerSettings) -> Vec<String> {
    let origins = server
        .cors_allowed_origins
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| item.to_string())
        .collect::<Vec<_>>();

    if origins.is_empty() {
        return default_local_origins(server.port);
    }

    origins
}

fn default_local_origins(port: u16) -> Vec<String> {
    vec![
        format!("http://localhost:{}", port),
        format!("http://127.0.0.1:{}", port),
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
    ]
}

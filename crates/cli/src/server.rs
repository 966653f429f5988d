//! HTTP surface over the answer service.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use schoolbot_answer::AnswerService;
use schoolbot_core::{AppError, AppResult};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AnswerService>,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: String,
}

const FEATURES: [&str; 4] = [
    "direct-answer",
    "response-cache",
    "keyword-retrieval",
    "llm-generation",
];

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/ask", post(ask))
        .route("/stats", get(stats))
        .route("/cache/clear", post(clear_cache))
        .route("/stats/reset", post(reset_stats))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `host:port` and serve until the process is stopped.
pub async fn serve(state: AppState, host: &str, port: u16) -> AppResult<()> {
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Server(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, router(state))
        .await
        .map_err(|e| AppError::Server(e.to_string()))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "message": "School assistant API",
        "status": "online",
        "version": env!("CARGO_PKG_VERSION"),
        "architecture": "hybrid-answer-system",
        "features": FEATURES,
        "knowledge": state.service.knowledge().summary(),
    }))
}

async fn ask(State(state): State<AppState>, Json(request): Json<AskRequest>) -> Response {
    let question = request.question.trim();
    if question.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Question must not be empty"})),
        )
            .into_response();
    }

    let span = tracing::info_span!("ask", chars = question.chars().count());
    let answer = state.service.answer(question).instrument(span).await;
    Json(answer).into_response()
}

async fn stats(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "answer_service": state.service.get_stats(),
        "cache_service": state.service.cache_stats(),
    }))
}

async fn clear_cache(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.service.clear_cache();
    Json(json!({"message": "Cache cleared successfully"}))
}

async fn reset_stats(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.service.reset_stats();
    Json(json!({"message": "Statistics reset successfully"}))
}

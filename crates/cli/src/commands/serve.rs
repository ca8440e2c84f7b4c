//! Serve command handler.
//!
//! Exposes the search pipeline over HTTP:
//! - `POST /search` with `{"question": "..."}` returns `{"answer": "..."}`
//! - `GET /health` returns `{"status": "ok"}`
//!
//! Failures return status 500 with `{"detail": "..."}`; a blank question
//! returns 400 without touching the pipeline.

use crate::shell;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use textfusion_core::{config::AppConfig, AppError, AppResult};
use textfusion_search::SearchEngine;

/// Serve the search endpoint over HTTP
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:8000")]
    pub bind: String,
}

impl ServeCommand {
    /// Execute the serve command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing serve command");

        let engine = Arc::new(SearchEngine::from_config(config)?);
        let listener = tokio::net::TcpListener::bind(&self.bind)
            .await
            .map_err(|e| AppError::Config(format!("Failed to bind {}: {}", self.bind, e)))?;

        tracing::info!("Listening on http://{}", listener.local_addr()?);

        axum::serve(listener, create_router(engine))
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
    }
}

/// Build the HTTP router around a shared engine.
pub fn create_router(engine: Arc<SearchEngine>) -> Router {
    Router::new()
        .route("/search", post(search))
        .route("/health", get(health))
        .with_state(engine)
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub answer: String,
}

/// HTTP error mapped to a status code and a `{"detail": ...}` body.
#[derive(Debug)]
pub enum ApiError {
    /// Invalid request (400)
    BadRequest(String),
    /// Pipeline failure (500)
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail),
            ApiError::Internal(detail) => (StatusCode::INTERNAL_SERVER_ERROR, detail),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError::Internal(err.detail())
    }
}

async fn search(
    State(engine): State<Arc<SearchEngine>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    match shell::handle_query(&engine, &request.question).await {
        None => Err(ApiError::BadRequest("Question cannot be empty".to_string())),
        Some(result) => {
            let answer = result?;
            Ok(Json(SearchResponse { answer }))
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

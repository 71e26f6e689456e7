//! HTTP request handlers.

use super::AppState;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Local;
use serde::Deserialize;

const HISTORY_SUFFIX: &str = "/history";

// ============================================================================
// API: Summary & models
// ============================================================================

pub async fn handle_summary(State(state): State<AppState>) -> impl IntoResponse {
    match state.service.summary(Local::now().naive_local()) {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => internal_error("summary", e),
    }
}

pub async fn handle_models(State(state): State<AppState>) -> impl IntoResponse {
    match state.service.models(Local::now().naive_local()) {
        Ok(models) => Json(models).into_response(),
        Err(e) => internal_error("models", e),
    }
}

// ============================================================================
// API: History
// ============================================================================

/// `GET /api/models/{id}/history`, where `id` may itself contain slashes.
pub async fn handle_model_path(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    let Some(model_id) = path.strip_suffix(HISTORY_SUFFIX).filter(|id| !id.is_empty()) else {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    };

    match state.service.history(model_id) {
        Ok(Some(history)) => Json(history).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, format!("Model not found: {}", model_id)).into_response(),
        Err(e) => internal_error("history", e),
    }
}

// ============================================================================
// API: Trends
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct TrendParams {
    pub runs: Option<u32>,
    pub top: Option<usize>,
}

/// `GET /api/trends?runs=N&top=N`, defaulting to the configured window.
pub async fn handle_trends(State(state): State<AppState>, Query(params): Query<TrendParams>) -> Response {
    let runs = params.runs.unwrap_or(state.config.trend_runs);
    let top = params.top.unwrap_or(state.config.trend_top);

    match state.service.trends(runs, top) {
        Ok(report) => Json(report).into_response(),
        Err(e) => internal_error("trends", e),
    }
}

fn internal_error(what: &str, e: impl std::fmt::Display) -> Response {
    tracing::error!("Failed to build {}: {}", what, e);
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
}

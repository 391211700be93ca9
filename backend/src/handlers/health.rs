//! Health check handlers

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub crops: usize,
    pub trees: usize,
    pub features: usize,
    pub embedding_window: String,
    pub cache_enabled: bool,
    pub checked_at: String,
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let artifacts = state.predictor.artifacts();
    let window = state.predictor.window();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        crops: artifacts.crops.len(),
        trees: artifacts.model.num_trees(),
        features: artifacts.model.num_features(),
        embedding_window: format!("{}..{}", window.start_str(), window.end_str()),
        cache_enabled: state.config.cache.enabled,
        checked_at: Utc::now().to_rfc3339(),
    })
}

//! Route definitions for the prediction service

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/crops", get(handlers::list_crops))
        .route("/predict", post(handlers::predict))
}

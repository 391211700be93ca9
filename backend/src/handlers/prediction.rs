//! HTTP handler for yield predictions

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use pungde_shared::{PredictionRequest, PredictionResponse};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::AppState;

/// Predict yield for a crop at a location
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> AppResult<Json<PredictionResponse>> {
    let Json(request) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let response = state
        .predictor
        .predict_yield(&request.crop_name, request.location_name.trim())
        .await?;
    Ok(Json(response))
}

//! HTTP handler for the crop catalogue

use axum::{extract::State, Json};
use pungde_shared::CropRequirementVector;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct CropEntry {
    pub name: String,
    pub requirements: CropRequirementVector,
}

/// List supported crops with their requirement vectors
pub async fn list_crops(State(state): State<AppState>) -> Json<Vec<CropEntry>> {
    let crops = state
        .predictor
        .artifacts()
        .crops
        .iter()
        .map(|(name, requirements)| CropEntry {
            name: name.to_string(),
            requirements: *requirements,
        })
        .collect();
    Json(crops)
}

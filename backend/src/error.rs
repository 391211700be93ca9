//! Error handling for the prediction service
//!
//! Every failure names the pipeline stage it came from. Not-found kinds are
//! user-correctable and map to 404; provider and internal faults map to 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pungde_shared::ResponseStatus;
use serde::Serialize;
use thiserror::Error;

use crate::external::earth_engine::EmbeddingError;
use crate::external::geocoding::GeocodeError;
use crate::services::crop_table::CropNotFound;

/// Pipeline stage an error originated in
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Request,
    Geocoding,
    CropLookup,
    EnvironmentalFetch,
    Inference,
    Internal,
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("Geocoding provider error: {0}")]
    GeocodingProvider(String),

    #[error("Crop not available: {requested}")]
    CropNotFound {
        requested: String,
        available: Vec<String>,
    },

    #[error("No environmental coverage: {0}")]
    NoEnvironmentalCoverage(String),

    #[error("Earth Engine provider error: {0}")]
    EnvironmentalProvider(String),

    #[error("Incomplete environmental vector, missing bands {missing:?}")]
    IncompleteEmbedding { missing: Vec<String> },

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: ResponseStatus,
    pub detail: String,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_crops: Option<Vec<String>>,
}

impl AppError {
    pub fn stage(&self) -> Stage {
        match self {
            AppError::Validation(_) => Stage::Request,
            AppError::LocationNotFound(_) | AppError::GeocodingProvider(_) => Stage::Geocoding,
            AppError::CropNotFound { .. } => Stage::CropLookup,
            AppError::NoEnvironmentalCoverage(_)
            | AppError::EnvironmentalProvider(_)
            | AppError::IncompleteEmbedding { .. } => Stage::EnvironmentalFetch,
            AppError::Inference(_) => Stage::Inference,
            AppError::Internal(_) => Stage::Internal,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::LocationNotFound(_)
            | AppError::CropNotFound { .. }
            | AppError::NoEnvironmentalCoverage(_) => StatusCode::NOT_FOUND,
            AppError::GeocodingProvider(_)
            | AppError::EnvironmentalProvider(_)
            | AppError::IncompleteEmbedding { .. }
            | AppError::Inference(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::LocationNotFound(_) => "LOCATION_NOT_FOUND",
            AppError::GeocodingProvider(_) => "GEOCODING_PROVIDER_ERROR",
            AppError::CropNotFound { .. } => "CROP_NOT_FOUND",
            AppError::NoEnvironmentalCoverage(_) => "NO_ENVIRONMENTAL_COVERAGE",
            AppError::EnvironmentalProvider(_) => "ENVIRONMENTAL_PROVIDER_ERROR",
            AppError::IncompleteEmbedding { .. } => "INCOMPLETE_ENVIRONMENTAL_VECTOR",
            AppError::Inference(_) => "INFERENCE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Human-readable message returned to the caller
    pub fn detail(&self) -> String {
        match self {
            AppError::Validation(msg) => format!("Invalid request: {}", msg),
            AppError::LocationNotFound(location) => format!(
                "Location '{}' could not be found. Try simpler formats like 'City, State' or 'City, Country'.",
                location
            ),
            AppError::GeocodingProvider(msg) => format!("Geocoding request failed: {}", msg),
            AppError::CropNotFound {
                requested,
                available,
            } => format!(
                "Data for crop '{}' is not available. Available crops: {}",
                requested,
                available.join(", ")
            ),
            AppError::NoEnvironmentalCoverage(reason) => format!(
                "No environmental data found for the specified location. {}",
                reason
            ),
            AppError::EnvironmentalProvider(msg) => {
                format!("Environmental data request failed: {}", msg)
            }
            AppError::IncompleteEmbedding { missing } => format!(
                "Failed to retrieve complete environmental vector from Earth Engine (missing bands: {}).",
                missing.join(", ")
            ),
            AppError::Inference(_) | AppError::Internal(_) => {
                "An internal server error occurred".to_string()
            }
        }
    }
}

impl From<GeocodeError> for AppError {
    fn from(err: GeocodeError) -> Self {
        match err {
            GeocodeError::NotFound(location) => AppError::LocationNotFound(location),
            other => AppError::GeocodingProvider(other.to_string()),
        }
    }
}

impl From<CropNotFound> for AppError {
    fn from(err: CropNotFound) -> Self {
        AppError::CropNotFound {
            requested: err.requested,
            available: err.available,
        }
    }
}

impl From<EmbeddingError> for AppError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::NoCoverage(reason) => AppError::NoEnvironmentalCoverage(reason),
            EmbeddingError::Incomplete { missing } => AppError::IncompleteEmbedding { missing },
            other => AppError::EnvironmentalProvider(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(stage = ?self.stage(), "Error: {:?}", self);
        } else {
            tracing::warn!(stage = ?self.stage(), "Request rejected: {}", self);
        }

        let available_crops = match &self {
            AppError::CropNotFound { available, .. } => Some(available.clone()),
            _ => None,
        };

        let body = ErrorResponse {
            status: ResponseStatus::Error,
            detail: self.detail(),
            error: ErrorDetail {
                code: self.code(),
                stage: self.stage(),
                available_crops,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

//! Yield prediction pipeline
//!
//! geocode -> crop lookup -> embedding fetch -> scale and assemble -> model.
//! Steps run strictly in order and the first failure ends the request; no
//! partial result is ever returned.

use std::sync::Arc;

use pungde_shared::{
    assemble_features, EmbeddingWindow, PredictionResponse, ResponseStatus,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::{AppError, AppResult};
use crate::external::earth_engine::EmbeddingSource;
use crate::external::geocoding::Geocoder;
use crate::services::artifacts::ModelArtifacts;

/// Prediction orchestrator
///
/// Holds the startup-loaded artifacts and the two provider clients. Cheap to
/// share behind an `Arc`; nothing here is mutated per request.
pub struct PredictionService {
    artifacts: Arc<ModelArtifacts>,
    geocoder: Arc<dyn Geocoder>,
    embeddings: Arc<dyn EmbeddingSource>,
    window: EmbeddingWindow,
}

impl PredictionService {
    pub fn new(
        artifacts: Arc<ModelArtifacts>,
        geocoder: Arc<dyn Geocoder>,
        embeddings: Arc<dyn EmbeddingSource>,
        window: EmbeddingWindow,
    ) -> Self {
        Self {
            artifacts,
            geocoder,
            embeddings,
            window,
        }
    }

    pub fn artifacts(&self) -> &ModelArtifacts {
        &self.artifacts
    }

    pub fn window(&self) -> EmbeddingWindow {
        self.window
    }

    /// Explanatory note attached to every successful prediction
    pub fn notes(&self) -> String {
        format!(
            "Prediction based on {} environmental data, matching the model's training period.",
            self.window.describe()
        )
    }

    /// Predict yield in tons per hectare for a crop grown at a location
    #[tracing::instrument(name = "predict_yield", skip(self))]
    pub async fn predict_yield(
        &self,
        crop_name: &str,
        location_name: &str,
    ) -> AppResult<PredictionResponse> {
        let location = self.geocoder.resolve(location_name).await?;
        tracing::info!(
            latitude = location.latitude,
            longitude = location.longitude,
            address = %location.formatted_address,
            "Location resolved"
        );

        let requirement = *self.artifacts.crops.lookup(crop_name)?;

        let embedding = self
            .embeddings
            .fetch(location.latitude, location.longitude)
            .await?;
        tracing::debug!("Environmental embedding fetched");

        let features = assemble_features(&requirement, &embedding, &self.artifacts.scalers);
        let raw = self.artifacts.model.predict(&features);
        let predicted = if self.artifacts.inverse_scale_yield {
            self.artifacts.scalers.target.inverse_transform_one(raw)
        } else {
            raw
        };
        let rounded = round_yield(predicted)?;

        tracing::info!(predicted_yield = rounded, "Prediction complete");

        Ok(PredictionResponse {
            status: ResponseStatus::Success,
            predicted_yield_tons_per_hectare: rounded,
            location_details: location.formatted_address,
            crop_name: crop_name.to_string(),
            notes: self.notes(),
        })
    }
}

/// Round a model output to two decimals for presentation
pub fn round_yield(value: f64) -> AppResult<f64> {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp(2))
        .and_then(|d| d.to_f64())
        .ok_or_else(|| {
            AppError::Inference(format!("model output {} is not representable", value))
        })
}

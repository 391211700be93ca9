//! Fixtures shared by the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use pungde_prediction_service::config::{
    ArtifactsConfig, CacheConfig, Config, EarthEngineConfig, GeocodingConfig, ServerConfig,
};
use pungde_prediction_service::external::{EmbeddingError, EmbeddingSource, GeocodeError, Geocoder};
use pungde_prediction_service::services::{
    CropRequirementTable, ModelArtifacts, PredictionService, YieldModel,
};
use pungde_prediction_service::AppState;
use pungde_shared::{
    EmbeddingWindow, EnvironmentalEmbedding, ResolvedLocation, ScalerBundle, StandardScaler,
};
use serde_json::{json, Value};

pub const CROP_TABLE: &str = include_str!("../../assets/crop_requirement_vectors.csv");

pub const MAJOTHI: &str = "Majothi, Chamoli, Uttarakhand";
pub const OPEN_OCEAN: &str = "Point Nemo";
pub const PATCHY: &str = "Patchy Cloud Valley";
pub const FLAKY: &str = "Flaky Provider Town";

/// Two stumps: N (column 0) split at 50, A00 (column 7) split at 0.5
pub fn model_json() -> Value {
    json!({
        "learner": {
            "feature_names": [],
            "gradient_booster": {
                "name": "gbtree",
                "model": {
                    "trees": [
                        {
                            "left_children": [1, -1, -1],
                            "right_children": [2, -1, -1],
                            "split_indices": [0, 0, 0],
                            "split_conditions": [50.0, 0.75, 2.123456],
                            "default_left": [0, 0, 0]
                        },
                        {
                            "left_children": [1, -1, -1],
                            "right_children": [2, -1, -1],
                            "split_indices": [7, 0, 0],
                            "split_conditions": [0.5, 0.5, -0.5],
                            "default_left": [0, 0, 0]
                        }
                    ]
                }
            },
            "learner_model_param": {
                "base_score": "5E-1",
                "num_feature": "71",
                "num_target": "1"
            },
            "objective": { "name": "reg:squarederror" }
        }
    })
}

pub fn identity_scalers() -> ScalerBundle {
    ScalerBundle {
        requirement: StandardScaler::new(vec![0.0; 7], vec![1.0; 7]),
        embedding: StandardScaler::new(vec![0.0; 64], vec![1.0; 64]),
        target: StandardScaler::new(vec![0.0], vec![1.0]),
    }
}

pub fn artifacts() -> ModelArtifacts {
    ModelArtifacts {
        crops: CropRequirementTable::from_reader(CROP_TABLE.as_bytes()).unwrap(),
        scalers: identity_scalers(),
        model: YieldModel::from_slice(model_json().to_string().as_bytes()).unwrap(),
        inverse_scale_yield: false,
    }
}

/// Geocoder answering from a fixed gazetteer
pub struct StubGeocoder {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn resolve(&self, location: &str) -> Result<ResolvedLocation, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let resolved = match location {
            MAJOTHI => ResolvedLocation::new(30.0668, 78.2714, "Majothi, Uttarakhand 246427, India"),
            OPEN_OCEAN => ResolvedLocation::new(-48.8767, -123.3933, "South Pacific Ocean"),
            PATCHY => ResolvedLocation::new(10.0, 10.0, "Patchy Cloud Valley, Nowhere"),
            FLAKY => return Err(GeocodeError::Timeout),
            other => return Err(GeocodeError::NotFound(other.to_string())),
        };
        Ok(resolved.unwrap())
    }
}

/// Embedding source with no coverage west of -100 and a hole at (10, 10)
pub struct StubEmbeddings {
    pub calls: AtomicUsize,
}

#[async_trait]
impl EmbeddingSource for StubEmbeddings {
    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<EnvironmentalEmbedding, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if longitude < -100.0 {
            return Err(EmbeddingError::NoCoverage(
                "This area may be remote or over a large body of water.".to_string(),
            ));
        }
        if latitude == 10.0 && longitude == 10.0 {
            return Err(EmbeddingError::Incomplete {
                missing: vec!["A12".to_string(), "A13".to_string()],
            });
        }
        Ok(stub_embedding())
    }
}

/// Embedding returned for every covered point
pub fn stub_embedding() -> EnvironmentalEmbedding {
    let mut values = [0.1; 64];
    values[0] = 0.9;
    EnvironmentalEmbedding::from_array(values)
}

pub struct Harness {
    pub state: AppState,
    pub geocoder: Arc<StubGeocoder>,
    pub embeddings: Arc<StubEmbeddings>,
}

pub fn config() -> Config {
    Config {
        environment: "test".to_string(),
        server: ServerConfig::default(),
        artifacts: ArtifactsConfig::default(),
        geocoding: GeocodingConfig {
            api_endpoint: "http://127.0.0.1:9/geocode".to_string(),
            api_key: "test-key".to_string(),
            timeout_secs: 10,
        },
        earth_engine: EarthEngineConfig {
            api_endpoint: "http://127.0.0.1:9/v1".to_string(),
            project: "pungde-test".to_string(),
            access_token: "test-token".to_string(),
            collection: "GOOGLE/SATELLITE_EMBEDDING/V1/ANNUAL".to_string(),
            start_date: "2020-01-01".to_string(),
            end_date: "2021-01-01".to_string(),
            scale_meters: 10.0,
            timeout_secs: 30,
        },
        cache: CacheConfig::default(),
    }
}

pub fn harness() -> Harness {
    harness_with(artifacts())
}

pub fn harness_with(artifacts: ModelArtifacts) -> Harness {
    let geocoder = Arc::new(StubGeocoder {
        calls: AtomicUsize::new(0),
    });
    let embeddings = Arc::new(StubEmbeddings {
        calls: AtomicUsize::new(0),
    });
    let predictor = PredictionService::new(
        Arc::new(artifacts),
        geocoder.clone(),
        embeddings.clone(),
        EmbeddingWindow::default(),
    );
    let state = AppState {
        config: Arc::new(config()),
        predictor: Arc::new(predictor),
    };
    Harness {
        state,
        geocoder,
        embeddings,
    }
}

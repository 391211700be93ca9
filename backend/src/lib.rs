//! Pungde yield prediction service
//!
//! Geocodes a location, samples a satellite embedding for it, and runs a
//! pre-trained gradient-boosted model to estimate crop yield.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod routes;
pub mod services;

pub use config::Config;

use external::{EarthEngineClient, EmbeddingSource, GoogleGeocoder};
use services::{CachedEmbeddingSource, ModelArtifacts, PredictionService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub predictor: Arc<PredictionService>,
}

impl AppState {
    /// Load artifacts and build provider clients. Runs once at startup.
    pub fn initialize(config: Config) -> anyhow::Result<Self> {
        let window = config
            .earth_engine
            .window()
            .context("invalid embedding window")?;

        let artifacts = ModelArtifacts::load(&config.artifacts)
            .context("failed to load model artifacts")?;

        let geocoder = GoogleGeocoder::new(&config.geocoding)
            .context("failed to create geocoding client")?;

        let earth_engine = EarthEngineClient::new(&config.earth_engine, window)
            .context("failed to create Earth Engine client")?;

        let mut embeddings: Arc<dyn EmbeddingSource> = Arc::new(earth_engine);
        if config.cache.enabled {
            tracing::info!(
                capacity = config.cache.capacity,
                precision = config.cache.coordinate_precision,
                "Embedding cache enabled"
            );
            embeddings = Arc::new(CachedEmbeddingSource::new(embeddings, &config.cache));
        }

        let predictor = PredictionService::new(
            Arc::new(artifacts),
            Arc::new(geocoder),
            embeddings,
            window,
        );

        Ok(Self {
            config: Arc::new(config),
            predictor: Arc::new(predictor),
        })
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/predict", post(handlers::predict))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Pungde Crop Yield Prediction Service v1.0"
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

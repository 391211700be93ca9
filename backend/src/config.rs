//! Configuration management for the Pungde prediction service
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with PUNGDE__ prefix

use std::time::Duration;

use config::{ConfigError, Environment, File};
use pungde_shared::{EmbeddingWindow, WindowError};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Paths to the trained artifacts
    pub artifacts: ArtifactsConfig,

    /// Geocoding provider configuration
    pub geocoding: GeocodingConfig,

    /// Earth Engine configuration
    pub earth_engine: EarthEngineConfig,

    /// Embedding cache configuration
    pub cache: CacheConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ArtifactsConfig {
    /// XGBoost model in JSON format
    pub model_path: String,

    /// JSON scaler bundle (req, emb, yield)
    pub scalers_path: String,

    /// CSV of canonical crop names and requirement vectors
    pub crop_table_path: String,

    /// Map the raw model output back through the yield scaler
    pub inverse_scale_yield: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocodingConfig {
    /// Geocoding REST endpoint
    pub api_endpoint: String,

    /// Geocoding API key
    pub api_key: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EarthEngineConfig {
    /// Earth Engine REST base URL
    pub api_endpoint: String,

    /// Cloud project the requests are billed to
    pub project: String,

    /// OAuth2 bearer token
    pub access_token: String,

    /// Annual embedding collection id
    pub collection: String,

    /// Inclusive start of the training-period window (YYYY-MM-DD)
    pub start_date: String,

    /// Exclusive end of the training-period window (YYYY-MM-DD)
    pub end_date: String,

    /// Sampling scale in meters
    pub scale_meters: f64,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// Cache sampled embeddings in memory
    pub enabled: bool,

    /// Maximum number of cached points
    pub capacity: usize,

    /// Decimal places coordinates are rounded to when forming cache keys
    pub coordinate_precision: u32,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("PUNGDE_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 8001)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("artifacts.model_path", "assets/xgboost_yield_model.json")?
            .set_default("artifacts.scalers_path", "assets/scalers.json")?
            .set_default("artifacts.crop_table_path", "assets/crop_requirement_vectors.csv")?
            .set_default("artifacts.inverse_scale_yield", false)?
            .set_default(
                "geocoding.api_endpoint",
                "https://maps.googleapis.com/maps/api/geocode/json",
            )?
            .set_default("geocoding.api_key", "")?
            .set_default("geocoding.timeout_secs", 10)?
            .set_default("earth_engine.api_endpoint", "https://earthengine.googleapis.com/v1")?
            .set_default("earth_engine.project", "pungde-477205")?
            .set_default("earth_engine.access_token", "")?
            .set_default("earth_engine.collection", "GOOGLE/SATELLITE_EMBEDDING/V1/ANNUAL")?
            .set_default("earth_engine.start_date", "2020-01-01")?
            .set_default("earth_engine.end_date", "2021-01-01")?
            .set_default("earth_engine.scale_meters", 10.0)?
            .set_default("earth_engine.timeout_secs", 30)?
            .set_default("cache.enabled", false)?
            .set_default("cache.capacity", 1024)?
            .set_default("cache.coordinate_precision", 4)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (PUNGDE__ prefix)
            .add_source(
                Environment::with_prefix("PUNGDE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate().map_err(ConfigError::Message)?;
        Ok(config)
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.geocoding.api_key.trim().is_empty() {
            return Err("geocoding.api_key is not set (PUNGDE__GEOCODING__API_KEY)".into());
        }
        if self.earth_engine.access_token.trim().is_empty() {
            return Err(
                "earth_engine.access_token is not set (PUNGDE__EARTH_ENGINE__ACCESS_TOKEN)".into(),
            );
        }
        if self.geocoding.timeout_secs == 0 || self.earth_engine.timeout_secs == 0 {
            return Err("provider timeouts must be at least one second".into());
        }
        let scale = self.earth_engine.scale_meters;
        if scale.is_nan() || scale <= 0.0 {
            return Err("earth_engine.scale_meters must be positive".into());
        }
        self.earth_engine
            .window()
            .map_err(|e| format!("earth_engine window: {}", e))?;
        Ok(())
    }
}

impl EarthEngineConfig {
    /// Training-period window the embedding collection is filtered to
    pub fn window(&self) -> Result<EmbeddingWindow, WindowError> {
        EmbeddingWindow::parse(&self.start_date, &self.end_date)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl GeocodingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8001,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            model_path: "assets/xgboost_yield_model.json".to_string(),
            scalers_path: "assets/scalers.json".to_string(),
            crop_table_path: "assets/crop_requirement_vectors.csv".to_string(),
            inverse_scale_yield: false,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            capacity: 1024,
            coordinate_precision: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            environment: "test".to_string(),
            server: ServerConfig::default(),
            artifacts: ArtifactsConfig::default(),
            geocoding: GeocodingConfig {
                api_endpoint: "http://localhost/geocode".to_string(),
                api_key: "key".to_string(),
                timeout_secs: 10,
            },
            earth_engine: EarthEngineConfig {
                api_endpoint: "http://localhost/ee".to_string(),
                project: "pungde-test".to_string(),
                access_token: "token".to_string(),
                collection: "GOOGLE/SATELLITE_EMBEDDING/V1/ANNUAL".to_string(),
                start_date: "2020-01-01".to_string(),
                end_date: "2021-01-01".to_string(),
                scale_meters: 10.0,
                timeout_secs: 30,
            },
            cache: CacheConfig::default(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let mut config = sample();
        config.geocoding.api_key = " ".to_string();
        assert!(config.validate().unwrap_err().contains("geocoding.api_key"));

        let mut config = sample();
        config.earth_engine.access_token.clear();
        assert!(config.validate().unwrap_err().contains("access_token"));
    }

    #[test]
    fn test_inverted_window_rejected() {
        let mut config = sample();
        config.earth_engine.start_date = "2021-06-01".to_string();
        assert!(config.validate().unwrap_err().contains("window"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = sample();
        config.geocoding.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}

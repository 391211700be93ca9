//! Geocoding client
//!
//! Integrates with the Google Geocoding REST API to turn free-text
//! locations into coordinates and a canonical address.

use async_trait::async_trait;
use pungde_shared::ResolvedLocation;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::config::GeocodingConfig;

/// Geocoding failures
///
/// `NotFound` is a successful provider answer with no candidates; every other
/// variant is a provider fault a caller may choose to retry.
#[derive(Debug, Error, PartialEq)]
pub enum GeocodeError {
    #[error("no geocoding candidates for '{0}'")]
    NotFound(String),

    #[error("geocoding request timed out")]
    Timeout,

    #[error("geocoding transport error: {0}")]
    Transport(String),

    #[error("geocoding API returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("geocoding API rejected the request ({status}): {message}")]
    Rejected { status: String, message: String },

    #[error("malformed geocoding response: {0}")]
    Malformed(String),
}

/// Resolves free-text locations
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, location: &str) -> Result<ResolvedLocation, GeocodeError>;
}

/// Google Geocoding API client
#[derive(Clone)]
pub struct GoogleGeocoder {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: String,
    geometry: GeocodeGeometry,
}

#[derive(Debug, Deserialize)]
struct GeocodeGeometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

impl GoogleGeocoder {
    /// Create a client from configuration
    pub fn new(config: &GeocodingConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.api_endpoint.clone(),
        })
    }

    /// Create a client against a custom endpoint (for testing)
    pub fn with_base_url(api_key: String, base_url: String, timeout: std::time::Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key,
            base_url,
        }
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn resolve(&self, location: &str) -> Result<ResolvedLocation, GeocodeError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("address", location), ("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| transport_error(e, GeocodeError::Transport))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GeocodeError::Http { status, body });
        }

        let data: GeocodeResponse = response
            .json()
            .await
            .map_err(|e| transport_error(e, GeocodeError::Malformed))?;

        interpret_response(location, data)
    }
}

fn transport_error(
    err: reqwest::Error,
    otherwise: fn(String) -> GeocodeError,
) -> GeocodeError {
    if err.is_timeout() {
        GeocodeError::Timeout
    } else {
        // The request URL carries the API key
        otherwise(err.without_url().to_string())
    }
}

fn interpret_response(
    location: &str,
    data: GeocodeResponse,
) -> Result<ResolvedLocation, GeocodeError> {
    match data.status.as_str() {
        "OK" => {
            let first = data
                .results
                .into_iter()
                .next()
                .ok_or_else(|| GeocodeError::NotFound(location.to_string()))?;
            let LatLng { lat, lng } = first.geometry.location;
            ResolvedLocation::new(lat, lng, first.formatted_address)
                .map_err(|e| GeocodeError::Malformed(format!("{} ({}, {})", e, lat, lng)))
        }
        "ZERO_RESULTS" => Err(GeocodeError::NotFound(location.to_string())),
        other => Err(GeocodeError::Rejected {
            status: other.to_string(),
            message: data.error_message.unwrap_or_default(),
        }),
    }
}

//! Earth Engine client for satellite embedding vectors
//!
//! Talks to the Earth Engine REST `value:compute` endpoint. Each fetch
//! filters the annual embedding collection to the fixed training-period
//! window and the query point, checks that an image covers the point, then
//! samples the point at the training scale.

use std::time::Duration;

use async_trait::async_trait;
use pungde_shared::{EmbeddingWindow, EnvironmentalEmbedding, EMBEDDING_BANDS};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::EarthEngineConfig;

const MAX_ERROR_BODY: usize = 512;

/// Embedding fetch failures
#[derive(Debug, Error, PartialEq)]
pub enum EmbeddingError {
    /// No image or no valid pixel at the point. Expected for open water and
    /// other areas the collection does not cover.
    #[error("no embedding coverage: {0}")]
    NoCoverage(String),

    #[error("Earth Engine request timed out")]
    Timeout,

    #[error("Earth Engine transport error: {0}")]
    Transport(String),

    #[error("Earth Engine returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("malformed Earth Engine response: {0}")]
    Malformed(String),

    #[error("sampled embedding is missing bands {missing:?}")]
    Incomplete { missing: Vec<String> },
}

/// Source of per-point embedding vectors
#[async_trait]
pub trait EmbeddingSource: Send + Sync {
    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<EnvironmentalEmbedding, EmbeddingError>;
}

/// Earth Engine REST client
#[derive(Clone)]
pub struct EarthEngineClient {
    client: Client,
    base_url: String,
    project: String,
    access_token: String,
    collection: String,
    window: EmbeddingWindow,
    scale_meters: f64,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ComputeResponse {
    #[serde(default)]
    result: Value,
}

impl EarthEngineClient {
    /// Create a client from configuration
    pub fn new(config: &EarthEngineConfig, window: EmbeddingWindow) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.api_endpoint.trim_end_matches('/').to_string(),
            project: config.project.clone(),
            access_token: config.access_token.clone(),
            collection: config.collection.clone(),
            window,
            scale_meters: config.scale_meters,
            timeout: config.timeout(),
        })
    }

    pub fn window(&self) -> EmbeddingWindow {
        self.window
    }

    fn compute_url(&self) -> String {
        format!("{}/projects/{}/value:compute", self.base_url, self.project)
    }

    /// Evaluate one expression and return its `result` value
    async fn compute(&self, expression: Value) -> Result<Value, EmbeddingError> {
        let body = json!({
            "expression": {
                "result": "0",
                "values": { "0": expression }
            }
        });

        let response = self
            .client
            .post(self.compute_url())
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, EmbeddingError::Transport))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(EmbeddingError::Http { status, body });
        }

        let data: ComputeResponse = response
            .json()
            .await
            .map_err(|e| transport_error(e, EmbeddingError::Malformed))?;

        Ok(data.result)
    }

    async fn fetch_inner(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<EnvironmentalEmbedding, EmbeddingError> {
        let point = point_expression(latitude, longitude);
        let collection = self.filtered_collection(point.clone());

        let size = invoke("Collection.size", json!({ "collection": collection.clone() }));
        let count = self.compute(size).await?;
        let count = count
            .as_u64()
            .ok_or_else(|| EmbeddingError::Malformed(format!("collection size was {}", count)))?;

        if count == 0 {
            return Err(EmbeddingError::NoCoverage(
                "This area may be remote or over a large body of water.".to_string(),
            ));
        }

        tracing::debug!(images = count, "Embedding images intersect point");

        let sample = self.compute(self.sample_expression(collection, point)).await?;
        embedding_from_sample(sample)
    }

    /// Collection filtered to the training window and the query point
    fn filtered_collection(&self, point: Value) -> Value {
        let loaded = invoke("ImageCollection.load", json!({
            "id": constant(json!(self.collection))
        }));

        let in_window = invoke("Collection.filter", json!({
            "collection": loaded,
            "filter": invoke("Filter.dateRangeContains", json!({
                "leftValue": invoke("DateRange", json!({
                    "start": constant(json!(self.window.start_str())),
                    "end": constant(json!(self.window.end_str()))
                })),
                "rightField": constant(json!("system:time_start"))
            }))
        }));

        invoke("Collection.filter", json!({
            "collection": in_window,
            "filter": invoke("Filter.intersects", json!({
                "leftField": constant(json!(".all")),
                "rightValue": point
            }))
        }))
    }

    /// First sampled feature of the first image, restricted to the embedding bands
    fn sample_expression(&self, collection: Value, point: Value) -> Value {
        let image = invoke("Image.select", json!({
            "input": invoke("Collection.first", json!({ "collection": collection })),
            "bandSelectors": constant(json!(EMBEDDING_BANDS.to_vec()))
        }));

        let samples = invoke("Image.sample", json!({
            "image": image,
            "region": point,
            "scale": constant(json!(self.scale_meters))
        }));

        invoke("Collection.first", json!({ "collection": samples }))
    }
}

#[async_trait]
impl EmbeddingSource for EarthEngineClient {
    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<EnvironmentalEmbedding, EmbeddingError> {
        tokio::time::timeout(self.timeout, self.fetch_inner(latitude, longitude))
            .await
            .map_err(|_| EmbeddingError::Timeout)?
    }
}

fn transport_error(
    err: reqwest::Error,
    otherwise: fn(String) -> EmbeddingError,
) -> EmbeddingError {
    if err.is_timeout() {
        EmbeddingError::Timeout
    } else {
        otherwise(err.to_string())
    }
}

fn invoke(function: &str, arguments: Value) -> Value {
    json!({
        "functionInvocationValue": {
            "functionName": function,
            "arguments": arguments
        }
    })
}

fn constant(value: Value) -> Value {
    json!({ "constantValue": value })
}

fn point_expression(latitude: f64, longitude: f64) -> Value {
    // GeoJSON order: longitude first
    invoke("GeometryConstructors.Point", json!({
        "coordinates": constant(json!([longitude, latitude]))
    }))
}

/// Turn a sampled GeoJSON feature into a complete embedding
fn embedding_from_sample(sample: Value) -> Result<EnvironmentalEmbedding, EmbeddingError> {
    if sample.is_null() {
        return Err(EmbeddingError::NoCoverage(
            "The embedding pixel at this point is masked; the area may be remote or over a large body of water."
                .to_string(),
        ));
    }

    let properties = sample
        .get("properties")
        .and_then(Value::as_object)
        .ok_or_else(|| EmbeddingError::Malformed("sampled feature has no properties".to_string()))?;

    EnvironmentalEmbedding::from_band_map(properties)
        .map_err(|missing| EmbeddingError::Incomplete { missing })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> EarthEngineClient {
        let config = EarthEngineConfig {
            api_endpoint: "http://localhost:9/v1/".to_string(),
            project: "pungde-test".to_string(),
            access_token: "token".to_string(),
            collection: "GOOGLE/SATELLITE_EMBEDDING/V1/ANNUAL".to_string(),
            start_date: "2020-01-01".to_string(),
            end_date: "2021-01-01".to_string(),
            scale_meters: 10.0,
            timeout_secs: 30,
        };
        EarthEngineClient::new(&config, config.window().unwrap()).unwrap()
    }

    fn full_feature() -> Value {
        let properties: serde_json::Map<String, Value> = EMBEDDING_BANDS
            .iter()
            .map(|band| (band.to_string(), json!(0.25)))
            .collect();
        json!({ "type": "Feature", "geometry": null, "properties": properties })
    }

    #[test]
    fn test_compute_url() {
        assert_eq!(
            client().compute_url(),
            "http://localhost:9/v1/projects/pungde-test/value:compute"
        );
    }

    #[test]
    fn test_point_is_longitude_first() {
        let point = point_expression(30.07, 78.27);
        let coords = &point["functionInvocationValue"]["arguments"]["coordinates"]["constantValue"];
        assert_eq!(coords, &json!([78.27, 30.07]));
    }

    #[test]
    fn test_collection_uses_fixed_window() {
        let client = client();
        let expr = client.filtered_collection(point_expression(0.0, 0.0));
        let date_filter = &expr["functionInvocationValue"]["arguments"]["collection"]
            ["functionInvocationValue"]["arguments"]["filter"]["functionInvocationValue"];
        assert_eq!(date_filter["functionName"], "Filter.dateRangeContains");
        let range = &date_filter["arguments"]["leftValue"]["functionInvocationValue"]["arguments"];
        assert_eq!(range["start"]["constantValue"], "2020-01-01");
        assert_eq!(range["end"]["constantValue"], "2021-01-01");
    }

    #[test]
    fn test_sample_selects_all_bands_at_training_scale() {
        let client = client();
        let point = point_expression(0.0, 0.0);
        let expr = client.sample_expression(client.filtered_collection(point.clone()), point);
        let sample = &expr["functionInvocationValue"]["arguments"]["collection"]
            ["functionInvocationValue"];
        assert_eq!(sample["functionName"], "Image.sample");
        assert_eq!(sample["arguments"]["scale"]["constantValue"], 10.0);
        let bands = &sample["arguments"]["image"]["functionInvocationValue"]["arguments"]
            ["bandSelectors"]["constantValue"];
        assert_eq!(bands.as_array().unwrap().len(), 64);
    }

    #[test]
    fn test_null_sample_is_no_coverage() {
        assert!(matches!(
            embedding_from_sample(Value::Null),
            Err(EmbeddingError::NoCoverage(_))
        ));
    }

    #[test]
    fn test_missing_band_fails_whole_fetch() {
        let mut feature = full_feature();
        feature["properties"]
            .as_object_mut()
            .unwrap()
            .remove("A31");
        assert_eq!(
            embedding_from_sample(feature),
            Err(EmbeddingError::Incomplete {
                missing: vec!["A31".to_string()]
            })
        );
    }

    #[test]
    fn test_complete_sample_parses() {
        let embedding = embedding_from_sample(full_feature()).unwrap();
        assert!(embedding.values().iter().all(|v| *v == 0.25));
    }
}

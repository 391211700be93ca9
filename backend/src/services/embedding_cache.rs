//! In-memory embedding cache
//!
//! Wraps an [`EmbeddingSource`] and remembers complete vectors keyed by
//! coordinates rounded to a fixed number of decimals. Entries are written
//! once and never replaced. Any cache problem falls through to a live fetch.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use pungde_shared::EnvironmentalEmbedding;

use crate::config::CacheConfig;
use crate::external::earth_engine::{EmbeddingError, EmbeddingSource};

type CellKey = (i64, i64);

pub struct CachedEmbeddingSource {
    inner: Arc<dyn EmbeddingSource>,
    entries: RwLock<HashMap<CellKey, EnvironmentalEmbedding>>,
    capacity: usize,
    factor: f64,
}

impl CachedEmbeddingSource {
    pub fn new(inner: Arc<dyn EmbeddingSource>, config: &CacheConfig) -> Self {
        Self {
            inner,
            entries: RwLock::new(HashMap::new()),
            capacity: config.capacity,
            factor: 10f64.powi(config.coordinate_precision.min(10) as i32),
        }
    }

    fn key(&self, latitude: f64, longitude: f64) -> CellKey {
        (
            (latitude * self.factor).round() as i64,
            (longitude * self.factor).round() as i64,
        )
    }

    fn get(&self, key: CellKey) -> Option<EnvironmentalEmbedding> {
        match self.entries.read() {
            Ok(entries) => entries.get(&key).copied(),
            Err(_) => {
                tracing::warn!("Embedding cache lock poisoned, fetching live");
                None
            }
        }
    }

    fn insert(&self, key: CellKey, embedding: EnvironmentalEmbedding) {
        match self.entries.write() {
            Ok(mut entries) => {
                if entries.len() < self.capacity {
                    entries.entry(key).or_insert(embedding);
                } else {
                    tracing::debug!(capacity = self.capacity, "Embedding cache full");
                }
            }
            Err(_) => tracing::warn!("Embedding cache lock poisoned, result not cached"),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EmbeddingSource for CachedEmbeddingSource {
    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<EnvironmentalEmbedding, EmbeddingError> {
        let key = self.key(latitude, longitude);
        if let Some(hit) = self.get(key) {
            tracing::debug!(latitude, longitude, "Embedding cache hit");
            return Ok(hit);
        }

        let embedding = self.inner.fetch(latitude, longitude).await?;
        self.insert(key, embedding);
        Ok(embedding)
    }
}

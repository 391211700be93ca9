//! Model input vectors

use serde::{Deserialize, Serialize};

use super::{EMBEDDING_BANDS, EMBEDDING_WIDTH, REQUIREMENT_COLUMNS, REQUIREMENT_WIDTH};

/// Total number of model inputs: requirement columns then embedding bands.
pub const FEATURE_COUNT: usize = REQUIREMENT_WIDTH + EMBEDDING_WIDTH;

/// Column names in the exact order the model was trained on.
pub fn feature_columns() -> Vec<&'static str> {
    REQUIREMENT_COLUMNS
        .iter()
        .chain(EMBEDDING_BANDS.iter())
        .copied()
        .collect()
}

/// Scaled, concatenated model input.
///
/// Positions are what the scalers and trees index into, so the layout is
/// always `[N, P, K, temperature, humidity, ph, rainfall, A00..A63]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    /// Wrap an already ordered vector.
    ///
    /// # Panics
    ///
    /// Panics if `values` does not hold exactly [`FEATURE_COUNT`] entries.
    pub fn new(values: Vec<f64>) -> Self {
        assert_eq!(
            values.len(),
            FEATURE_COUNT,
            "feature vector must have {} columns, got {}",
            FEATURE_COUNT,
            values.len()
        );
        Self { values }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, column: usize) -> Option<f64> {
        self.values.get(column).copied()
    }
}

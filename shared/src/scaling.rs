//! Pre-fitted feature scaling and feature assembly
//!
//! Scalers are fitted offline, one per column group, and serialized as a JSON
//! bundle mirroring scikit-learn's `StandardScaler` attributes (`mean_`,
//! `scale_`, `feature_names_in_`). Each group is scaled on its own and only
//! then concatenated; scaling the concatenation would not reproduce training.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    CropRequirementVector, EnvironmentalEmbedding, FeatureVector, EMBEDDING_BANDS,
    EMBEDDING_WIDTH, FEATURE_COUNT, REQUIREMENT_COLUMNS, REQUIREMENT_WIDTH,
};

#[derive(Debug, Error, PartialEq)]
pub enum ScalerError {
    #[error("{group} scaler {attribute} has {actual} entries, expected {expected}")]
    WidthMismatch {
        group: &'static str,
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{group} scaler was fitted on columns {actual:?}, expected {expected:?}")]
    ColumnMismatch {
        group: &'static str,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("{group} scaler has a zero or non-finite scale at column {index}")]
    InvalidScale { group: &'static str, index: usize },
}

/// Standardization transform: `(x - mean) / scale`.
///
/// Either attribute may be absent, matching a scaler fitted with
/// `with_mean=False` or `with_std=False`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StandardScaler {
    #[serde(default)]
    pub mean: Option<Vec<f64>>,
    #[serde(default)]
    pub scale: Option<Vec<f64>>,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        Self {
            mean: Some(mean),
            scale: Some(scale),
            feature_names: None,
        }
    }

    /// Check the fitted attributes against the column group this scaler serves.
    pub fn check(
        &self,
        group: &'static str,
        width: usize,
        columns: Option<&[&str]>,
    ) -> Result<(), ScalerError> {
        for (attribute, values) in [("mean", &self.mean), ("scale", &self.scale)] {
            if let Some(values) = values {
                if values.len() != width {
                    return Err(ScalerError::WidthMismatch {
                        group,
                        attribute,
                        expected: width,
                        actual: values.len(),
                    });
                }
            }
        }

        if let Some(scale) = &self.scale {
            if let Some(index) = scale.iter().position(|s| !s.is_finite() || *s == 0.0) {
                return Err(ScalerError::InvalidScale { group, index });
            }
        }

        if let (Some(expected), Some(actual)) = (columns, &self.feature_names) {
            if actual.iter().map(String::as_str).ne(expected.iter().copied()) {
                return Err(ScalerError::ColumnMismatch {
                    group,
                    expected: expected.iter().map(|c| c.to_string()).collect(),
                    actual: actual.clone(),
                });
            }
        }

        Ok(())
    }

    /// Scale one row.
    ///
    /// # Panics
    ///
    /// Panics if the row width differs from the fitted width. Bundles are
    /// checked at load time, so this only fires on a programming error.
    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        if let Some(mean) = &self.mean {
            assert_eq!(mean.len(), row.len(), "scaler mean width mismatch");
        }
        if let Some(scale) = &self.scale {
            assert_eq!(scale.len(), row.len(), "scaler scale width mismatch");
        }

        row.iter()
            .enumerate()
            .map(|(i, x)| {
                let centered = match &self.mean {
                    Some(mean) => x - mean[i],
                    None => *x,
                };
                match &self.scale {
                    Some(scale) => centered / scale[i],
                    None => centered,
                }
            })
            .collect()
    }

    /// Map a single scaled value back to original units.
    pub fn inverse_transform_one(&self, value: f64) -> f64 {
        let scaled = match self.scale.as_deref() {
            Some([scale, ..]) => value * scale,
            _ => value,
        };
        match self.mean.as_deref() {
            Some([mean, ..]) => scaled + mean,
            _ => scaled,
        }
    }
}

/// The three scalers fitted alongside the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScalerBundle {
    #[serde(rename = "req")]
    pub requirement: StandardScaler,
    #[serde(rename = "emb")]
    pub embedding: StandardScaler,
    #[serde(rename = "yield")]
    pub target: StandardScaler,
}

impl ScalerBundle {
    /// Check every scaler against its column group.
    pub fn check(&self) -> Result<(), ScalerError> {
        self.requirement
            .check("requirement", REQUIREMENT_WIDTH, Some(&REQUIREMENT_COLUMNS[..]))?;
        self.embedding
            .check("embedding", EMBEDDING_WIDTH, Some(&EMBEDDING_BANDS[..]))?;
        self.target.check("yield", 1, None)
    }
}

/// Scale each column group with its own scaler and concatenate them in
/// trained order: requirement columns first, then embedding bands.
pub fn assemble_features(
    requirement: &CropRequirementVector,
    embedding: &EnvironmentalEmbedding,
    scalers: &ScalerBundle,
) -> FeatureVector {
    let mut values = Vec::with_capacity(FEATURE_COUNT);
    values.extend(scalers.requirement.transform(&requirement.to_array()));
    values.extend(scalers.embedding.transform(embedding.values()));
    FeatureVector::new(values)
}

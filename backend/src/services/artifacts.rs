//! Startup loading of trained artifacts
//!
//! The crop table, scaler bundle and model are read exactly once, checked
//! against the trained column layout, and then shared read-only by every
//! request. Any problem here stops the process before it serves traffic.

use std::path::{Path, PathBuf};

use pungde_shared::{ScalerBundle, ScalerError};
use thiserror::Error;

use crate::config::ArtifactsConfig;
use crate::services::crop_table::{CropRequirementTable, CropTableError};
use crate::services::yield_model::{ModelError, YieldModel};

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("required artifact not found: {0}")]
    Missing(PathBuf),

    #[error("crop table {path}: {source}")]
    CropTable {
        path: PathBuf,
        #[source]
        source: CropTableError,
    },

    #[error("scaler bundle {path}: {source}")]
    ScalerFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("scaler bundle {path}: {source}")]
    ScalerJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("scaler bundle {path}: {source}")]
    ScalerLayout {
        path: PathBuf,
        #[source]
        source: ScalerError,
    },

    #[error("model {path}: {source}")]
    Model {
        path: PathBuf,
        #[source]
        source: ModelError,
    },
}

/// Everything inference needs that is fixed at training time
#[derive(Debug)]
pub struct ModelArtifacts {
    pub crops: CropRequirementTable,
    pub scalers: ScalerBundle,
    pub model: YieldModel,
    /// Apply the yield scaler's inverse to the raw model output
    pub inverse_scale_yield: bool,
}

impl ModelArtifacts {
    /// Load and check all artifacts named in the configuration
    pub fn load(config: &ArtifactsConfig) -> Result<Self, ArtifactError> {
        let crops = load_crop_table(Path::new(&config.crop_table_path))?;
        let scalers = load_scalers(Path::new(&config.scalers_path))?;
        let model = load_model(Path::new(&config.model_path))?;

        tracing::info!(
            crops = crops.len(),
            trees = model.num_trees(),
            features = model.num_features(),
            objective = model.objective(),
            inverse_scale_yield = config.inverse_scale_yield,
            "Artifacts loaded"
        );

        Ok(Self {
            crops,
            scalers,
            model,
            inverse_scale_yield: config.inverse_scale_yield,
        })
    }
}

fn require(path: &Path) -> Result<(), ArtifactError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ArtifactError::Missing(path.to_path_buf()))
    }
}

fn load_crop_table(path: &Path) -> Result<CropRequirementTable, ArtifactError> {
    require(path)?;
    CropRequirementTable::from_path(path).map_err(|source| ArtifactError::CropTable {
        path: path.to_path_buf(),
        source,
    })
}

fn load_scalers(path: &Path) -> Result<ScalerBundle, ArtifactError> {
    require(path)?;
    let bytes = std::fs::read(path).map_err(|source| ArtifactError::ScalerFile {
        path: path.to_path_buf(),
        source,
    })?;
    let bundle: ScalerBundle =
        serde_json::from_slice(&bytes).map_err(|source| ArtifactError::ScalerJson {
            path: path.to_path_buf(),
            source,
        })?;
    bundle.check().map_err(|source| ArtifactError::ScalerLayout {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(bundle)
}

fn load_model(path: &Path) -> Result<YieldModel, ArtifactError> {
    require(path)?;
    YieldModel::from_path(path).map_err(|source| ArtifactError::Model {
        path: path.to_path_buf(),
        source,
    })
}

//! Business logic services for the prediction pipeline

pub mod artifacts;
pub mod crop_table;
pub mod embedding_cache;
pub mod prediction;
pub mod yield_model;

pub use artifacts::{ArtifactError, ModelArtifacts};
pub use crop_table::{CropNotFound, CropRequirementTable};
pub use embedding_cache::CachedEmbeddingSource;
pub use prediction::PredictionService;
pub use yield_model::YieldModel;

//! Domain models for the yield prediction pipeline

mod crop;
mod embedding;
mod features;
mod prediction;

pub use crop::*;
pub use embedding::*;
pub use features::*;
pub use prediction::*;

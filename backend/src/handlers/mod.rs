//! HTTP request handlers

pub mod crops;
pub mod health;
pub mod prediction;

pub use crops::list_crops;
pub use health::health_check;
pub use prediction::predict;

//! External API integrations

pub mod earth_engine;
pub mod geocoding;

pub use earth_engine::{EarthEngineClient, EmbeddingError, EmbeddingSource};
pub use geocoding::{GeocodeError, Geocoder, GoogleGeocoder};

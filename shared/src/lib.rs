//! Shared types and numeric kernels for the Pungde yield prediction service
//!
//! Everything in this crate is pure: no network, no filesystem. The backend
//! loads artifacts and talks to providers, then hands plain values to the
//! functions defined here.

pub mod models;
pub mod scaling;
pub mod types;
pub mod validation;

pub use models::*;
pub use scaling::*;
pub use types::*;
pub use validation::*;

//! Satellite embedding vectors

use serde_json::{Map, Value};

/// Embedding band names, in trained column order.
pub const EMBEDDING_BANDS: [&str; 64] = [
    "A00", "A01", "A02", "A03", "A04", "A05", "A06", "A07", "A08", "A09", "A10", "A11", "A12",
    "A13", "A14", "A15", "A16", "A17", "A18", "A19", "A20", "A21", "A22", "A23", "A24", "A25",
    "A26", "A27", "A28", "A29", "A30", "A31", "A32", "A33", "A34", "A35", "A36", "A37", "A38",
    "A39", "A40", "A41", "A42", "A43", "A44", "A45", "A46", "A47", "A48", "A49", "A50", "A51",
    "A52", "A53", "A54", "A55", "A56", "A57", "A58", "A59", "A60", "A61", "A62", "A63",
];

/// Number of embedding bands fed to the model.
pub const EMBEDDING_WIDTH: usize = EMBEDDING_BANDS.len();

/// A complete 64-band embedding sampled at one point.
///
/// Can only be built when every band resolved to a number, so a value of this
/// type is never partial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentalEmbedding {
    values: [f64; EMBEDDING_WIDTH],
}

impl EnvironmentalEmbedding {
    pub fn from_array(values: [f64; EMBEDDING_WIDTH]) -> Self {
        Self { values }
    }

    /// Build from a sampled band dictionary.
    ///
    /// Every band must be present and numeric; otherwise the names of all
    /// offending bands are returned and no vector is produced.
    pub fn from_band_map(bands: &Map<String, Value>) -> Result<Self, Vec<String>> {
        let mut values = [0.0; EMBEDDING_WIDTH];
        let mut missing = Vec::new();

        for (slot, name) in values.iter_mut().zip(EMBEDDING_BANDS) {
            match bands.get(name).and_then(Value::as_f64) {
                Some(v) if v.is_finite() => *slot = v,
                _ => missing.push(name.to_string()),
            }
        }

        if missing.is_empty() {
            Ok(Self { values })
        } else {
            Err(missing)
        }
    }

    pub fn values(&self) -> &[f64; EMBEDDING_WIDTH] {
        &self.values
    }
}

//! Crop requirement table
//!
//! Loaded once from CSV at startup; read-only afterwards.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use pungde_shared::{normalize_crop_name, CropRequirementVector};
use serde::Deserialize;
use thiserror::Error;

/// Lookup miss, carrying every valid name so callers can offer alternatives
#[derive(Debug, Error, Clone, PartialEq)]
#[error("crop '{requested}' is not in the requirement table")]
pub struct CropNotFound {
    pub requested: String,
    pub available: Vec<String>,
}

#[derive(Debug, Error)]
pub enum CropTableError {
    #[error("failed to read crop table: {0}")]
    Csv(#[from] csv::Error),

    #[error("crop table row {row} has an empty canonical_name")]
    EmptyName { row: usize },

    #[error("crop '{0}' appears more than once in the crop table")]
    Duplicate(String),

    #[error("crop '{name}' has a non-finite {column}")]
    NonFinite { name: String, column: &'static str },

    #[error("crop table contains no crops")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct CropRow {
    canonical_name: String,
    #[serde(rename = "N")]
    nitrogen: f64,
    #[serde(rename = "P")]
    phosphorus: f64,
    #[serde(rename = "K")]
    potassium: f64,
    temperature: f64,
    humidity: f64,
    ph: f64,
    rainfall: f64,
}

impl From<&CropRow> for CropRequirementVector {
    fn from(row: &CropRow) -> Self {
        CropRequirementVector {
            nitrogen: row.nitrogen,
            phosphorus: row.phosphorus,
            potassium: row.potassium,
            temperature: row.temperature,
            humidity: row.humidity,
            ph: row.ph,
            rainfall: row.rainfall,
        }
    }
}

/// Canonical crop name to requirement vector
#[derive(Debug, Clone)]
pub struct CropRequirementTable {
    crops: BTreeMap<String, CropRequirementVector>,
}

impl CropRequirementTable {
    /// Load the table from a CSV file with a `canonical_name` column
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CropTableError> {
        let reader = csv::Reader::from_path(path)?;
        Self::from_csv_reader(reader)
    }

    /// Load the table from any CSV source
    pub fn from_reader(source: impl Read) -> Result<Self, CropTableError> {
        Self::from_csv_reader(csv::Reader::from_reader(source))
    }

    fn from_csv_reader<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, CropTableError> {
        let mut crops = BTreeMap::new();

        for (row, record) in reader.deserialize::<CropRow>().enumerate() {
            let record = record?;
            let name = normalize_crop_name(&record.canonical_name);
            if name.is_empty() {
                return Err(CropTableError::EmptyName { row: row + 1 });
            }

            let requirement = CropRequirementVector::from(&record);
            let values = requirement.to_array();
            if let Some(i) = values.iter().position(|v| !v.is_finite()) {
                return Err(CropTableError::NonFinite {
                    name,
                    column: pungde_shared::REQUIREMENT_COLUMNS[i],
                });
            }

            if crops.insert(name.clone(), requirement).is_some() {
                return Err(CropTableError::Duplicate(name));
            }
        }

        if crops.is_empty() {
            return Err(CropTableError::Empty);
        }

        Ok(Self { crops })
    }

    /// Case-insensitive lookup
    pub fn lookup(&self, crop_name: &str) -> Result<&CropRequirementVector, CropNotFound> {
        self.crops
            .get(&normalize_crop_name(crop_name))
            .ok_or_else(|| CropNotFound {
                requested: crop_name.to_string(),
                available: self.names(),
            })
    }

    /// Canonical names in sorted order
    pub fn names(&self) -> Vec<String> {
        self.crops.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CropRequirementVector)> {
        self.crops.iter().map(|(name, req)| (name.as_str(), req))
    }

    pub fn len(&self) -> usize {
        self.crops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }
}

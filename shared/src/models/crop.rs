//! Crop agronomic requirement profiles

use serde::{Deserialize, Serialize};

/// Requirement columns, in trained column order.
pub const REQUIREMENT_COLUMNS: [&str; 7] =
    ["N", "P", "K", "temperature", "humidity", "ph", "rainfall"];

/// Number of requirement columns fed to the model.
pub const REQUIREMENT_WIDTH: usize = REQUIREMENT_COLUMNS.len();

/// A crop's agronomic tolerance profile.
///
/// Field names match the CSV headers of the requirement table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CropRequirementVector {
    #[serde(rename = "N")]
    pub nitrogen: f64,
    #[serde(rename = "P")]
    pub phosphorus: f64,
    #[serde(rename = "K")]
    pub potassium: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub rainfall: f64,
}

impl CropRequirementVector {
    /// Values in [`REQUIREMENT_COLUMNS`] order.
    pub fn to_array(&self) -> [f64; REQUIREMENT_WIDTH] {
        [
            self.nitrogen,
            self.phosphorus,
            self.potassium,
            self.temperature,
            self.humidity,
            self.ph,
            self.rainfall,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_follows_column_order() {
        let rice = CropRequirementVector {
            nitrogen: 1.0,
            phosphorus: 2.0,
            potassium: 3.0,
            temperature: 4.0,
            humidity: 5.0,
            ph: 6.0,
            rainfall: 7.0,
        };
        assert_eq!(rice.to_array(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_serde_uses_table_headers() {
        let json = serde_json::json!({
            "N": 79.89, "P": 47.58, "K": 39.87,
            "temperature": 23.69, "humidity": 82.27, "ph": 6.43, "rainfall": 236.18
        });
        let parsed: CropRequirementVector = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.nitrogen, 79.89);
        assert_eq!(parsed.rainfall, 236.18);
    }
}

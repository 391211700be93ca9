//! Prediction request and response payloads

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::validate_not_blank;

/// Body of a prediction request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PredictionRequest {
    #[validate(length(max = 100), custom = "validate_not_blank")]
    pub crop_name: String,

    #[validate(length(max = 500), custom = "validate_not_blank")]
    pub location_name: String,
}

/// Status flag carried by every response body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Successful prediction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionResponse {
    pub status: ResponseStatus,
    pub predicted_yield_tons_per_hectare: f64,
    pub location_details: String,
    pub crop_name: String,
    pub notes: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_validation() {
        let ok = PredictionRequest {
            crop_name: "rice".to_string(),
            location_name: "Majothi, Chamoli, Uttarakhand".to_string(),
        };
        assert!(ok.validate().is_ok());

        let blank = PredictionRequest {
            crop_name: "   ".to_string(),
            location_name: "Majothi".to_string(),
        };
        let errors = blank.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("crop_name"));
    }

    #[test]
    fn test_response_wire_format() {
        let response = PredictionResponse {
            status: ResponseStatus::Success,
            predicted_yield_tons_per_hectare: 3.42,
            location_details: "Majothi, Uttarakhand 246427, India".to_string(),
            crop_name: "Rice".to_string(),
            notes: "note".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["predicted_yield_tons_per_hectare"], 3.42);
        assert_eq!(json["crop_name"], "Rice");
    }
}

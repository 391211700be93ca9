//! Common types used across the service

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A geocoded location: coordinates plus the provider's canonical address.
///
/// Produced once per request and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub formatted_address: String,
}

impl ResolvedLocation {
    /// Build a location, rejecting coordinates outside the WGS84 ranges.
    pub fn new(
        latitude: f64,
        longitude: f64,
        formatted_address: impl Into<String>,
    ) -> Result<Self, &'static str> {
        crate::validation::validate_coordinates(latitude, longitude)?;
        Ok(Self {
            latitude,
            longitude,
            formatted_address: formatted_address.into(),
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("embedding window start {start} must be before end {end}")]
    Inverted { start: NaiveDate, end: NaiveDate },
}

/// Fixed historical date range the embedding collection is filtered to.
///
/// `end` is exclusive. The window must match the period the model was trained
/// on; it is never derived from the current date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmbeddingWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl EmbeddingWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, WindowError> {
        if start >= end {
            return Err(WindowError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parse a window from two `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, WindowError> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map_err(|_| WindowError::InvalidDate(s.to_string()))
        };
        Self::new(parse(start)?, parse(end)?)
    }

    /// Calendar year covered when the window spans exactly Jan 1 to the next Jan 1.
    pub fn calendar_year(&self) -> Option<i32> {
        let whole_year = self.start.month() == 1
            && self.start.day() == 1
            && self.end.month() == 1
            && self.end.day() == 1
            && self.end.year() == self.start.year() + 1;
        whole_year.then_some(self.start.year())
    }

    /// Human-readable reference period, e.g. `2020` or `2023-10-01 to 2024-09-30`.
    pub fn describe(&self) -> String {
        match self.calendar_year() {
            Some(year) => year.to_string(),
            None => {
                let last_day = self.end.pred_opt().unwrap_or(self.end);
                format!("{} to {}", self.start, last_day)
            }
        }
    }

    /// Formatted start date for provider requests.
    pub fn start_str(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    /// Formatted (exclusive) end date for provider requests.
    pub fn end_str(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

impl Default for EmbeddingWindow {
    /// Calendar year 2020, the model's training period.
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_location_rejects_out_of_range() {
        assert!(ResolvedLocation::new(30.07, 78.27, "Majothi").is_ok());
        assert!(ResolvedLocation::new(90.5, 0.0, "North of north").is_err());
        assert!(ResolvedLocation::new(0.0, -180.01, "Past the antimeridian").is_err());
    }

    #[test]
    fn test_default_window_is_training_year() {
        let window = EmbeddingWindow::default();
        assert_eq!(window.start_str(), "2020-01-01");
        assert_eq!(window.end_str(), "2021-01-01");
        assert_eq!(window.calendar_year(), Some(2020));
        assert_eq!(window.describe(), "2020");
    }

    #[test]
    fn test_partial_year_window_description() {
        let window = EmbeddingWindow::parse("2023-10-01", "2024-10-01").unwrap();
        assert_eq!(window.calendar_year(), None);
        assert_eq!(window.describe(), "2023-10-01 to 2024-09-30");
    }

    #[test]
    fn test_window_rejects_inverted_and_garbage() {
        assert!(matches!(
            EmbeddingWindow::parse("2021-01-01", "2020-01-01"),
            Err(WindowError::Inverted { .. })
        ));
        assert!(matches!(
            EmbeddingWindow::parse("2020-01-01", "2020-01-01"),
            Err(WindowError::Inverted { .. })
        ));
        assert_eq!(
            EmbeddingWindow::parse("last year", "2021-01-01"),
            Err(WindowError::InvalidDate("last year".to_string()))
        );
    }
}

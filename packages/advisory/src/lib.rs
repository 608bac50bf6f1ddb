#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Weather advisory lookup sources.
//!
//! Each provider implements the [`AdvisorySource`] trait to answer one
//! question: which hazard categories currently have an active advisory
//! at a location. Two providers are included:
//!
//! - [`weather_api::WeatherApiSource`] — a weather alerts REST API
//!   (`alerts.json`), keyed by coordinates or place name.
//! - [`bulletin::BulletinSource`] — the national weather service's HTML
//!   hazard bulletin page, one advisory panel per category.
//!
//! Callers must tolerate a failed lookup by substituting
//! [`AdvisorySnapshot::empty`]; the activator does exactly that.

pub mod bulletin;
pub mod weather_api;

use async_trait::async_trait;
use hazard_fence_advisory_models::AdvisorySnapshot;

/// Errors that can occur during an advisory lookup.
#[derive(Debug, thiserror::Error)]
pub enum AdvisoryError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// A required configuration value is missing.
    #[error("Missing configuration: {name}")]
    MissingConfig {
        /// The environment variable that was not set.
        name: &'static str,
    },
}

/// The location an advisory lookup is keyed by.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupQuery {
    /// Anchor latitude.
    pub latitude: f64,
    /// Anchor longitude.
    pub longitude: f64,
    /// Resolved place name, when reverse geocoding succeeded.
    pub place_name: Option<String>,
}

impl LookupQuery {
    /// A coordinate-only query.
    #[must_use]
    pub const fn from_coordinates(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            place_name: None,
        }
    }

    /// The lookup key providers send upstream: the place name when one
    /// was resolved, otherwise `"lat,lon"`.
    #[must_use]
    pub fn key(&self) -> String {
        self.place_name.clone().unwrap_or_else(|| {
            format!("{:.6},{:.6}", self.latitude, self.longitude)
        })
    }
}

/// Trait all advisory providers implement.
#[async_trait]
pub trait AdvisorySource: Send + Sync {
    /// A unique identifier for this provider (e.g. `"weather_api"`).
    fn id(&self) -> &str;

    /// Fetches the advisories currently active at `query`'s location.
    ///
    /// # Errors
    ///
    /// Returns [`AdvisoryError`] if the request or parsing fails. The
    /// caller substitutes an empty snapshot in that case.
    async fn fetch_advisories(&self, query: &LookupQuery) -> Result<AdvisorySnapshot, AdvisoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_query_key_is_lat_lon() {
        let query = LookupQuery::from_coordinates(13.143_245, 123.741_798);
        assert_eq!(query.key(), "13.143245,123.741798");
    }

    #[test]
    fn place_name_wins_over_coordinates() {
        let query = LookupQuery {
            latitude: 13.1,
            longitude: 123.7,
            place_name: Some("Legazpi City".to_string()),
        };
        assert_eq!(query.key(), "Legazpi City");
    }
}

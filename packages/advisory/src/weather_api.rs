//! Weather alerts REST API provider.
//!
//! Queries the `alerts.json` endpoint of a weatherapi.com-compatible
//! service and maps each returned alert onto a [`HazardCategory`] by
//! keyword-matching its `event`/`headline` fields. Alerts that match no
//! category (e.g. heat advisories) are ignored rather than activating
//! fences for hazards this system does not track.

use async_trait::async_trait;
use hazard_fence_advisory_models::{AdvisorySnapshot, HazardCategory};

use crate::{AdvisoryError, AdvisorySource, LookupQuery};

/// Default API base, overridable via `WEATHER_API_BASE_URL`.
const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1";

/// Advisory provider backed by a weather alerts REST API.
pub struct WeatherApiSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl WeatherApiSource {
    /// Creates a provider for the given API base URL and key.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Creates a provider from `WEATHER_API_KEY` and (optionally)
    /// `WEATHER_API_BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns [`AdvisoryError::MissingConfig`] if `WEATHER_API_KEY` is
    /// not set.
    pub fn from_env() -> Result<Self, AdvisoryError> {
        let api_key = std::env::var("WEATHER_API_KEY").map_err(|_| {
            AdvisoryError::MissingConfig {
                name: "WEATHER_API_KEY",
            }
        })?;
        let base_url = std::env::var("WEATHER_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Ok(Self::new(base_url, api_key))
    }
}

#[async_trait]
impl AdvisorySource for WeatherApiSource {
    fn id(&self) -> &str {
        "weather_api"
    }

    async fn fetch_advisories(
        &self,
        query: &LookupQuery,
    ) -> Result<AdvisorySnapshot, AdvisoryError> {
        let url = format!("{}/alerts.json", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("q", &query.key())])
            .send()
            .await?
            .error_for_status()?;

        let body: serde_json::Value = resp.json().await?;
        parse_alerts(&body)
    }
}

/// Parses an `alerts.json` response body into a snapshot.
///
/// # Errors
///
/// Returns [`AdvisoryError::Parse`] if the `alerts.alert` array is
/// missing or not an array.
pub fn parse_alerts(body: &serde_json::Value) -> Result<AdvisorySnapshot, AdvisoryError> {
    let alerts = body["alerts"]["alert"]
        .as_array()
        .ok_or_else(|| AdvisoryError::Parse {
            message: "missing alerts.alert array in response".to_string(),
        })?;

    let mut snapshot = AdvisorySnapshot::empty();
    for alert in alerts {
        let event = alert["event"].as_str().unwrap_or_default();
        let headline = alert["headline"].as_str().unwrap_or_default();

        let Some(category) = categorize(event).or_else(|| categorize(headline)) else {
            log::debug!("ignoring uncategorized alert: {event}");
            continue;
        };

        let text = if headline.is_empty() { event } else { headline };
        // First alert per category wins; later ones add no information
        // to the boolean activation decision.
        if snapshot.advisory(category).is_none() {
            snapshot.set(category, text);
        }
    }

    Ok(snapshot)
}

/// Maps an alert event/headline onto a hazard category by keyword.
fn categorize(text: &str) -> Option<HazardCategory> {
    let lowered = text.to_lowercase();
    if lowered.contains("tropical") || lowered.contains("typhoon") || lowered.contains("cyclone") {
        Some(HazardCategory::Tropical)
    } else if lowered.contains("thunder") {
        Some(HazardCategory::Thunderstorm)
    } else if lowered.contains("flood") {
        Some(HazardCategory::Flood)
    } else if lowered.contains("rain") {
        Some(HazardCategory::Rainfall)
    } else {
        None
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Reverse geocoding for advisory lookups.
//!
//! The activator anchors each fence to one coordinate pair; some
//! advisory providers want a place name as the lookup key instead. This
//! crate turns coordinates into place metadata via the Nominatim /
//! OpenStreetMap `reverse` endpoint.
//!
//! Nominatim has strict rate limits: **1 request per second** maximum on
//! the public instance. The caller owns rate limiting.
//!
//! See <https://nominatim.org/release-docs/develop/api/Reverse/>

use async_trait::async_trait;

/// Default public Nominatim instance, overridable via
/// `NOMINATIM_BASE_URL`.
const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Place metadata resolved from a coordinate pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Place {
    /// Short place name (city/town/village), when present.
    pub name: Option<String>,
    /// Full display name.
    pub display_name: String,
    /// State or region, when present.
    pub region: Option<String>,
    /// Country, when present.
    pub country: Option<String>,
}

impl Place {
    /// The best lookup key for this place: the short name, falling back
    /// to the full display name.
    #[must_use]
    pub fn lookup_key(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.display_name)
    }
}

/// Errors from reverse geocoding operations.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,
}

/// Trait for turning coordinates into place metadata.
#[async_trait]
pub trait PlaceResolver: Send + Sync {
    /// Resolves a coordinate pair to a place, or `None` when the
    /// geocoder has no answer for that location.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request or parsing fails.
    async fn resolve(&self, latitude: f64, longitude: f64) -> Result<Option<Place>, GeocodeError>;
}

/// Nominatim reverse-geocoding client.
pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimClient {
    /// Creates a client for the given Nominatim base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Creates a client from `NOMINATIM_BASE_URL`, defaulting to the
    /// public instance.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("NOMINATIM_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }
}

#[async_trait]
impl PlaceResolver for NominatimClient {
    async fn resolve(&self, latitude: f64, longitude: f64) -> Result<Option<Place>, GeocodeError> {
        let url = format!("{}/reverse", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("format", "jsonv2".to_string()),
                ("zoom", "10".to_string()),
            ])
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }

        let body: serde_json::Value = resp.json().await?;
        parse_response(&body)
    }
}

/// Parses a Nominatim reverse-geocode JSON response.
///
/// # Errors
///
/// Returns [`GeocodeError::Parse`] when a non-error response is missing
/// its `display_name`.
pub fn parse_response(body: &serde_json::Value) -> Result<Option<Place>, GeocodeError> {
    // Nominatim reports "unable to geocode" as an error object, not an
    // HTTP failure.
    if body.get("error").is_some() {
        return Ok(None);
    }

    let display_name = body["display_name"]
        .as_str()
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing display_name in Nominatim response".to_string(),
        })?
        .to_string();

    let address = &body["address"];
    let name = ["city", "town", "village", "municipality"]
        .iter()
        .find_map(|key| address[key].as_str())
        .map(String::from);

    Ok(Some(Place {
        name,
        display_name,
        region: address["state"].as_str().map(String::from),
        country: address["country"].as_str().map(String::from),
    }))
}

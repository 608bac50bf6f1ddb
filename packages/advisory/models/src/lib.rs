#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hazard category taxonomy and advisory snapshot types.
//!
//! The four categories match the alert types published by the national
//! weather service's hazard bulletin board. A snapshot is ephemeral: it
//! is fetched fresh on every activation pass and never persisted — only
//! the derived `is_active` flag on each fence is.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A weather hazard category an advisory can be issued for.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum HazardCategory {
    /// Heavy rainfall warnings.
    Rainfall,
    /// Thunderstorm advisories.
    Thunderstorm,
    /// Flood advisories.
    Flood,
    /// Tropical cyclone bulletins.
    Tropical,
}

impl HazardCategory {
    /// All categories, in bulletin-board order.
    pub const ALL: &[Self] = &[
        Self::Rainfall,
        Self::Thunderstorm,
        Self::Flood,
        Self::Tropical,
    ];
}

/// The advisories active for one location at one moment.
///
/// Maps each hazard category to its advisory text; an absent category
/// means no active advisory there. An all-empty snapshot is the safe
/// default when a lookup fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisorySnapshot {
    advisories: BTreeMap<HazardCategory, String>,
}

impl AdvisorySnapshot {
    /// A snapshot with no active advisories.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Records an advisory for a category. Blank text is treated as "no
    /// advisory" and ignored.
    pub fn set(&mut self, category: HazardCategory, text: impl Into<String>) {
        let text = text.into();
        if !text.trim().is_empty() {
            self.advisories.insert(category, text);
        }
    }

    /// The advisory text for a category, if one is active.
    #[must_use]
    pub fn advisory(&self, category: HazardCategory) -> Option<&str> {
        self.advisories.get(&category).map(String::as_str)
    }

    /// Whether any category currently has an advisory.
    #[must_use]
    pub fn has_any_advisory(&self) -> bool {
        !self.advisories.is_empty()
    }

    /// Iterates over the active advisories in category order.
    pub fn iter(&self) -> impl Iterator<Item = (HazardCategory, &str)> {
        self.advisories
            .iter()
            .map(|(category, text)| (*category, text.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_has_no_advisories() {
        let snapshot = AdvisorySnapshot::empty();
        assert!(!snapshot.has_any_advisory());
        for category in HazardCategory::ALL {
            assert!(snapshot.advisory(*category).is_none());
        }
    }

    #[test]
    fn set_records_an_advisory() {
        let mut snapshot = AdvisorySnapshot::empty();
        snapshot.set(HazardCategory::Flood, "Flood advisory #3 for Albay");
        assert!(snapshot.has_any_advisory());
        assert_eq!(
            snapshot.advisory(HazardCategory::Flood),
            Some("Flood advisory #3 for Albay")
        );
        assert!(snapshot.advisory(HazardCategory::Rainfall).is_none());
    }

    #[test]
    fn blank_text_counts_as_absent() {
        let mut snapshot = AdvisorySnapshot::empty();
        snapshot.set(HazardCategory::Rainfall, "   ");
        assert!(!snapshot.has_any_advisory());
    }

    #[test]
    fn category_names_are_screaming_snake() {
        assert_eq!(HazardCategory::Tropical.as_ref(), "TROPICAL");
        assert_eq!(
            "THUNDERSTORM".parse::<HazardCategory>().unwrap(),
            HazardCategory::Thunderstorm
        );
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Fence activation pass.
//!
//! Keeps each fence's `is_active` flag consistent with real-world hazard
//! advisories. One pass sweeps every fence in the registry: the fence's
//! anchor point is (optionally) reverse-geocoded to a place name, the
//! advisory source is queried, and the flag is persisted through the
//! registry's single-field update contract.
//!
//! Failures are isolated per fence. A failed or timed-out lookup is
//! logged and treated as "no advisory" for that pass only, so the fence
//! deactivates conservatively and the sweep continues. The pass is an
//! at-least-once, idempotent reconciliation: rerunning it with unchanged
//! advisories produces the same flags.
//!
//! Scheduling is the caller's concern (the CLI runs it once or on an
//! interval); the pass itself owns no timer.

use std::time::Duration;

use async_trait::async_trait;
use hazard_fence_advisory::{AdvisorySource, LookupQuery};
use hazard_fence_advisory_models::AdvisorySnapshot;
use hazard_fence_geocoder::PlaceResolver;
use hazard_fence_geofence_models::Fence;
use tokio::time::timeout;

/// Tunables for one activation pass.
#[derive(Debug, Clone)]
pub struct ActivatorConfig {
    /// Upper bound on each advisory lookup (and each reverse-geocode).
    pub lookup_timeout: Duration,
}

impl Default for ActivatorConfig {
    fn default() -> Self {
        Self {
            lookup_timeout: Duration::from_secs(30),
        }
    }
}

impl ActivatorConfig {
    /// Reads `ACTIVATION_LOOKUP_TIMEOUT_SECS`, falling back to the
    /// default on absence or parse failure.
    #[must_use]
    pub fn from_env() -> Self {
        let lookup_timeout = std::env::var("ACTIVATION_LOOKUP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map_or_else(
                || Self::default().lookup_timeout,
                Duration::from_secs,
            );
        Self { lookup_timeout }
    }
}

/// Error from persisting an activation flag.
#[derive(Debug, thiserror::Error)]
#[error("flag store error: {message}")]
pub struct FlagStoreError {
    /// Description of the failure.
    pub message: String,
}

impl FlagStoreError {
    /// Creates an error with the given description.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The registry's update contract: a single-field partial update of one
/// fence's `is_active` flag.
#[async_trait]
pub trait FenceFlagStore: Send + Sync {
    /// Persists the flag for one fence, independently of other fences.
    ///
    /// # Errors
    ///
    /// Returns [`FlagStoreError`] if the write fails; the pass logs it
    /// and continues with the next fence.
    async fn set_active(&self, fence_id: i64, is_active: bool) -> Result<(), FlagStoreError>;
}

/// Outcome counters for one activation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivationSummary {
    /// Fences swept.
    pub evaluated: usize,
    /// Flags flipped from inactive to active.
    pub activated: usize,
    /// Flags flipped from active to inactive.
    pub deactivated: usize,
    /// Flags already correct.
    pub unchanged: usize,
    /// Lookups that failed or timed out (fence treated as no-advisory).
    pub lookup_failures: usize,
    /// Flag writes that failed.
    pub store_failures: usize,
}

/// Whether a snapshot activates a fence: any category with an advisory.
#[must_use]
pub fn snapshot_activates(snapshot: &AdvisorySnapshot) -> bool {
    snapshot.has_any_advisory()
}

/// Runs one activation pass over `fences`.
///
/// When `resolver` is provided, each anchor is reverse-geocoded and the
/// resolved place name becomes the lookup key; resolver failures fall
/// back to coordinates.
pub async fn run_pass(
    fences: &[Fence],
    source: &dyn AdvisorySource,
    resolver: Option<&dyn PlaceResolver>,
    store: &dyn FenceFlagStore,
    config: &ActivatorConfig,
) -> ActivationSummary {
    let mut summary = ActivationSummary::default();

    for fence in fences {
        summary.evaluated += 1;
        let anchor = fence.geometry.anchor();

        let place_name = match resolver {
            Some(resolver) => {
                match timeout(
                    config.lookup_timeout,
                    resolver.resolve(anchor.latitude, anchor.longitude),
                )
                .await
                {
                    Ok(Ok(place)) => place.map(|p| p.lookup_key().to_string()),
                    Ok(Err(e)) => {
                        log::warn!(
                            "reverse geocode failed for fence {} ({}): {e}; using coordinates",
                            fence.id,
                            fence.name
                        );
                        None
                    }
                    Err(_) => {
                        log::warn!(
                            "reverse geocode timed out for fence {} ({}); using coordinates",
                            fence.id,
                            fence.name
                        );
                        None
                    }
                }
            }
            None => None,
        };

        let query = LookupQuery {
            latitude: anchor.latitude,
            longitude: anchor.longitude,
            place_name,
        };

        let snapshot = match timeout(config.lookup_timeout, source.fetch_advisories(&query)).await
        {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(e)) => {
                log::warn!(
                    "advisory lookup via {} failed for fence {} ({}): {e}; treating as no advisory",
                    source.id(),
                    fence.id,
                    fence.name
                );
                summary.lookup_failures += 1;
                AdvisorySnapshot::empty()
            }
            Err(_) => {
                log::warn!(
                    "advisory lookup via {} timed out for fence {} ({}); treating as no advisory",
                    source.id(),
                    fence.id,
                    fence.name
                );
                summary.lookup_failures += 1;
                AdvisorySnapshot::empty()
            }
        };

        let is_active = snapshot_activates(&snapshot);
        if is_active == fence.is_active {
            summary.unchanged += 1;
        } else if is_active {
            summary.activated += 1;
            log::info!("activating fence {} ({})", fence.id, fence.name);
        } else {
            summary.deactivated += 1;
            log::info!("deactivating fence {} ({})", fence.id, fence.name);
        }

        if let Err(e) = store.set_active(fence.id, is_active).await {
            log::error!(
                "failed to persist flag for fence {} ({}): {e}",
                fence.id,
                fence.name
            );
            summary.store_failures += 1;
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use chrono::Utc;
    use hazard_fence_advisory::AdvisoryError;
    use hazard_fence_advisory_models::HazardCategory;
    use hazard_fence_geofence_models::{FenceCategory, FenceGeometry, GeoPoint};

    use super::*;

    struct StubSource {
        snapshot: AdvisorySnapshot,
        /// Latitudes for which the lookup errors instead.
        failing_latitudes: Vec<f64>,
    }

    impl StubSource {
        fn with_snapshot(snapshot: AdvisorySnapshot) -> Self {
            Self {
                snapshot,
                failing_latitudes: Vec::new(),
            }
        }

        fn empty() -> Self {
            Self::with_snapshot(AdvisorySnapshot::empty())
        }
    }

    #[async_trait]
    impl AdvisorySource for StubSource {
        fn id(&self) -> &str {
            "stub"
        }

        async fn fetch_advisories(
            &self,
            query: &LookupQuery,
        ) -> Result<AdvisorySnapshot, AdvisoryError> {
            if self
                .failing_latitudes
                .iter()
                .any(|lat| (lat - query.latitude).abs() < f64::EPSILON)
            {
                return Err(AdvisoryError::Parse {
                    message: "simulated failure".to_string(),
                });
            }
            Ok(self.snapshot.clone())
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        flags: Mutex<BTreeMap<i64, bool>>,
        fail: bool,
    }

    impl MemoryStore {
        fn flags(&self) -> BTreeMap<i64, bool> {
            self.flags.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FenceFlagStore for MemoryStore {
        async fn set_active(&self, fence_id: i64, is_active: bool) -> Result<(), FlagStoreError> {
            if self.fail {
                return Err(FlagStoreError::new("simulated write failure"));
            }
            self.flags.lock().unwrap().insert(fence_id, is_active);
            Ok(())
        }
    }

    fn fence_at(id: i64, latitude: f64) -> Fence {
        Fence::new(
            id,
            format!("fence {id}"),
            FenceCategory::Other,
            FenceGeometry::Circle {
                center: GeoPoint::new(latitude, 123.7),
                radius_meters: 500.0,
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn flood_snapshot() -> AdvisorySnapshot {
        let mut snapshot = AdvisorySnapshot::empty();
        snapshot.set(HazardCategory::Flood, "advisory text");
        snapshot
    }

    #[test]
    fn empty_snapshot_deactivates_and_flood_activates() {
        assert!(!snapshot_activates(&AdvisorySnapshot::empty()));
        assert!(snapshot_activates(&flood_snapshot()));
    }

    #[tokio::test]
    async fn pass_activates_fences_with_advisories() {
        let fences = vec![fence_at(1, 13.1), fence_at(2, 13.2)];
        let source = StubSource::with_snapshot(flood_snapshot());
        let store = MemoryStore::default();

        let summary = run_pass(
            &fences,
            &source,
            None,
            &store,
            &ActivatorConfig::default(),
        )
        .await;

        assert_eq!(summary.evaluated, 2);
        assert_eq!(summary.activated, 2);
        assert_eq!(store.flags(), BTreeMap::from([(1, true), (2, true)]));
    }

    #[tokio::test]
    async fn pass_deactivates_when_no_advisory() {
        let mut fence = fence_at(1, 13.1);
        fence.is_active = true;
        let source = StubSource::empty();
        let store = MemoryStore::default();

        let summary = run_pass(
            &[fence],
            &source,
            None,
            &store,
            &ActivatorConfig::default(),
        )
        .await;

        assert_eq!(summary.deactivated, 1);
        assert_eq!(store.flags(), BTreeMap::from([(1, false)]));
    }

    #[tokio::test]
    async fn pass_is_idempotent_with_unchanged_advisories() {
        let fences = vec![fence_at(1, 13.1), fence_at(2, 13.2)];
        let source = StubSource::with_snapshot(flood_snapshot());
        let store = MemoryStore::default();
        let config = ActivatorConfig::default();

        run_pass(&fences, &source, None, &store, &config).await;
        let first = store.flags();

        // Reload the fences with the persisted flags, as a scheduler
        // would between passes.
        let fences: Vec<Fence> = fences
            .into_iter()
            .map(|mut f| {
                f.is_active = first[&f.id];
                f
            })
            .collect();

        let summary = run_pass(&fences, &source, None, &store, &config).await;
        assert_eq!(store.flags(), first);
        assert_eq!(summary.unchanged, 2);
        assert_eq!(summary.activated + summary.deactivated, 0);
    }

    #[tokio::test]
    async fn one_failing_lookup_does_not_block_the_rest() {
        let mut active = fence_at(1, 13.1);
        active.is_active = true;
        let fences = vec![active, fence_at(2, 13.2)];

        let source = StubSource {
            snapshot: flood_snapshot(),
            failing_latitudes: vec![13.1],
        };
        let store = MemoryStore::default();

        let summary = run_pass(
            &fences,
            &source,
            None,
            &store,
            &ActivatorConfig::default(),
        )
        .await;

        assert_eq!(summary.lookup_failures, 1);
        // The failed fence deactivates conservatively; the other fence
        // still activates.
        assert_eq!(store.flags(), BTreeMap::from([(1, false), (2, true)]));
    }

    #[tokio::test]
    async fn store_failures_are_counted_and_isolated() {
        let fences = vec![fence_at(1, 13.1), fence_at(2, 13.2)];
        let source = StubSource::with_snapshot(flood_snapshot());
        let store = MemoryStore {
            fail: true,
            ..MemoryStore::default()
        };

        let summary = run_pass(
            &fences,
            &source,
            None,
            &store,
            &ActivatorConfig::default(),
        )
        .await;

        assert_eq!(summary.evaluated, 2);
        assert_eq!(summary.store_failures, 2);
    }

    #[tokio::test]
    async fn slow_lookup_times_out_and_deactivates() {
        struct SlowSource;

        #[async_trait]
        impl AdvisorySource for SlowSource {
            fn id(&self) -> &str {
                "slow"
            }

            async fn fetch_advisories(
                &self,
                _query: &LookupQuery,
            ) -> Result<AdvisorySnapshot, AdvisoryError> {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(AdvisorySnapshot::empty())
            }
        }

        let mut fence = fence_at(1, 13.1);
        fence.is_active = true;
        let store = MemoryStore::default();
        let config = ActivatorConfig {
            lookup_timeout: Duration::from_millis(10),
        };

        let summary = run_pass(&[fence], &SlowSource, None, &store, &config).await;

        assert_eq!(summary.lookup_failures, 1);
        assert_eq!(store.flags(), BTreeMap::from([(1, false)]));
    }
}

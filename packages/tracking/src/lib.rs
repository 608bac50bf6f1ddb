#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Per-user tracking session state machine.
//!
//! A session consumes discrete position samples delivered by the client
//! (browser geolocation updates, no fixed cadence), appends them to a
//! trail, and detects geofence entries against the current fence set.
//!
//! Entry detection is edge-triggered: the session remembers which fences
//! the user is currently inside and emits an [`SessionEvent::EnteredFence`]
//! only on an outside-to-inside transition, so sustained containment
//! over consecutive samples produces exactly one event. Leaving a fence
//! clears the flag, so a genuine re-entry alerts again.
//!
//! The session itself is pure state: persisting trails and delivering
//! alerts are the caller's side effects, driven by the returned events
//! and the trail handed back by [`TrackingSession::stop`].

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use hazard_fence_geofence::point_in_fence;
use hazard_fence_geofence_models::{Fence, PositionSample, Trail, TrailPoint};
use uuid::Uuid;

/// Tracking lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not tracking; samples are rejected.
    Idle,
    /// Tracking; samples are recorded and evaluated.
    Active,
}

/// Something the caller must act on after a sample was processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The user crossed from outside to inside an active fence.
    EnteredFence {
        /// The fence that was entered.
        fence_id: i64,
        /// The fence name at detection time.
        fence_name: String,
    },
}

/// Errors from session operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// A sample arrived while the session was idle.
    #[error("session is not tracking")]
    NotTracking,
}

/// One user's tracking session.
pub struct TrackingSession {
    id: Uuid,
    user_id: String,
    state: SessionState,
    started_at: Option<DateTime<Utc>>,
    points: Vec<TrailPoint>,
    /// Fences the user is currently inside, for edge-triggered alerting.
    inside: BTreeSet<i64>,
}

impl TrackingSession {
    /// Creates an idle session for `user_id`.
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            state: SessionState::Idle,
            started_at: None,
            points: Vec::new(),
            inside: BTreeSet::new(),
        }
    }

    /// The session identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// The current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// The tracked user.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Number of points recorded so far.
    #[must_use]
    pub const fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Starts tracking. Starting an already-active session is a no-op.
    pub fn start(&mut self, at: DateTime<Utc>) {
        if self.state == SessionState::Active {
            return;
        }
        log::debug!("session {} for {} started", self.id, self.user_id);
        self.state = SessionState::Active;
        self.started_at = Some(at);
    }

    /// Processes one position sample: appends it to the trail and
    /// evaluates containment against every fence, emitting one entry
    /// event per outside-to-inside transition. Inactive fences never
    /// produce events (the evaluator treats them as containing nothing).
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotTracking`] when the session is idle; a
    /// stopped session ceases consuming samples.
    pub fn record_sample(
        &mut self,
        sample: PositionSample,
        recorded_at: DateTime<Utc>,
        fences: &[Fence],
    ) -> Result<Vec<SessionEvent>, SessionError> {
        if self.state != SessionState::Active {
            return Err(SessionError::NotTracking);
        }

        let position = sample.position();
        self.points.push(TrailPoint {
            position,
            recorded_at,
            accuracy_meters: sample.accuracy_meters,
        });

        let mut events = Vec::new();
        for fence in fences {
            let contained = point_in_fence(position, fence);
            if contained {
                if self.inside.insert(fence.id) {
                    log::info!(
                        "user {} entered fence {} ({})",
                        self.user_id,
                        fence.id,
                        fence.name
                    );
                    events.push(SessionEvent::EnteredFence {
                        fence_id: fence.id,
                        fence_name: fence.name.clone(),
                    });
                }
            } else {
                self.inside.remove(&fence.id);
            }
        }

        Ok(events)
    }

    /// Stops tracking and hands back the accumulated trail for
    /// persistence, clearing all in-memory path state. Returns `None`
    /// when the session was already idle.
    pub fn stop(&mut self, at: DateTime<Utc>) -> Option<Trail> {
        if self.state != SessionState::Active {
            return None;
        }

        self.state = SessionState::Idle;
        self.inside.clear();
        let started_at = self.started_at.take().unwrap_or(at);
        let points = std::mem::take(&mut self.points);

        log::debug!(
            "session {} for {} stopped with {} points",
            self.id,
            self.user_id,
            points.len()
        );

        Some(Trail {
            user_id: self.user_id.clone(),
            started_at,
            ended_at: at,
            points,
        })
    }

    /// Discards the accumulated trail without persisting it. Fence
    /// bookkeeping is untouched so clearing mid-session cannot cause
    /// duplicate entry alerts.
    pub fn clear_path(&mut self) {
        self.points.clear();
    }
}

#[cfg(test)]
mod tests {
    use hazard_fence_geofence_models::{FenceCategory, FenceGeometry, GeoPoint};

    use super::*;

    fn circle_fence(id: i64, active: bool) -> Fence {
        let mut fence = Fence::new(
            id,
            format!("fence {id}"),
            FenceCategory::HighRiskArea,
            FenceGeometry::Circle {
                center: GeoPoint::new(13.1000, 123.7000),
                radius_meters: 500.0,
            },
            Utc::now(),
        )
        .unwrap();
        fence.is_active = active;
        fence
    }

    fn sample(latitude: f64, longitude: f64) -> PositionSample {
        PositionSample {
            latitude,
            longitude,
            accuracy_meters: 10.0,
        }
    }

    const INSIDE: (f64, f64) = (13.1000, 123.7000);
    const OUTSIDE: (f64, f64) = (13.1090, 123.7000);

    fn active_session() -> TrackingSession {
        let mut session = TrackingSession::new("user-1");
        session.start(Utc::now());
        session
    }

    #[test]
    fn idle_session_rejects_samples() {
        let mut session = TrackingSession::new("user-1");
        let result = session.record_sample(sample(13.1, 123.7), Utc::now(), &[]);
        assert_eq!(result, Err(SessionError::NotTracking));
    }

    #[test]
    fn sustained_containment_emits_one_event() {
        let fences = vec![circle_fence(1, true)];
        let mut session = active_session();

        let first = session
            .record_sample(sample(INSIDE.0, INSIDE.1), Utc::now(), &fences)
            .unwrap();
        assert_eq!(
            first,
            vec![SessionEvent::EnteredFence {
                fence_id: 1,
                fence_name: "fence 1".to_string(),
            }]
        );

        let second = session
            .record_sample(sample(INSIDE.0, INSIDE.1), Utc::now(), &fences)
            .unwrap();
        assert!(second.is_empty(), "no duplicate alert while still inside");
    }

    #[test]
    fn reentry_after_exit_alerts_again() {
        let fences = vec![circle_fence(1, true)];
        let mut session = active_session();

        let entered = session
            .record_sample(sample(INSIDE.0, INSIDE.1), Utc::now(), &fences)
            .unwrap();
        assert_eq!(entered.len(), 1);

        let left = session
            .record_sample(sample(OUTSIDE.0, OUTSIDE.1), Utc::now(), &fences)
            .unwrap();
        assert!(left.is_empty());

        let reentered = session
            .record_sample(sample(INSIDE.0, INSIDE.1), Utc::now(), &fences)
            .unwrap();
        assert_eq!(reentered.len(), 1);
    }

    #[test]
    fn inactive_fence_never_alerts() {
        let fences = vec![circle_fence(1, false)];
        let mut session = active_session();
        let events = session
            .record_sample(sample(INSIDE.0, INSIDE.1), Utc::now(), &fences)
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn one_sample_can_enter_multiple_fences() {
        let mut wide = circle_fence(2, true);
        wide.geometry = FenceGeometry::Circle {
            center: GeoPoint::new(13.1000, 123.7000),
            radius_meters: 2_000.0,
        };
        let fences = vec![circle_fence(1, true), wide];
        let mut session = active_session();
        let events = session
            .record_sample(sample(INSIDE.0, INSIDE.1), Utc::now(), &fences)
            .unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn stop_hands_back_trail_and_clears_state() {
        let fences = vec![circle_fence(1, true)];
        let mut session = active_session();
        session
            .record_sample(sample(INSIDE.0, INSIDE.1), Utc::now(), &fences)
            .unwrap();
        session
            .record_sample(sample(OUTSIDE.0, OUTSIDE.1), Utc::now(), &fences)
            .unwrap();

        let trail = session.stop(Utc::now()).unwrap();
        assert_eq!(trail.user_id, "user-1");
        assert_eq!(trail.points.len(), 2);

        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.point_count(), 0);
        assert!(session.stop(Utc::now()).is_none());
    }

    #[test]
    fn clear_path_discards_points_without_persisting() {
        let mut session = active_session();
        session
            .record_sample(sample(INSIDE.0, INSIDE.1), Utc::now(), &[])
            .unwrap();
        assert_eq!(session.point_count(), 1);

        session.clear_path();
        assert_eq!(session.point_count(), 0);
        assert_eq!(session.state(), SessionState::Active);
    }

    #[test]
    fn clear_path_does_not_reset_entry_bookkeeping() {
        let fences = vec![circle_fence(1, true)];
        let mut session = active_session();
        session
            .record_sample(sample(INSIDE.0, INSIDE.1), Utc::now(), &fences)
            .unwrap();

        session.clear_path();

        let events = session
            .record_sample(sample(INSIDE.0, INSIDE.1), Utc::now(), &fences)
            .unwrap();
        assert!(events.is_empty(), "still inside, no re-alert after clear");
    }

    #[test]
    fn starting_twice_keeps_the_original_start_time() {
        let mut session = TrackingSession::new("user-1");
        let first = Utc::now();
        session.start(first);
        session.start(first + chrono::Duration::seconds(30));
        let trail = session.stop(first + chrono::Duration::seconds(60)).unwrap();
        assert_eq!(trail.started_at, first);
    }
}

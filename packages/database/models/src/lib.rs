#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Database row types.
//!
//! These represent the shapes of data as stored in and retrieved from
//! the registry database. They are distinct from the API types in
//! `hazard_fence_server_models` so the storage schema and the API
//! contract can evolve independently.

use chrono::{DateTime, Utc};
use hazard_fence_geofence_models::{Fence, FenceCategory, FenceGeometry};
use serde::{Deserialize, Serialize};

/// A fence row with its geometry decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FenceRow {
    /// Primary key.
    pub id: i64,
    /// User-supplied fence name.
    pub name: String,
    /// Fence category.
    pub category: FenceCategory,
    /// Decoded geometry.
    pub geometry: FenceGeometry,
    /// Activation flag, owned by the activator.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<FenceRow> for Fence {
    fn from(row: FenceRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            category: row.category,
            geometry: row.geometry,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

/// A persisted tracking session row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailSessionRow {
    /// Primary key.
    pub id: i64,
    /// The tracked user.
    pub user_id: String,
    /// When tracking started.
    pub started_at: DateTime<Utc>,
    /// When tracking stopped.
    pub ended_at: DateTime<Utc>,
    /// Number of recorded points.
    pub point_count: usize,
}

/// An alert-event log row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEventRow {
    /// Primary key.
    pub id: i64,
    /// The user who entered a fence.
    pub user_id: String,
    /// The fence that was entered, when recorded.
    pub fence_id: Option<i64>,
    /// The fence name at detection time, when recorded.
    pub fence_name: Option<String>,
    /// When the entry was detected.
    pub occurred_at: DateTime<Utc>,
}

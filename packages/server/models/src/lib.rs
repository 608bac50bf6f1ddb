#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the hazard fence server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the database row types to allow independent evolution of the API
//! contract.

use chrono::{DateTime, Utc};
use hazard_fence_database_models::FenceRow;
use hazard_fence_geofence_models::{Fence, FenceCategory, FenceGeometry, TrailPoint};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// A fence as returned by the API, with the map color for the frontend
/// derived from its category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiFence {
    /// Unique fence ID.
    pub id: i64,
    /// User-supplied fence name.
    pub name: String,
    /// Fence category derived from the name.
    pub category: FenceCategory,
    /// Map render color (`blue`/`red`/`green`).
    pub color: String,
    /// Whether an advisory currently covers this fence.
    pub is_active: bool,
    /// Fence geometry.
    pub geometry: FenceGeometry,
    /// When the fence was created (ISO 8601).
    pub created_at: DateTime<Utc>,
}

impl From<FenceRow> for ApiFence {
    fn from(row: FenceRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            category: row.category,
            color: row.category.map_color().to_string(),
            is_active: row.is_active,
            geometry: row.geometry,
            created_at: row.created_at,
        }
    }
}

impl From<Fence> for ApiFence {
    fn from(fence: Fence) -> Self {
        Self {
            id: fence.id,
            name: fence.name,
            category: fence.category,
            color: fence.category.map_color().to_string(),
            is_active: fence.is_active,
            geometry: fence.geometry,
            created_at: fence.created_at,
        }
    }
}

/// Request body for creating a fence from a drawn map shape.
///
/// `feature` is a GeoJSON feature as emitted by the map's draw tool: a
/// `Polygon` for drawn areas, or a `Point` carrying a `radius` property
/// for drawn circles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFenceRequest {
    /// Fence name; the category is derived from it.
    pub name: String,
    /// GeoJSON feature for the drawn shape.
    pub feature: serde_json::Value,
}

/// Request body for persisting a finished tracking session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveTrailRequest {
    /// The tracked user.
    pub user_id: String,
    /// When tracking started (ISO 8601).
    pub started_at: DateTime<Utc>,
    /// When tracking stopped (ISO 8601).
    pub ended_at: DateTime<Utc>,
    /// The recorded trail, in order.
    pub points: Vec<TrailPoint>,
}

/// Request body for logging a fence entry alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEventRequest {
    /// The user who entered the fence.
    pub user_id: String,
    /// The fence that was entered.
    pub fence_id: i64,
    /// The fence name at detection time.
    pub fence_name: String,
    /// When the entry was detected; defaults to the server clock.
    pub occurred_at: Option<DateTime<Utc>>,
}

/// Query parameters for the alert event listing endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEventQueryParams {
    /// Maximum number of events to return.
    pub limit: Option<u32>,
}

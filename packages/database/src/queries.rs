//! Query functions for the fence registry, trail log, and alert log.
//!
//! Fences support create/list/get/delete plus the single-field
//! `is_active` update. Trail sessions and alert events are append-only.

use chrono::NaiveDateTime;
use hazard_fence_database_models::{AlertEventRow, FenceRow};
use hazard_fence_geofence_models::{
    Fence, FenceCategory, FenceGeometry, GeometryError, Trail, TrailEvent,
};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue};

use crate::DbError;

/// Inserts a new fence after validating its geometry.
///
/// The fence starts inactive; only an activation pass can flip the flag.
///
/// # Errors
///
/// Returns [`DbError::Conversion`] for malformed geometry (the fence is
/// not created) and [`DbError::Database`] if the insert fails.
pub async fn insert_fence(
    db: &dyn Database,
    name: &str,
    category: FenceCategory,
    geometry: &FenceGeometry,
) -> Result<FenceRow, DbError> {
    geometry
        .validate()
        .map_err(|e: GeometryError| DbError::Conversion {
            message: format!("invalid fence geometry: {e}"),
        })?;

    let geometry_json = serde_json::to_string(geometry).map_err(|e| DbError::Conversion {
        message: format!("failed to encode fence geometry: {e}"),
    })?;

    let rows = db
        .query_raw_params(
            "INSERT INTO fences (name, category, geometry, is_active)
             VALUES ($1, $2, $3, FALSE)
             RETURNING id, name, category, geometry, is_active, created_at",
            &[
                DatabaseValue::String(name.to_string()),
                DatabaseValue::String(category.as_ref().to_string()),
                DatabaseValue::String(geometry_json),
            ],
        )
        .await?;

    let row = rows.first().ok_or_else(|| DbError::Conversion {
        message: "Failed to get fence row from insert".to_string(),
    })?;

    decode_fence_row(row)
}

/// Lists every fence in the registry, oldest first.
///
/// # Errors
///
/// Returns [`DbError`] if the query or row decoding fails.
pub async fn list_fences(db: &dyn Database) -> Result<Vec<Fence>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT id, name, category, geometry, is_active, created_at
             FROM fences ORDER BY id",
            &[],
        )
        .await?;

    rows.iter()
        .map(|row| decode_fence_row(row).map(Fence::from))
        .collect()
}

/// Fetches one fence by ID.
///
/// # Errors
///
/// Returns [`DbError`] if the query or row decoding fails.
pub async fn get_fence(db: &dyn Database, fence_id: i64) -> Result<Option<Fence>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT id, name, category, geometry, is_active, created_at
             FROM fences WHERE id = $1",
            &[DatabaseValue::Int64(fence_id)],
        )
        .await?;

    rows.first()
        .map(|row| decode_fence_row(row).map(Fence::from))
        .transpose()
}

/// Deletes a fence on explicit user request. Returns whether a row was
/// removed.
///
/// # Errors
///
/// Returns [`DbError`] if the delete fails.
pub async fn delete_fence(db: &dyn Database, fence_id: i64) -> Result<bool, DbError> {
    let rows = db
        .query_raw_params(
            "DELETE FROM fences WHERE id = $1 RETURNING id",
            &[DatabaseValue::Int64(fence_id)],
        )
        .await?;

    Ok(!rows.is_empty())
}

/// The registry's update contract: a partial update of one fence's
/// `is_active` flag, independent of every other fence.
///
/// # Errors
///
/// Returns [`DbError`] if the update fails.
pub async fn set_fence_active(
    db: &dyn Database,
    fence_id: i64,
    is_active: bool,
) -> Result<(), DbError> {
    db.exec_raw_params(
        "UPDATE fences SET is_active = $1 WHERE id = $2",
        &[
            DatabaseValue::Bool(is_active),
            DatabaseValue::Int64(fence_id),
        ],
    )
    .await?;

    Ok(())
}

/// Persists a finished tracking session as one record (insert only).
///
/// # Errors
///
/// Returns [`DbError`] if encoding or the insert fails.
pub async fn insert_trail_session(db: &dyn Database, trail: &Trail) -> Result<i64, DbError> {
    let points_json = serde_json::to_string(&trail.points).map_err(|e| DbError::Conversion {
        message: format!("failed to encode trail points: {e}"),
    })?;

    let rows = db
        .query_raw_params(
            "INSERT INTO trail_sessions (user_id, started_at, ended_at, points)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
            &[
                DatabaseValue::String(trail.user_id.clone()),
                DatabaseValue::DateTime(trail.started_at.naive_utc()),
                DatabaseValue::DateTime(trail.ended_at.naive_utc()),
                DatabaseValue::String(points_json),
            ],
        )
        .await?;

    let row = rows.first().ok_or_else(|| DbError::Conversion {
        message: "Failed to get trail session id from insert".to_string(),
    })?;

    row.to_value("id").map_err(|e| DbError::Conversion {
        message: format!("Failed to parse trail session id: {e}"),
    })
}

/// Appends one alert event to the log (insert only).
///
/// # Errors
///
/// Returns [`DbError`] if the insert fails.
pub async fn insert_alert_event(db: &dyn Database, event: &TrailEvent) -> Result<i64, DbError> {
    let rows = db
        .query_raw_params(
            "INSERT INTO alert_events (user_id, fence_id, fence_name, occurred_at)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
            &[
                DatabaseValue::String(event.user_id.clone()),
                DatabaseValue::Int64(event.fence_id),
                DatabaseValue::String(event.fence_name.clone()),
                DatabaseValue::DateTime(event.occurred_at.naive_utc()),
            ],
        )
        .await?;

    let row = rows.first().ok_or_else(|| DbError::Conversion {
        message: "Failed to get alert event id from insert".to_string(),
    })?;

    row.to_value("id").map_err(|e| DbError::Conversion {
        message: format!("Failed to parse alert event id: {e}"),
    })
}

/// Lists the most recent alert events.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn list_alert_events(db: &dyn Database, limit: u32) -> Result<Vec<AlertEventRow>, DbError> {
    let rows = db
        .query_raw_params(
            &format!(
                "SELECT id, user_id, fence_id, fence_name, occurred_at
                 FROM alert_events ORDER BY occurred_at DESC LIMIT {limit}"
            ),
            &[],
        )
        .await?;

    let mut events = Vec::with_capacity(rows.len());
    for row in &rows {
        let occurred_at_naive: NaiveDateTime = row.to_value("occurred_at").unwrap_or_default();
        events.push(AlertEventRow {
            id: row.to_value("id").unwrap_or(0),
            user_id: row.to_value("user_id").unwrap_or_default(),
            fence_id: row.to_value("fence_id").unwrap_or(None),
            fence_name: row.to_value("fence_name").unwrap_or(None),
            occurred_at: chrono::DateTime::from_naive_utc_and_offset(
                occurred_at_naive,
                chrono::Utc,
            ),
        });
    }

    Ok(events)
}

/// Decodes a fence row, parsing the JSON geometry column.
fn decode_fence_row(row: &switchy_database::Row) -> Result<FenceRow, DbError> {
    let geometry_json: String = row.to_value("geometry").map_err(|e| DbError::Conversion {
        message: format!("Failed to read fence geometry: {e}"),
    })?;

    let geometry: FenceGeometry =
        serde_json::from_str(&geometry_json).map_err(|e| DbError::Conversion {
            message: format!("Failed to decode fence geometry: {e}"),
        })?;

    let category_name: String = row.to_value("category").unwrap_or_default();
    let category = category_name
        .parse::<FenceCategory>()
        .unwrap_or(FenceCategory::Other);

    let created_at_naive: NaiveDateTime = row.to_value("created_at").unwrap_or_default();

    Ok(FenceRow {
        id: row.to_value("id").unwrap_or(0),
        name: row.to_value("name").unwrap_or_default(),
        category,
        geometry,
        is_active: row.to_value("is_active").unwrap_or(false),
        created_at: chrono::DateTime::from_naive_utc_and_offset(created_at_naive, chrono::Utc),
    })
}

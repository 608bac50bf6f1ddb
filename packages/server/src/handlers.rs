//! HTTP handler functions for the hazard fence API.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use hazard_fence_database::queries;
use hazard_fence_geofence::convert;
use hazard_fence_geofence_models::{FenceCategory, Trail, TrailEvent};
use hazard_fence_notify::AlertMessage;
use hazard_fence_server_models::{
    AlertEventQueryParams, AlertEventRequest, ApiFence, ApiHealth, CreateFenceRequest,
    SaveTrailRequest,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/fences`
///
/// Lists every fence with its render color and activation flag.
pub async fn list_fences(state: web::Data<AppState>) -> HttpResponse {
    match queries::list_fences(state.db.as_ref()).await {
        Ok(fences) => {
            let api_fences: Vec<ApiFence> = fences.into_iter().map(ApiFence::from).collect();
            HttpResponse::Ok().json(api_fences)
        }
        Err(e) => {
            log::error!("Failed to list fences: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to list fences"
            }))
        }
    }
}

/// `POST /api/fences`
///
/// Creates a fence from a drawn GeoJSON shape. The category (and so the
/// map color) is derived from the fence name. Malformed shapes are
/// rejected with a 400 and nothing is stored.
pub async fn create_fence(
    state: web::Data<AppState>,
    body: web::Json<CreateFenceRequest>,
) -> HttpResponse {
    let feature: geojson::Feature = match serde_json::from_value(body.feature.clone()) {
        Ok(feature) => feature,
        Err(e) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": format!("Invalid GeoJSON feature: {e}")
            }));
        }
    };

    let geometry = match convert::geometry_from_feature(&feature) {
        Ok(geometry) => geometry,
        Err(e) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": format!("Unsupported fence shape: {e}")
            }));
        }
    };

    if let Err(e) = geometry.validate() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": format!("Invalid fence geometry: {e}")
        }));
    }

    let category = FenceCategory::from_fence_name(&body.name);

    match queries::insert_fence(state.db.as_ref(), &body.name, category, &geometry).await {
        Ok(row) => {
            log::info!("Created fence {} ({})", row.id, row.name);
            HttpResponse::Created().json(ApiFence::from(row))
        }
        Err(e) => {
            log::error!("Failed to create fence: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to create fence"
            }))
        }
    }
}

/// `DELETE /api/fences/{id}`
pub async fn delete_fence(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let fence_id = path.into_inner();

    match queries::delete_fence(state.db.as_ref(), fence_id).await {
        Ok(true) => HttpResponse::NoContent().finish(),
        Ok(false) => HttpResponse::NotFound().json(serde_json::json!({
            "error": format!("No fence with id {fence_id}")
        })),
        Err(e) => {
            log::error!("Failed to delete fence {fence_id}: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to delete fence"
            }))
        }
    }
}

/// `POST /api/tracking`
///
/// Persists a finished tracking session as a single record.
pub async fn save_trail(
    state: web::Data<AppState>,
    body: web::Json<SaveTrailRequest>,
) -> HttpResponse {
    let body = body.into_inner();
    let trail = Trail {
        user_id: body.user_id,
        started_at: body.started_at,
        ended_at: body.ended_at,
        points: body.points,
    };

    match queries::insert_trail_session(state.db.as_ref(), &trail).await {
        Ok(id) => {
            log::info!(
                "Saved trail session {id} for {} ({} points)",
                trail.user_id,
                trail.points.len()
            );
            HttpResponse::Created().json(serde_json::json!({ "id": id }))
        }
        Err(e) => {
            log::error!("Failed to save trail session: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to save trail session"
            }))
        }
    }
}

/// `GET /api/alert-events`
pub async fn list_alert_events(
    state: web::Data<AppState>,
    params: web::Query<AlertEventQueryParams>,
) -> HttpResponse {
    let limit = params.limit.unwrap_or(100);

    match queries::list_alert_events(state.db.as_ref(), limit).await {
        Ok(events) => HttpResponse::Ok().json(events),
        Err(e) => {
            log::error!("Failed to list alert events: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to list alert events"
            }))
        }
    }
}

/// `POST /api/alert-events`
///
/// Logs a fence entry reported by a tracking client and forwards it to
/// the alert notifier. Delivery failure does not fail the request; the
/// log row is the source of truth.
pub async fn log_alert_event(
    state: web::Data<AppState>,
    body: web::Json<AlertEventRequest>,
) -> HttpResponse {
    let body = body.into_inner();
    let event = TrailEvent {
        user_id: body.user_id,
        fence_id: body.fence_id,
        fence_name: body.fence_name,
        occurred_at: body.occurred_at.unwrap_or_else(Utc::now),
    };

    let id = match queries::insert_alert_event(state.db.as_ref(), &event).await {
        Ok(id) => id,
        Err(e) => {
            log::error!("Failed to log alert event: {e}");
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to log alert event"
            }));
        }
    };

    let message = AlertMessage::fence_entry(&event.user_id, &event.fence_name);
    if let Err(e) = state.notifier.send_alert(&message).await {
        log::warn!("Failed to deliver alert for event {id}: {e}");
    }

    HttpResponse::Created().json(serde_json::json!({ "id": id }))
}

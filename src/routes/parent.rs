use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::{
    error::AppError,
    middleware::tenant::AcademySlug,
    models::{auth::AuthenticatedUser, availability::SetAvailabilityRequest},
    services::{availability::AvailabilityService, queries::QueryService},
    AppState,
};

/// GET /kids/{kid_id}/sessions
pub async fn kid_sessions(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AcademySlug(academy): AcademySlug,
    Path(kid_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let sessions = QueryService::upcoming_for_child(
        state.availability.as_ref(),
        state.directory.as_ref(),
        &academy,
        &user,
        kid_id,
        Utc::now(),
        state.config.availability_horizon_days,
    )
    .await?;

    Ok(Json(json!({ "success": true, "data": sessions })))
}

/// POST /sessions/{session_id}/availability
pub async fn set_availability(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AcademySlug(academy): AcademySlug,
    Path(session_id): Path<i64>,
    body: Result<Json<SetAvailabilityRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(body) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    // A missing status fails the same way as an unknown one.
    let status = body.status.as_deref().unwrap_or_default();
    let player_id = body
        .player_id
        .ok_or_else(|| AppError::BadRequest("playerId is required".into()))?;

    let record = AvailabilityService::set_availability(
        state.availability.as_ref(),
        state.directory.as_ref(),
        &academy,
        user.user_id,
        session_id,
        player_id,
        status,
        body.comment.as_deref(),
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Availability updated successfully",
        "data": { "status": record.status, "comment": record.comment },
    })))
}

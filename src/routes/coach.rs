use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::{
    error::AppError,
    middleware::tenant::AcademySlug,
    models::{auth::AuthenticatedUser, session::CreateSessionRequest},
    services::{queries::QueryService, sessions::SessionService},
    AppState,
};

/// GET /sessions/{session_id}/availability
///
/// Counts for everyone; the per-player list only for coaches and admins.
pub async fn session_availability(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AcademySlug(academy): AcademySlug,
    Path(session_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let summary = QueryService::counts_for_session(
        state.availability.as_ref(),
        state.directory.as_ref(),
        &academy,
        &user,
        session_id,
    )
    .await?;

    Ok(Json(json!({ "success": true, "data": summary })))
}

/// GET /coach/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AcademySlug(academy): AcademySlug,
) -> Result<Json<Value>, AppError> {
    let sessions = QueryService::coach_overview(
        state.availability.as_ref(),
        state.directory.as_ref(),
        &academy,
        &user,
        Utc::now(),
    )
    .await?;

    Ok(Json(json!({ "success": true, "data": sessions })))
}

/// POST /coach/sessions
pub async fn create_session(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    AcademySlug(academy): AcademySlug,
    body: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(body) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let session = SessionService::create(state.directory.as_ref(), &academy, &user, body).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Session created successfully",
            "data": session,
        })),
    ))
}

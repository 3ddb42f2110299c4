use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use tracing::info;

use crate::{
    error::AppError,
    middleware::capability::Capability,
    models::{
        auth::AuthenticatedUser,
        session::{CreateSessionRequest, NewSession, Session},
    },
    services::metrics::SESSIONS_CREATED_COUNTER,
    store::AcademyDirectory,
};

pub const DEFAULT_DURATION_MINUTES: i64 = 90;
pub const MIN_DURATION_MINUTES: i64 = 30;
pub const MAX_DURATION_MINUTES: i64 = 240;
const DEFAULT_SESSION_TYPE: &str = "training";

pub struct SessionService;

impl SessionService {
    pub async fn create(
        directory: &dyn AcademyDirectory,
        academy: &str,
        creator: &AuthenticatedUser,
        req: CreateSessionRequest,
    ) -> Result<Session, AppError> {
        creator.require(Capability::ManageSessions)?;

        let new = build_new_session(req, creator.user_id)?;
        let session = directory.create_session(academy, &new).await?;

        SESSIONS_CREATED_COUNTER.with_label_values(&[academy]).inc();
        info!(
            academy,
            session_id = session.id,
            coach_id = session.coach_id,
            age_group = %session.age_group,
            "session created"
        );

        Ok(session)
    }
}

/// Turn the request body into a row, with the creator as coach.
///
/// An explicit `endTime` wins over `durationMinutes`, but a supplied
/// `durationMinutes` must still be in range.
pub fn build_new_session(req: CreateSessionRequest, coach_id: i64) -> Result<NewSession, AppError> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("title is required".into()));
    }

    let date = NaiveDate::parse_from_str(req.date.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("date must be YYYY-MM-DD".into()))?;
    let start_time = at(date, &req.start_time, "startTime")?;

    let minutes = req.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
    if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&minutes) {
        return Err(AppError::BadRequest(format!(
            "durationMinutes must be between {MIN_DURATION_MINUTES} and {MAX_DURATION_MINUTES}"
        )));
    }

    let end_time = match req.end_time.as_deref() {
        Some(end) => at(date, end, "endTime")?,
        None => start_time + Duration::minutes(minutes),
    };

    if end_time <= start_time {
        return Err(AppError::BadRequest("End time must be after start time".into()));
    }

    if let Some(max) = req.max_players {
        if max < 1 {
            return Err(AppError::BadRequest("maxPlayers must be positive".into()));
        }
    }

    Ok(NewSession {
        title: title.to_string(),
        description: req
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        session_type: req
            .session_type
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION_TYPE.to_string()),
        age_group: req.age_group,
        location: req.location,
        start_time,
        end_time,
        coach_id,
        max_players: req.max_players,
    })
}

fn at(date: NaiveDate, time: &str, field: &str) -> Result<DateTime<Utc>, AppError> {
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .map_err(|_| AppError::BadRequest(format!("{field} must be HH:MM")))?;
    Ok(date.and_time(time).and_utc())
}

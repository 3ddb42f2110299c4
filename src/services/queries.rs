use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Duration, Utc};

use crate::{
    error::AppError,
    middleware::capability::Capability,
    models::{
        auth::AuthenticatedUser,
        availability::{SessionAvailabilitySummary, SessionWithAvailability, SessionWithCounts},
        session::{Session, UpcomingFilter},
    },
    store::{AcademyDirectory, AvailabilityStore},
};

/// At most this many sessions are shown on a child's schedule.
pub const UPCOMING_LIMIT: i64 = 20;
/// At most this many sessions are shown on the coach overview.
pub const COACH_OVERVIEW_LIMIT: i64 = 50;
pub const DEFAULT_HORIZON_DAYS: i64 = 28;

const UNKNOWN_COACH: &str = "Unknown";

pub struct QueryService;

impl QueryService {
    /// Upcoming sessions for the child's age group, each annotated with the
    /// child's own answer. Coach names and answers are fetched in one batch
    /// each, independent of how many sessions are returned.
    pub async fn upcoming_for_child(
        store: &dyn AvailabilityStore,
        directory: &dyn AcademyDirectory,
        academy: &str,
        viewer: &AuthenticatedUser,
        player_id: i64,
        now: DateTime<Utc>,
        horizon_days: i64,
    ) -> Result<Vec<SessionWithAvailability>, AppError> {
        let player = directory.find_player(academy, player_id).await?;
        let player = match player {
            Some(p) if p.parent_id == viewer.user_id || viewer.can(Capability::ViewAnyPlayer) => p,
            // Staff learn that the id is unknown; parents cannot probe other families.
            None if viewer.can(Capability::ViewAnyPlayer) => {
                return Err(AppError::NotFound("Player not found".into()))
            }
            _ => {
                return Err(AppError::Forbidden(
                    "You don't have permission to view this kid's sessions".into(),
                ))
            }
        };

        let filter = UpcomingFilter {
            age_group: Some(player.age_group),
            from: now,
            until: Some(now + Duration::days(horizon_days)),
            limit: UPCOMING_LIMIT,
        };
        let sessions = directory.upcoming_sessions(academy, &filter).await?;
        if sessions.is_empty() {
            return Ok(Vec::new());
        }

        let coach_names = directory.coach_names(academy, &coach_ids(&sessions)).await?;
        let session_ids: Vec<i64> = sessions.iter().map(|s| s.id).collect();
        let statuses: HashMap<i64, _> = store
            .list_for_sessions(academy, &session_ids, player.id)
            .await?
            .into_iter()
            .map(|r| (r.session_id, r.status))
            .collect();

        Ok(sessions
            .into_iter()
            .map(|s| {
                let coach = coach_name(&coach_names, s.coach_id);
                let status = statuses.get(&s.id).copied();
                SessionWithAvailability::new(s, coach, status)
            })
            .collect())
    }

    /// Aggregate answers for a session. Staff also get the per-player list.
    pub async fn counts_for_session(
        store: &dyn AvailabilityStore,
        directory: &dyn AcademyDirectory,
        academy: &str,
        viewer: &AuthenticatedUser,
        session_id: i64,
    ) -> Result<SessionAvailabilitySummary, AppError> {
        directory
            .find_session(academy, session_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Session not found".into()))?;

        let counts = store.aggregate_counts(academy, session_id).await?;
        let players = if viewer.can(Capability::ViewAvailabilityBreakdown) {
            Some(store.breakdown(academy, session_id).await?)
        } else {
            None
        };

        Ok(SessionAvailabilitySummary { session_id, counts, players })
    }

    /// Every upcoming session in the academy with its answer counts.
    pub async fn coach_overview(
        store: &dyn AvailabilityStore,
        directory: &dyn AcademyDirectory,
        academy: &str,
        viewer: &AuthenticatedUser,
        now: DateTime<Utc>,
    ) -> Result<Vec<SessionWithCounts>, AppError> {
        viewer.require(Capability::ManageSessions)?;

        let filter = UpcomingFilter { age_group: None, from: now, until: None, limit: COACH_OVERVIEW_LIMIT };
        let sessions = directory.upcoming_sessions(academy, &filter).await?;
        if sessions.is_empty() {
            return Ok(Vec::new());
        }

        let coach_names = directory.coach_names(academy, &coach_ids(&sessions)).await?;
        let session_ids: Vec<i64> = sessions.iter().map(|s| s.id).collect();
        let mut counts = store.aggregate_counts_for_sessions(academy, &session_ids).await?;

        Ok(sessions
            .into_iter()
            .map(|s| SessionWithCounts {
                coach_name: coach_name(&coach_names, s.coach_id),
                counts: counts.remove(&s.id).unwrap_or_default(),
                session: s,
            })
            .collect())
    }
}

fn coach_ids(sessions: &[Session]) -> Vec<i64> {
    sessions
        .iter()
        .map(|s| s.coach_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn coach_name(names: &HashMap<i64, String>, coach_id: i64) -> String {
    names
        .get(&coach_id)
        .cloned()
        .unwrap_or_else(|| UNKNOWN_COACH.to_string())
}

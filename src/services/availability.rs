use tracing::{info, warn};

use crate::{
    error::AppError,
    models::availability::{AvailabilityRecord, AvailabilityStatus, STATUS_VALUES},
    services::{
        guard::{self, GuardError},
        metrics::{AVAILABILITY_DENIED_COUNTER, AVAILABILITY_UPDATES_COUNTER},
    },
    store::{AcademyDirectory, AvailabilityStore},
};

const MAX_COMMENT_LEN: usize = 500;

pub struct AvailabilityService;

impl AvailabilityService {
    /// Parse a status in either the canonical or the legacy `yes/no/maybe` vocabulary.
    pub fn parse_status(raw: &str) -> Result<AvailabilityStatus, AppError> {
        raw.parse().map_err(|_| {
            AppError::InvalidStatus(format!(
                "Invalid status value. Must be one of: {}",
                STATUS_VALUES.join(", ")
            ))
        })
    }

    /// Record a parent's answer for one of their children.
    ///
    /// Validation and the guard run before any write. The write itself is a
    /// single upsert, so concurrent calls for the same key never race into a
    /// duplicate-key error and the last one applied wins.
    #[allow(clippy::too_many_arguments)]
    pub async fn set_availability(
        store: &dyn AvailabilityStore,
        directory: &dyn AcademyDirectory,
        academy: &str,
        requesting_user_id: i64,
        session_id: i64,
        player_id: i64,
        status: &str,
        comment: Option<&str>,
    ) -> Result<AvailabilityRecord, AppError> {
        let status = Self::parse_status(status)?;
        let comment = normalize_comment(comment)?;

        if let Err(err) = guard::authorize(directory, academy, requesting_user_id, player_id, session_id).await {
            if let GuardError::Denied(denied) = &err {
                warn!(
                    academy,
                    user_id = requesting_user_id,
                    player_id,
                    session_id,
                    reason = denied.reason(),
                    "availability write denied"
                );
                AVAILABILITY_DENIED_COUNTER
                    .with_label_values(&[academy, denied.reason()])
                    .inc();
            }
            return Err(err.into());
        }

        let record = store
            .upsert(academy, session_id, player_id, status, comment.as_deref())
            .await?;

        AVAILABILITY_UPDATES_COUNTER
            .with_label_values(&[academy, status.as_str()])
            .inc();
        info!(
            academy,
            user_id = requesting_user_id,
            player_id,
            session_id,
            status = status.as_str(),
            "availability recorded"
        );

        Ok(record)
    }
}

fn normalize_comment(comment: Option<&str>) -> Result<Option<String>, AppError> {
    match comment.map(str::trim).filter(|c| !c.is_empty()) {
        Some(c) if c.chars().count() > MAX_COMMENT_LEN => Err(AppError::BadRequest(format!(
            "comment must be at most {MAX_COMMENT_LEN} characters"
        ))),
        other => Ok(other.map(str::to_string)),
    }
}

//! Persistence seams for the availability subsystem.
//!
//! Every call takes the academy slug explicitly; there is no ambient tenant.

pub mod memory;
pub mod postgres;

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    availability::{AvailabilityCounts, AvailabilityRecord, AvailabilityStatus, PlayerAvailability},
    player::Player,
    session::{NewSession, Session, UpcomingFilter},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a record already exists for this session and player")]
    ConstraintViolation,

    #[error("record not found")]
    NotFound,

    #[error(transparent)]
    Unavailable(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::ConstraintViolation,
            _ => StoreError::Unavailable(err.into()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One logical record per (session, player).
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    async fn find(
        &self,
        academy: &str,
        session_id: i64,
        player_id: i64,
    ) -> StoreResult<Option<AvailabilityRecord>>;

    /// Fails with `ConstraintViolation` if the key already exists.
    async fn insert(
        &self,
        academy: &str,
        session_id: i64,
        player_id: i64,
        status: AvailabilityStatus,
        comment: Option<&str>,
    ) -> StoreResult<AvailabilityRecord>;

    /// Fails with `NotFound` if `record_id` does not exist.
    async fn update(
        &self,
        academy: &str,
        record_id: i64,
        status: AvailabilityStatus,
        comment: Option<&str>,
    ) -> StoreResult<AvailabilityRecord>;

    /// Atomic insert-or-update keyed on (session, player).
    async fn upsert(
        &self,
        academy: &str,
        session_id: i64,
        player_id: i64,
        status: AvailabilityStatus,
        comment: Option<&str>,
    ) -> StoreResult<AvailabilityRecord>;

    async fn list_for_sessions(
        &self,
        academy: &str,
        session_ids: &[i64],
        player_id: i64,
    ) -> StoreResult<Vec<AvailabilityRecord>>;

    async fn aggregate_counts(&self, academy: &str, session_id: i64) -> StoreResult<AvailabilityCounts>;

    /// Sessions without any answer are absent from the map.
    async fn aggregate_counts_for_sessions(
        &self,
        academy: &str,
        session_ids: &[i64],
    ) -> StoreResult<HashMap<i64, AvailabilityCounts>>;

    async fn breakdown(&self, academy: &str, session_id: i64) -> StoreResult<Vec<PlayerAvailability>>;
}

/// Read access to the records the availability subsystem depends on but
/// does not own: academies, players, sessions and coach names.
#[async_trait]
pub trait AcademyDirectory: Send + Sync {
    /// `None` if the academy is unknown, otherwise whether it is active.
    async fn academy_status(&self, slug: &str) -> StoreResult<Option<bool>>;

    async fn find_player(&self, academy: &str, player_id: i64) -> StoreResult<Option<Player>>;

    async fn find_session(&self, academy: &str, session_id: i64) -> StoreResult<Option<Session>>;

    /// Ordered by start time ascending.
    async fn upcoming_sessions(&self, academy: &str, filter: &UpcomingFilter) -> StoreResult<Vec<Session>>;

    async fn coach_names(&self, academy: &str, coach_ids: &[i64]) -> StoreResult<HashMap<i64, String>>;

    async fn create_session(&self, academy: &str, new: &NewSession) -> StoreResult<Session>;

    async fn ping(&self) -> StoreResult<()>;
}

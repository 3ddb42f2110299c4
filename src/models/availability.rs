use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::session::{AgeGroup, Location, Session};

/// A parent's answer for one child and one session.
///
/// `yes`/`no`/`maybe` are accepted on input and always emitted in the
/// canonical spelling.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityStatus {
    #[serde(alias = "maybe")]
    Pending,
    #[serde(alias = "yes")]
    Confirmed,
    #[serde(alias = "no")]
    Declined,
}

pub const STATUS_VALUES: &[&str] = &["pending", "confirmed", "declined"];

impl AvailabilityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AvailabilityStatus::Pending => "pending",
            AvailabilityStatus::Confirmed => "confirmed",
            AvailabilityStatus::Declined => "declined",
        }
    }
}

impl std::fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AvailabilityStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "maybe" => Ok(AvailabilityStatus::Pending),
            "confirmed" | "yes" => Ok(AvailabilityStatus::Confirmed),
            "declined" | "no" => Ok(AvailabilityStatus::Declined),
            other => Err(anyhow::anyhow!("Unknown availability status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRecord {
    pub id: i64,
    pub session_id: i64,
    pub player_id: i64,
    pub status: AvailabilityStatus,
    pub comment: Option<String>,
    pub responded_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityCounts {
    pub confirmed_count: i64,
    pub declined_count: i64,
    pub pending_count: i64,
}

impl AvailabilityCounts {
    pub fn add(&mut self, status: AvailabilityStatus, n: i64) {
        match status {
            AvailabilityStatus::Confirmed => self.confirmed_count += n,
            AvailabilityStatus::Declined => self.declined_count += n,
            AvailabilityStatus::Pending => self.pending_count += n,
        }
    }
}

/// One row of the coach/admin breakdown.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerAvailability {
    pub player_id: i64,
    pub player_name: String,
    pub status: AvailabilityStatus,
    pub comment: Option<String>,
    pub responded_at: DateTime<Utc>,
}

/// Body for POST /sessions/{session_id}/availability.
///
/// Fields stay loose so that missing or unknown values become 400s with a
/// readable message instead of a deserializer rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAvailabilityRequest {
    pub player_id: Option<i64>,
    pub status: Option<String>,
    pub comment: Option<String>,
}

/// Upcoming session annotated with the child's own answer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionWithAvailability {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub session_type: String,
    pub age_group: AgeGroup,
    pub location: Location,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub coach_id: i64,
    pub coach_name: String,
    pub availability_status: Option<AvailabilityStatus>,
}

impl SessionWithAvailability {
    pub fn new(
        session: Session,
        coach_name: String,
        availability_status: Option<AvailabilityStatus>,
    ) -> Self {
        Self {
            id: session.id,
            title: session.title,
            description: session.description,
            session_type: session.session_type,
            age_group: session.age_group,
            location: session.location,
            start_time: session.start_time,
            end_time: session.end_time,
            coach_id: session.coach_id,
            coach_name,
            availability_status,
        }
    }
}

/// Upcoming session with aggregate answers, for the coach overview.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionWithCounts {
    #[serde(flatten)]
    pub session: Session,
    pub coach_name: String,
    #[serde(flatten)]
    pub counts: AvailabilityCounts,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAvailabilitySummary {
    pub session_id: i64,
    #[serde(flatten)]
    pub counts: AvailabilityCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub players: Option<Vec<PlayerAvailability>>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The academy trains two fixed age groups.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AgeGroup {
    #[serde(rename = "5-8 years")]
    FiveToEight,
    #[serde(rename = "8+ years")]
    EightPlus,
}

impl AgeGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::FiveToEight => "5-8 years",
            AgeGroup::EightPlus => "8+ years",
        }
    }
}

impl std::fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AgeGroup {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "5-8 years" => Ok(AgeGroup::FiveToEight),
            "8+ years" => Ok(AgeGroup::EightPlus),
            _ => Err(anyhow::anyhow!("Unknown age group: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Location {
    Strongsville,
    Solon,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Strongsville => "Strongsville",
            Location::Solon => "Solon",
        }
    }
}

impl std::str::FromStr for Location {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Strongsville" => Ok(Location::Strongsville),
            "Solon" => Ok(Location::Solon),
            _ => Err(anyhow::anyhow!("Unknown location: {s}")),
        }
    }
}

/// A scheduled training session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub session_type: String,
    pub age_group: AgeGroup,
    pub location: Location,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub coach_id: i64,
    pub max_players: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for inserting a session row.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub title: String,
    pub description: Option<String>,
    pub session_type: String,
    pub age_group: AgeGroup,
    pub location: Location,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub coach_id: i64,
    pub max_players: Option<i32>,
}

/// Body for POST /coach/sessions.
///
/// `date` is `YYYY-MM-DD`, `startTime`/`endTime` are `HH:MM` (UTC).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub title: String,
    pub date: String,
    pub start_time: String,
    pub duration_minutes: Option<i64>,
    pub end_time: Option<String>,
    pub location: Location,
    pub age_group: AgeGroup,
    pub session_type: Option<String>,
    pub description: Option<String>,
    pub max_players: Option<i32>,
}

/// Filter for the upcoming-sessions lookup.
#[derive(Debug, Clone)]
pub struct UpcomingFilter {
    pub age_group: Option<AgeGroup>,
    pub from: DateTime<Utc>,
    pub until: Option<DateTime<Utc>>,
    pub limit: i64,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::session::AgeGroup;

/// A child enrolled at the academy. Owned by exactly one parent account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub parent_id: i64,
    pub age_group: AgeGroup,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Player {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlayer {
    pub first_name: String,
    pub last_name: String,
    pub parent_id: i64,
    pub age_group: AgeGroup,
}

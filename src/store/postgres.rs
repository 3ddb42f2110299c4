use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use super::{AcademyDirectory, AvailabilityStore, StoreError, StoreResult};
use crate::{
    db::tenant::schema_name,
    models::{
        availability::{AvailabilityCounts, AvailabilityRecord, AvailabilityStatus, PlayerAvailability},
        player::Player,
        session::{NewSession, Session, UpcomingFilter},
    },
};

const AVAILABILITY_COLUMNS: &str =
    "id, session_id, player_id, status, comment, responded_at, created_at, updated_at";

const SESSION_COLUMNS: &str = "id, title, description, session_type, age_group, location, \
     start_time, end_time, coach_id, max_players, created_at, updated_at";

/// PostgreSQL-backed store. Enum columns are TEXT and parsed on the way out.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct AvailabilityRow {
    id: i64,
    session_id: i64,
    player_id: i64,
    status: String,
    comment: Option<String>,
    responded_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AvailabilityRow> for AvailabilityRecord {
    type Error = StoreError;

    fn try_from(r: AvailabilityRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            session_id: r.session_id,
            player_id: r.player_id,
            status: r.status.parse()?,
            comment: r.comment,
            responded_at: r.responded_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(FromRow)]
struct PlayerRow {
    id: i64,
    first_name: String,
    last_name: String,
    parent_id: i64,
    age_group: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PlayerRow> for Player {
    type Error = StoreError;

    fn try_from(r: PlayerRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            first_name: r.first_name,
            last_name: r.last_name,
            parent_id: r.parent_id,
            age_group: r.age_group.parse()?,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(FromRow)]
struct SessionRow {
    id: i64,
    title: String,
    description: Option<String>,
    session_type: String,
    age_group: String,
    location: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    coach_id: i64,
    max_players: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SessionRow> for Session {
    type Error = StoreError;

    fn try_from(r: SessionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            title: r.title,
            description: r.description,
            session_type: r.session_type,
            age_group: r.age_group.parse()?,
            location: r.location.parse()?,
            start_time: r.start_time,
            end_time: r.end_time,
            coach_id: r.coach_id,
            max_players: r.max_players,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(FromRow)]
struct BreakdownRow {
    player_id: i64,
    first_name: String,
    last_name: String,
    status: String,
    comment: Option<String>,
    responded_at: DateTime<Utc>,
}

fn collect<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[async_trait]
impl AvailabilityStore for PgStore {
    async fn find(
        &self,
        academy: &str,
        session_id: i64,
        player_id: i64,
    ) -> StoreResult<Option<AvailabilityRecord>> {
        let schema = schema_name(academy);
        let row = sqlx::query_as::<_, AvailabilityRow>(&format!(
            r#"SELECT {AVAILABILITY_COLUMNS} FROM "{schema}".session_availability
               WHERE session_id = $1 AND player_id = $2"#
        ))
        .bind(session_id)
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(AvailabilityRecord::try_from).transpose()
    }

    async fn insert(
        &self,
        academy: &str,
        session_id: i64,
        player_id: i64,
        status: AvailabilityStatus,
        comment: Option<&str>,
    ) -> StoreResult<AvailabilityRecord> {
        let schema = schema_name(academy);
        let row = sqlx::query_as::<_, AvailabilityRow>(&format!(
            r#"INSERT INTO "{schema}".session_availability
                   (session_id, player_id, status, comment, responded_at)
               VALUES ($1, $2, $3, $4, NOW())
               RETURNING {AVAILABILITY_COLUMNS}"#
        ))
        .bind(session_id)
        .bind(player_id)
        .bind(status.as_str())
        .bind(comment)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn update(
        &self,
        academy: &str,
        record_id: i64,
        status: AvailabilityStatus,
        comment: Option<&str>,
    ) -> StoreResult<AvailabilityRecord> {
        let schema = schema_name(academy);
        // fetch_one on an empty RETURNING set yields RowNotFound -> StoreError::NotFound
        let row = sqlx::query_as::<_, AvailabilityRow>(&format!(
            r#"UPDATE "{schema}".session_availability
               SET status       = $1,
                   comment      = $2,
                   responded_at = NOW(),
                   updated_at   = GREATEST(updated_at, NOW())
               WHERE id = $3
               RETURNING {AVAILABILITY_COLUMNS}"#
        ))
        .bind(status.as_str())
        .bind(comment)
        .bind(record_id)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn upsert(
        &self,
        academy: &str,
        session_id: i64,
        player_id: i64,
        status: AvailabilityStatus,
        comment: Option<&str>,
    ) -> StoreResult<AvailabilityRecord> {
        let schema = schema_name(academy);
        let row = sqlx::query_as::<_, AvailabilityRow>(&format!(
            r#"INSERT INTO "{schema}".session_availability AS sa
                   (session_id, player_id, status, comment, responded_at)
               VALUES ($1, $2, $3, $4, NOW())
               ON CONFLICT (session_id, player_id) DO UPDATE SET
                   status       = EXCLUDED.status,
                   comment      = EXCLUDED.comment,
                   responded_at = GREATEST(sa.responded_at, NOW()),
                   updated_at   = GREATEST(sa.updated_at, NOW())
               RETURNING {AVAILABILITY_COLUMNS}"#
        ))
        .bind(session_id)
        .bind(player_id)
        .bind(status.as_str())
        .bind(comment)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn list_for_sessions(
        &self,
        academy: &str,
        session_ids: &[i64],
        player_id: i64,
    ) -> StoreResult<Vec<AvailabilityRecord>> {
        if session_ids.is_empty() {
            return Ok(Vec::new());
        }
        let schema = schema_name(academy);
        let rows = sqlx::query_as::<_, AvailabilityRow>(&format!(
            r#"SELECT {AVAILABILITY_COLUMNS} FROM "{schema}".session_availability
               WHERE session_id = ANY($1) AND player_id = $2"#
        ))
        .bind(session_ids)
        .bind(player_id)
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn aggregate_counts(&self, academy: &str, session_id: i64) -> StoreResult<AvailabilityCounts> {
        let mut by_session = self.aggregate_counts_for_sessions(academy, &[session_id]).await?;
        Ok(by_session.remove(&session_id).unwrap_or_default())
    }

    async fn aggregate_counts_for_sessions(
        &self,
        academy: &str,
        session_ids: &[i64],
    ) -> StoreResult<HashMap<i64, AvailabilityCounts>> {
        if session_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let schema = schema_name(academy);
        let rows: Vec<(i64, String, i64)> = sqlx::query_as(&format!(
            r#"SELECT session_id, status, COUNT(*)
               FROM "{schema}".session_availability
               WHERE session_id = ANY($1)
               GROUP BY session_id, status"#
        ))
        .bind(session_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut out: HashMap<i64, AvailabilityCounts> = HashMap::new();
        for (session_id, status, count) in rows {
            let status: AvailabilityStatus = status.parse()?;
            out.entry(session_id).or_default().add(status, count);
        }
        Ok(out)
    }

    async fn breakdown(&self, academy: &str, session_id: i64) -> StoreResult<Vec<PlayerAvailability>> {
        let schema = schema_name(academy);
        let rows = sqlx::query_as::<_, BreakdownRow>(&format!(
            r#"SELECT sa.player_id, p.first_name, p.last_name, sa.status, sa.comment, sa.responded_at
               FROM "{schema}".session_availability sa
               JOIN "{schema}".players p ON p.id = sa.player_id
               WHERE sa.session_id = $1
               ORDER BY p.last_name, p.first_name"#
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| -> StoreResult<PlayerAvailability> {
                Ok(PlayerAvailability {
                    player_id: r.player_id,
                    player_name: format!("{} {}", r.first_name, r.last_name),
                    status: r.status.parse()?,
                    comment: r.comment,
                    responded_at: r.responded_at,
                })
            })
            .collect()
    }
}

#[async_trait]
impl AcademyDirectory for PgStore {
    async fn academy_status(&self, slug: &str) -> StoreResult<Option<bool>> {
        let active: Option<bool> =
            sqlx::query_scalar("SELECT is_active FROM public.academies WHERE slug = $1")
                .bind(slug)
                .fetch_optional(&self.pool)
                .await?;
        Ok(active)
    }

    async fn find_player(&self, academy: &str, player_id: i64) -> StoreResult<Option<Player>> {
        let schema = schema_name(academy);
        let row = sqlx::query_as::<_, PlayerRow>(&format!(
            r#"SELECT id, first_name, last_name, parent_id, age_group, created_at, updated_at
               FROM "{schema}".players WHERE id = $1"#
        ))
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Player::try_from).transpose()
    }

    async fn find_session(&self, academy: &str, session_id: i64) -> StoreResult<Option<Session>> {
        let schema = schema_name(academy);
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            r#"SELECT {SESSION_COLUMNS} FROM "{schema}".sessions WHERE id = $1"#
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Session::try_from).transpose()
    }

    async fn upcoming_sessions(&self, academy: &str, filter: &UpcomingFilter) -> StoreResult<Vec<Session>> {
        let schema = schema_name(academy);
        let rows = sqlx::query_as::<_, SessionRow>(&format!(
            r#"SELECT {SESSION_COLUMNS} FROM "{schema}".sessions
               WHERE start_time >= $1
                 AND ($2::TIMESTAMPTZ IS NULL OR start_time <= $2)
                 AND ($3::TEXT IS NULL OR age_group = $3)
               ORDER BY start_time
               LIMIT $4"#
        ))
        .bind(filter.from)
        .bind(filter.until)
        .bind(filter.age_group.map(|g| g.as_str()))
        .bind(filter.limit)
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn coach_names(&self, academy: &str, coach_ids: &[i64]) -> StoreResult<HashMap<i64, String>> {
        if coach_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let schema = schema_name(academy);
        let rows: Vec<(i64, String)> = sqlx::query_as(&format!(
            r#"SELECT id, full_name FROM "{schema}".users WHERE id = ANY($1)"#
        ))
        .bind(coach_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().collect())
    }

    async fn create_session(&self, academy: &str, new: &NewSession) -> StoreResult<Session> {
        let schema = schema_name(academy);
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            r#"INSERT INTO "{schema}".sessions
                   (title, description, session_type, age_group, location,
                    start_time, end_time, coach_id, max_players)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING {SESSION_COLUMNS}"#
        ))
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.session_type)
        .bind(new.age_group.as_str())
        .bind(new.location.as_str())
        .bind(new.start_time)
        .bind(new.end_time)
        .bind(new.coach_id)
        .bind(new.max_players)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

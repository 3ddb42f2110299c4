use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::{AcademyDirectory, AvailabilityStore, StoreError, StoreResult};
use crate::models::{
    availability::{AvailabilityCounts, AvailabilityRecord, AvailabilityStatus, PlayerAvailability},
    player::{NewPlayer, Player},
    session::{NewSession, Session, UpcomingFilter},
    user::{User, UserRole},
};

#[derive(Default)]
struct Academy {
    active: bool,
    users: HashMap<i64, User>,
    players: HashMap<i64, Player>,
    sessions: HashMap<i64, Session>,
    availability: HashMap<(i64, i64), AvailabilityRecord>,
}

#[derive(Default)]
struct Inner {
    academies: HashMap<String, Academy>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn academy(&mut self, slug: &str) -> StoreResult<&mut Academy> {
        self.academies
            .get_mut(slug)
            .ok_or_else(|| StoreError::Unavailable(anyhow::anyhow!("schema for academy {slug} does not exist")))
    }
}

/// In-process store with the same observable semantics as `PgStore`.
///
/// A single mutex serializes every operation, which gives the upsert the
/// same atomicity the unique index gives in PostgreSQL.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable(anyhow::anyhow!("memory store lock poisoned")))
    }

    pub fn add_academy(&self, slug: &str, active: bool) -> StoreResult<()> {
        let mut inner = self.lock()?;
        inner
            .academies
            .entry(slug.to_string())
            .or_default()
            .active = active;
        Ok(())
    }

    pub fn add_user(&self, academy: &str, email: &str, full_name: &str, role: UserRole) -> StoreResult<i64> {
        let mut inner = self.lock()?;
        let id = inner.next_id();
        let user = User {
            id,
            email: email.to_string(),
            full_name: full_name.to_string(),
            role,
            created_at: Utc::now(),
        };
        inner.academy(academy)?.users.insert(id, user);
        Ok(id)
    }

    pub fn add_player(&self, academy: &str, new: &NewPlayer) -> StoreResult<i64> {
        let mut inner = self.lock()?;
        let id = inner.next_id();
        let now = Utc::now();
        let player = Player {
            id,
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            parent_id: new.parent_id,
            age_group: new.age_group,
            created_at: now,
            updated_at: now,
        };
        let academy = inner.academy(academy)?;
        if !academy.users.contains_key(&new.parent_id) {
            return Err(StoreError::Unavailable(anyhow::anyhow!("unknown parent {}", new.parent_id)));
        }
        academy.players.insert(id, player);
        Ok(id)
    }

    /// Number of stored availability rows for one (session, player) key.
    pub fn record_count(&self, academy: &str, session_id: i64, player_id: i64) -> StoreResult<usize> {
        let mut inner = self.lock()?;
        let academy = inner.academy(academy)?;
        Ok(academy
            .availability
            .values()
            .filter(|r| r.session_id == session_id && r.player_id == player_id)
            .count())
    }
}

fn check_refs(academy: &Academy, session_id: i64, player_id: i64) -> StoreResult<()> {
    if !academy.sessions.contains_key(&session_id) || !academy.players.contains_key(&player_id) {
        return Err(StoreError::Unavailable(anyhow::anyhow!(
            "foreign key violation for session {session_id} / player {player_id}"
        )));
    }
    Ok(())
}

#[async_trait]
impl AvailabilityStore for MemoryStore {
    async fn find(
        &self,
        academy: &str,
        session_id: i64,
        player_id: i64,
    ) -> StoreResult<Option<AvailabilityRecord>> {
        let mut inner = self.lock()?;
        Ok(inner.academy(academy)?.availability.get(&(session_id, player_id)).cloned())
    }

    async fn insert(
        &self,
        academy: &str,
        session_id: i64,
        player_id: i64,
        status: AvailabilityStatus,
        comment: Option<&str>,
    ) -> StoreResult<AvailabilityRecord> {
        let mut inner = self.lock()?;
        let id = inner.next_id();
        let academy = inner.academy(academy)?;
        check_refs(academy, session_id, player_id)?;
        if academy.availability.contains_key(&(session_id, player_id)) {
            return Err(StoreError::ConstraintViolation);
        }
        let now = Utc::now();
        let record = AvailabilityRecord {
            id,
            session_id,
            player_id,
            status,
            comment: comment.map(str::to_string),
            responded_at: now,
            created_at: now,
            updated_at: now,
        };
        academy.availability.insert((session_id, player_id), record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        academy: &str,
        record_id: i64,
        status: AvailabilityStatus,
        comment: Option<&str>,
    ) -> StoreResult<AvailabilityRecord> {
        let mut inner = self.lock()?;
        let academy = inner.academy(academy)?;
        let record = academy
            .availability
            .values_mut()
            .find(|r| r.id == record_id)
            .ok_or(StoreError::NotFound)?;
        let now = Utc::now();
        record.status = status;
        record.comment = comment.map(str::to_string);
        record.responded_at = now;
        record.updated_at = record.updated_at.max(now);
        Ok(record.clone())
    }

    async fn upsert(
        &self,
        academy: &str,
        session_id: i64,
        player_id: i64,
        status: AvailabilityStatus,
        comment: Option<&str>,
    ) -> StoreResult<AvailabilityRecord> {
        let mut inner = self.lock()?;
        let id = inner.next_id();
        let academy = inner.academy(academy)?;
        check_refs(academy, session_id, player_id)?;
        let now = Utc::now();
        let record = academy
            .availability
            .entry((session_id, player_id))
            .and_modify(|r| {
                r.status = status;
                r.comment = comment.map(str::to_string);
                r.responded_at = r.responded_at.max(now);
                r.updated_at = r.updated_at.max(now);
            })
            .or_insert_with(|| AvailabilityRecord {
                id,
                session_id,
                player_id,
                status,
                comment: comment.map(str::to_string),
                responded_at: now,
                created_at: now,
                updated_at: now,
            });
        Ok(record.clone())
    }

    async fn list_for_sessions(
        &self,
        academy: &str,
        session_ids: &[i64],
        player_id: i64,
    ) -> StoreResult<Vec<AvailabilityRecord>> {
        let mut inner = self.lock()?;
        let academy = inner.academy(academy)?;
        Ok(session_ids
            .iter()
            .filter_map(|sid| academy.availability.get(&(*sid, player_id)).cloned())
            .collect())
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
        let mut inner = self.lock()?;
        let academy = inner.academy(academy)?;
        let mut out: HashMap<i64, AvailabilityCounts> = HashMap::new();
        for record in academy.availability.values() {
            if session_ids.contains(&record.session_id) {
                out.entry(record.session_id).or_default().add(record.status, 1);
            }
        }
        Ok(out)
    }

    async fn breakdown(&self, academy: &str, session_id: i64) -> StoreResult<Vec<PlayerAvailability>> {
        let mut inner = self.lock()?;
        let academy = inner.academy(academy)?;
        let mut rows: Vec<(&Player, &AvailabilityRecord)> = academy
            .availability
            .values()
            .filter(|r| r.session_id == session_id)
            .filter_map(|r| academy.players.get(&r.player_id).map(|p| (p, r)))
            .collect();
        rows.sort_by(|(a, _), (b, _)| {
            (a.last_name.as_str(), a.first_name.as_str()).cmp(&(b.last_name.as_str(), b.first_name.as_str()))
        });
        Ok(rows
            .into_iter()
            .map(|(p, r)| PlayerAvailability {
                player_id: p.id,
                player_name: p.full_name(),
                status: r.status,
                comment: r.comment.clone(),
                responded_at: r.responded_at,
            })
            .collect())
    }
}

#[async_trait]
impl AcademyDirectory for MemoryStore {
    async fn academy_status(&self, slug: &str) -> StoreResult<Option<bool>> {
        let inner = self.lock()?;
        Ok(inner.academies.get(slug).map(|a| a.active))
    }

    async fn find_player(&self, academy: &str, player_id: i64) -> StoreResult<Option<Player>> {
        let mut inner = self.lock()?;
        Ok(inner.academy(academy)?.players.get(&player_id).cloned())
    }

    async fn find_session(&self, academy: &str, session_id: i64) -> StoreResult<Option<Session>> {
        let mut inner = self.lock()?;
        Ok(inner.academy(academy)?.sessions.get(&session_id).cloned())
    }

    async fn upcoming_sessions(&self, academy: &str, filter: &UpcomingFilter) -> StoreResult<Vec<Session>> {
        let mut inner = self.lock()?;
        let academy = inner.academy(academy)?;
        let mut sessions: Vec<Session> = academy
            .sessions
            .values()
            .filter(|s| s.start_time >= filter.from)
            .filter(|s| filter.until.map_or(true, |until| s.start_time <= until))
            .filter(|s| filter.age_group.map_or(true, |g| s.age_group == g))
            .cloned()
            .collect();
        sessions.sort_by_key(|s| (s.start_time, s.id));
        sessions.truncate(filter.limit.max(0) as usize);
        Ok(sessions)
    }

    async fn coach_names(&self, academy: &str, coach_ids: &[i64]) -> StoreResult<HashMap<i64, String>> {
        let mut inner = self.lock()?;
        let academy = inner.academy(academy)?;
        Ok(coach_ids
            .iter()
            .filter_map(|id| academy.users.get(id).map(|u| (*id, u.full_name.clone())))
            .collect())
    }

    async fn create_session(&self, academy: &str, new: &NewSession) -> StoreResult<Session> {
        let mut inner = self.lock()?;
        let id = inner.next_id();
        let academy = inner.academy(academy)?;
        if new.end_time <= new.start_time {
            return Err(StoreError::Unavailable(anyhow::anyhow!("check constraint: end_time > start_time")));
        }
        let now = Utc::now();
        let session = Session {
            id,
            title: new.title.clone(),
            description: new.description.clone(),
            session_type: new.session_type.clone(),
            age_group: new.age_group,
            location: new.location,
            start_time: new.start_time,
            end_time: new.end_time,
            coach_id: new.coach_id,
            max_players: new.max_players,
            created_at: now,
            updated_at: now,
        };
        academy.sessions.insert(id, session.clone());
        Ok(session)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.lock().map(|_| ())
    }
}

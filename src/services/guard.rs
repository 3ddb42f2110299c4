use thiserror::Error;

use crate::{
    error::AppError,
    models::{player::Player, session::Session},
    store::{AcademyDirectory, StoreError},
};

/// Why a write to an availability record was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Denied {
    #[error("Player not found")]
    PlayerNotFound,

    #[error("You don't have permission to update availability for this kid")]
    NotOwner,

    #[error("Session not found")]
    SessionNotFound,

    #[error("This session is not for your kid's age group")]
    AgeGroupMismatch,
}

impl Denied {
    /// Stable label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Denied::PlayerNotFound => "player_not_found",
            Denied::NotOwner => "not_owner",
            Denied::SessionNotFound => "session_not_found",
            Denied::AgeGroupMismatch => "age_group_mismatch",
        }
    }
}

impl From<Denied> for AppError {
    fn from(denied: Denied) -> Self {
        match denied {
            // An unknown player looks the same as someone else's, so ids cannot be probed.
            Denied::PlayerNotFound => AppError::Forbidden(Denied::NotOwner.to_string()),
            Denied::SessionNotFound => AppError::NotFound(denied.to_string()),
            Denied::NotOwner | Denied::AgeGroupMismatch => AppError::Forbidden(denied.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum GuardError {
    #[error(transparent)]
    Denied(#[from] Denied),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<GuardError> for AppError {
    fn from(err: GuardError) -> Self {
        match err {
            GuardError::Denied(d) => d.into(),
            GuardError::Store(e) => e.into(),
        }
    }
}

/// The records the guard looked up, handed back so callers need not re-read them.
#[derive(Debug, Clone)]
pub struct Authorized {
    pub player: Player,
    pub session: Session,
}

/// Checks that `user_id` owns `player_id` and that the session is for the
/// player's age group. Read-only.
///
/// Ownership is checked before the session is looked up, so a non-owner is
/// refused regardless of whether the session exists.
pub async fn authorize(
    directory: &dyn AcademyDirectory,
    academy: &str,
    user_id: i64,
    player_id: i64,
    session_id: i64,
) -> Result<Authorized, GuardError> {
    let player = directory
        .find_player(academy, player_id)
        .await?
        .ok_or(Denied::PlayerNotFound)?;

    if player.parent_id != user_id {
        return Err(Denied::NotOwner.into());
    }

    let session = directory
        .find_session(academy, session_id)
        .await?
        .ok_or(Denied::SessionNotFound)?;

    if session.age_group != player.age_group {
        return Err(Denied::AgeGroupMismatch.into());
    }

    Ok(Authorized { player, session })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        player::NewPlayer,
        session::{AgeGroup, Location, NewSession},
        user::UserRole,
    };
    use crate::store::MemoryStore;
    use axum::http::StatusCode;
    use chrono::{Duration, Utc};

    struct Fixture {
        store: MemoryStore,
        parent: i64,
        other_parent: i64,
        kid: i64,
        senior_session: i64,
        junior_session: i64,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        store.add_academy("north", true).unwrap();
        let parent = store.add_user("north", "a@example.com", "Parent A", UserRole::Parent).unwrap();
        let other_parent = store.add_user("north", "b@example.com", "Parent B", UserRole::Parent).unwrap();
        let coach = store.add_user("north", "c@example.com", "Coach C", UserRole::Coach).unwrap();
        let kid = store
            .add_player(
                "north",
                &NewPlayer {
                    first_name: "Kid".into(),
                    last_name: "A".into(),
                    parent_id: parent,
                    age_group: AgeGroup::EightPlus,
                },
            )
            .unwrap();

        let start = Utc::now() + Duration::days(1);
        let mut ids = Vec::new();
        for age_group in [AgeGroup::EightPlus, AgeGroup::FiveToEight] {
            let s = store
                .create_session(
                    "north",
                    &NewSession {
                        title: "Training".into(),
                        description: None,
                        session_type: "training".into(),
                        age_group,
                        location: Location::Strongsville,
                        start_time: start,
                        end_time: start + Duration::minutes(90),
                        coach_id: coach,
                        max_players: Some(20),
                    },
                )
                .await
                .unwrap();
            ids.push(s.id);
        }

        Fixture { store, parent, other_parent, kid, senior_session: ids[0], junior_session: ids[1] }
    }

    fn denied(err: GuardError) -> Denied {
        match err {
            GuardError::Denied(d) => d,
            GuardError::Store(e) => panic!("unexpected store error: {e}"),
        }
    }

    #[tokio::test]
    async fn test_owner_with_matching_age_group_is_authorized() {
        let f = fixture().await;
        let ok = authorize(&f.store, "north", f.parent, f.kid, f.senior_session).await.unwrap();
        assert_eq!(ok.player.id, f.kid);
        assert_eq!(ok.session.id, f.senior_session);
    }

    #[tokio::test]
    async fn test_non_owner_is_denied_even_for_unknown_session() {
        let f = fixture().await;
        let err = authorize(&f.store, "north", f.other_parent, f.kid, f.senior_session).await.unwrap_err();
        assert_eq!(denied(err), Denied::NotOwner);
        let err = authorize(&f.store, "north", f.other_parent, f.kid, 424242).await.unwrap_err();
        assert_eq!(denied(err), Denied::NotOwner);
    }

    #[tokio::test]
    async fn test_age_group_mismatch_is_denied_for_owner() {
        let f = fixture().await;
        let err = authorize(&f.store, "north", f.parent, f.kid, f.junior_session).await.unwrap_err();
        assert_eq!(denied(err), Denied::AgeGroupMismatch);
    }

    #[tokio::test]
    async fn test_missing_records() {
        let f = fixture().await;
        let err = authorize(&f.store, "north", f.parent, 999_999, f.senior_session).await.unwrap_err();
        assert_eq!(denied(err), Denied::PlayerNotFound);
        let err = authorize(&f.store, "north", f.parent, f.kid, 999_999).await.unwrap_err();
        assert_eq!(denied(err), Denied::SessionNotFound);
    }

    #[test]
    fn test_http_mapping() {
        assert_eq!(AppError::from(Denied::NotOwner).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::from(Denied::AgeGroupMismatch).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::from(Denied::SessionNotFound).status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_unknown_player_is_indistinguishable_from_not_owned() {
        let unknown = AppError::from(Denied::PlayerNotFound);
        let not_owned = AppError::from(Denied::NotOwner);
        assert_eq!(unknown.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(unknown.to_string(), not_owned.to_string());
    }
}

//! Runs `PgStore` against a real database. Skipped unless `DATABASE_URL`
//! points at a disposable PostgreSQL instance.

use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::PgPool;

use academy_api::{
    db::{self, seed, tenant},
    models::{
        availability::AvailabilityStatus,
        player::NewPlayer,
        session::{AgeGroup, Location, NewSession},
        user::UserRole,
    },
    store::{AcademyDirectory, AvailabilityStore, PgStore, StoreError},
};

struct Fixture {
    pool: PgPool,
    store: Arc<PgStore>,
    slug: String,
    session: i64,
    player: i64,
}

async fn fixture(slug: &str) -> Option<Fixture> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping PostgreSQL store tests");
        return None;
    };
    let pool = db::create_pool(&url, 20).await.expect("connect");
    db::run_migrations(&pool).await.expect("migrations");

    sqlx::raw_sql(&format!(r#"DROP SCHEMA IF EXISTS "{}" CASCADE"#, tenant::schema_name(slug)))
        .execute(&pool)
        .await
        .expect("drop schema");
    tenant::create_academy(&pool, slug, "Store test academy").await.expect("provision");

    let parent = seed::insert_user(&pool, slug, "parent@example.com", "Pat Parent", UserRole::Parent)
        .await
        .expect("parent");
    let coach = seed::insert_user(&pool, slug, "coach@example.com", "Cora Coach", UserRole::Coach)
        .await
        .expect("coach");
    let player = seed::insert_player(
        &pool,
        slug,
        &NewPlayer {
            first_name: "Kid".into(),
            last_name: "A".into(),
            parent_id: parent,
            age_group: AgeGroup::EightPlus,
        },
    )
    .await
    .expect("player");

    let store = Arc::new(PgStore::new(pool.clone()));
    let start = Utc::now() + Duration::days(1);
    let session = store
        .create_session(
            slug,
            &NewSession {
                title: "Evening nets".into(),
                description: None,
                session_type: "training".into(),
                age_group: AgeGroup::EightPlus,
                location: Location::Solon,
                start_time: start,
                end_time: start + Duration::minutes(90),
                coach_id: coach,
                max_players: None,
            },
        )
        .await
        .expect("session");

    Some(Fixture { pool, store, slug: slug.to_string(), session: session.id, player })
}

async fn teardown(f: Fixture) {
    sqlx::raw_sql(&format!(r#"DROP SCHEMA IF EXISTS "{}" CASCADE"#, tenant::schema_name(&f.slug)))
        .execute(&f.pool)
        .await
        .expect("drop schema");
    sqlx::query("DELETE FROM public.academies WHERE slug = $1")
        .bind(&f.slug)
        .execute(&f.pool)
        .await
        .expect("delete academy");
}

async fn row_count(f: &Fixture) -> i64 {
    sqlx::query_scalar(&format!(
        r#"SELECT COUNT(*) FROM "{}".session_availability WHERE session_id = $1 AND player_id = $2"#,
        tenant::schema_name(&f.slug)
    ))
    .bind(f.session)
    .bind(f.player)
    .fetch_one(&f.pool)
    .await
    .expect("count")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_upserts_leave_one_row() {
    let Some(f) = fixture("pg-upsert-race").await else { return };

    let mut handles = Vec::new();
    for i in 0..16 {
        let store = f.store.clone();
        let slug = f.slug.clone();
        let (session, player) = (f.session, f.player);
        let status = if i % 2 == 0 { AvailabilityStatus::Confirmed } else { AvailabilityStatus::Declined };
        handles.push(tokio::spawn(async move {
            store.upsert(&slug, session, player, status, None).await
        }));
    }
    let mut ids = Vec::new();
    for h in handles {
        let rec = h.await.unwrap().expect("no writer sees a duplicate-key error");
        ids.push(rec.id);
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert_eq!(row_count(&f).await, 1);

    let counts = f.store.aggregate_counts(&f.slug, f.session).await.unwrap();
    assert_eq!(counts.confirmed_count + counts.declined_count, 1);

    teardown(f).await;
}

#[tokio::test]
async fn test_upsert_overwrites_and_keeps_timestamps_monotonic() {
    let Some(f) = fixture("pg-upsert-overwrite").await else { return };

    let first = f
        .store
        .upsert(&f.slug, f.session, f.player, AvailabilityStatus::Confirmed, Some("bringing pads"))
        .await
        .unwrap();
    let second = f
        .store
        .upsert(&f.slug, f.session, f.player, AvailabilityStatus::Declined, None)
        .await
        .unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(second.status, AvailabilityStatus::Declined);
    assert_eq!(second.comment, None);
    assert!(second.updated_at >= first.updated_at);

    let breakdown = f.store.breakdown(&f.slug, f.session).await.unwrap();
    assert_eq!(breakdown.len(), 1);
    assert_eq!(breakdown[0].player_name, "Kid A");

    let listed = f.store.list_for_sessions(&f.slug, &[f.session], f.player).await.unwrap();
    assert_eq!(listed.len(), 1);

    teardown(f).await;
}

#[tokio::test]
async fn test_insert_and_update_failure_modes() {
    let Some(f) = fixture("pg-insert-update").await else { return };

    f.store
        .insert(&f.slug, f.session, f.player, AvailabilityStatus::Pending, None)
        .await
        .unwrap();
    let err = f
        .store
        .insert(&f.slug, f.session, f.player, AvailabilityStatus::Confirmed, None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ConstraintViolation));

    let err = f
        .store
        .update(&f.slug, i64::MAX, AvailabilityStatus::Confirmed, None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound));

    teardown(f).await;
}

#[tokio::test]
async fn test_directory_reads() {
    let Some(f) = fixture("pg-directory").await else { return };

    assert_eq!(f.store.academy_status(&f.slug).await.unwrap(), Some(true));
    assert_eq!(f.store.academy_status("pg-no-such-academy").await.unwrap(), None);

    let player = f.store.find_player(&f.slug, f.player).await.unwrap().unwrap();
    assert_eq!(player.age_group, AgeGroup::EightPlus);

    let session = f.store.find_session(&f.slug, f.session).await.unwrap().unwrap();
    let names = f.store.coach_names(&f.slug, &[session.coach_id]).await.unwrap();
    assert_eq!(names.get(&session.coach_id).map(String::as_str), Some("Cora Coach"));
    f.store.ping().await.unwrap();

    teardown(f).await;
}

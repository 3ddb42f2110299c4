use sqlx::PgPool;

/// Provision a per-academy PostgreSQL schema with all required tables.
/// Idempotent; runs for every active academy on startup.
pub async fn provision_academy_schema(pool: &PgPool, slug: &str) -> anyhow::Result<()> {
    let schema = schema_name(slug);

    sqlx::raw_sql(&format!("CREATE SCHEMA IF NOT EXISTS \"{schema}\""))
        .execute(pool)
        .await?;

    // --- Users ---
    sqlx::raw_sql(&format!(
        r#"CREATE TABLE IF NOT EXISTS "{schema}".users (
            id          BIGSERIAL PRIMARY KEY,
            email       VARCHAR(255) UNIQUE NOT NULL,
            full_name   VARCHAR(255) NOT NULL,
            role        TEXT NOT NULL DEFAULT 'parent'
                        CHECK (role IN ('admin', 'coach', 'parent')),
            created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )"#
    ))
    .execute(pool)
    .await?;

    // --- Players (children) ---
    sqlx::raw_sql(&format!(
        r#"CREATE TABLE IF NOT EXISTS "{schema}".players (
            id          BIGSERIAL PRIMARY KEY,
            first_name  VARCHAR(128) NOT NULL,
            last_name   VARCHAR(128) NOT NULL,
            parent_id   BIGINT NOT NULL REFERENCES "{schema}".users(id) ON DELETE CASCADE,
            age_group   TEXT NOT NULL CHECK (age_group IN ('5-8 years', '8+ years')),
            created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )"#
    ))
    .execute(pool)
    .await?;

    // --- Training sessions ---
    sqlx::raw_sql(&format!(
        r#"CREATE TABLE IF NOT EXISTS "{schema}".sessions (
            id            BIGSERIAL PRIMARY KEY,
            title         VARCHAR(255) NOT NULL,
            description   TEXT,
            session_type  VARCHAR(64) NOT NULL DEFAULT 'training',
            age_group     TEXT NOT NULL CHECK (age_group IN ('5-8 years', '8+ years')),
            location      TEXT NOT NULL CHECK (location IN ('Strongsville', 'Solon')),
            start_time    TIMESTAMPTZ NOT NULL,
            end_time      TIMESTAMPTZ NOT NULL,
            coach_id      BIGINT NOT NULL REFERENCES "{schema}".users(id),
            max_players   INTEGER,
            created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CHECK (end_time > start_time)
        )"#
    ))
    .execute(pool)
    .await?;

    // --- Session availability (RSVP) ---
    // The unique key is what makes the upsert atomic under concurrent writers.
    sqlx::raw_sql(&format!(
        r#"CREATE TABLE IF NOT EXISTS "{schema}".session_availability (
            id            BIGSERIAL PRIMARY KEY,
            session_id    BIGINT NOT NULL REFERENCES "{schema}".sessions(id) ON DELETE CASCADE,
            player_id     BIGINT NOT NULL REFERENCES "{schema}".players(id) ON DELETE CASCADE,
            status        TEXT NOT NULL DEFAULT 'pending'
                          CHECK (status IN ('pending', 'confirmed', 'declined')),
            comment       TEXT,
            responded_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            UNIQUE (session_id, player_id)
        )"#
    ))
    .execute(pool)
    .await?;

    // Schemas provisioned before comments existed
    sqlx::raw_sql(&format!(
        r#"ALTER TABLE "{schema}".session_availability ADD COLUMN IF NOT EXISTS comment TEXT"#
    ))
    .execute(pool)
    .await?;

    // --- Indexes ---
    sqlx::raw_sql(&format!(
        r#"CREATE INDEX IF NOT EXISTS idx_sessions_age_group_start
             ON "{schema}".sessions (age_group, start_time);
           CREATE INDEX IF NOT EXISTS idx_players_parent
             ON "{schema}".players (parent_id);
           CREATE INDEX IF NOT EXISTS idx_session_availability_player
             ON "{schema}".session_availability (player_id)"#
    ))
    .execute(pool)
    .await?;

    Ok(())
}

/// Register a new academy in `public.academies` and provision its schema.
pub async fn create_academy(pool: &PgPool, slug: &str, name: &str) -> anyhow::Result<i64> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO public.academies (slug, name) VALUES ($1, $2)
         ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
         RETURNING id",
    )
    .bind(slug)
    .bind(name)
    .fetch_one(pool)
    .await?;

    provision_academy_schema(pool, slug).await?;
    Ok(id)
}

/// Schema name for an academy slug. The slug is validated upstream
/// (`middleware::tenant::is_valid_slug`) before reaching any query.
pub fn schema_name(slug: &str) -> String {
    format!("academy_{}", slug.to_lowercase().replace('-', "_"))
}

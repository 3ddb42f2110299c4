use sqlx::PgPool;

use crate::{
    db::tenant::schema_name,
    models::{player::NewPlayer, user::UserRole},
};

/// Insert an academy member. Identity (passwords, login) lives outside this
/// service, so only the profile fields are stored.
pub async fn insert_user(
    pool: &PgPool,
    academy: &str,
    email: &str,
    full_name: &str,
    role: UserRole,
) -> anyhow::Result<i64> {
    let schema = schema_name(academy);
    let id: i64 = sqlx::query_scalar(&format!(
        r#"INSERT INTO "{schema}".users (email, full_name, role)
           VALUES ($1, $2, $3)
           ON CONFLICT (email) DO UPDATE SET full_name = EXCLUDED.full_name, role = EXCLUDED.role
           RETURNING id"#
    ))
    .bind(email)
    .bind(full_name)
    .bind(role.as_str())
    .fetch_one(pool)
    .await?;
    Ok(id)
}

pub async fn insert_player(pool: &PgPool, academy: &str, player: &NewPlayer) -> anyhow::Result<i64> {
    let schema = schema_name(academy);
    let id: i64 = sqlx::query_scalar(&format!(
        r#"INSERT INTO "{schema}".players (first_name, last_name, parent_id, age_group)
           VALUES ($1, $2, $3, $4)
           RETURNING id"#
    ))
    .bind(&player.first_name)
    .bind(&player.last_name)
    .bind(player.parent_id)
    .bind(player.age_group.as_str())
    .fetch_one(pool)
    .await?;
    Ok(id)
}

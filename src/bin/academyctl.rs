//! Academy administration tool
//!
//! Provisions academy schemas and seeds the records the availability API
//! reads but does not manage (members, players), and mints access tokens
//! for local testing.
//!
//! Usage:
//!   DATABASE_URL=... academyctl provision north-ohio --name "North Ohio Cricket"
//!   DATABASE_URL=... academyctl add-user north-ohio coach@example.com "Coach Name" --role coach
//!   DATABASE_URL=... academyctl add-player north-ohio Aarav Patel --parent-id 3 --age-group "8+ years"
//!   JWT_SECRET=...   academyctl token north-ohio 3 --role parent

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sqlx::PgPool;

use academy_api::{
    db::{self, seed, tenant},
    middleware::{auth::issue_access_token, tenant::is_valid_slug},
    models::{player::NewPlayer, session::AgeGroup, user::UserRole},
};

#[derive(Parser)]
#[command(name = "academyctl", version = env!("CARGO_PKG_VERSION"), about = "Academy administration")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register an academy and create (or upgrade) its schema
    Provision {
        slug: String,
        #[arg(long)]
        name: String,
    },

    /// Add or update an academy member
    AddUser {
        slug: String,
        email: String,
        full_name: String,
        /// admin, coach or parent
        #[arg(long, default_value = "parent")]
        role: UserRole,
    },

    /// Register a player under a parent
    AddPlayer {
        slug: String,
        first_name: String,
        last_name: String,
        #[arg(long)]
        parent_id: i64,
        /// "5-8 years" or "8+ years"
        #[arg(long)]
        age_group: AgeGroup,
    },

    /// Mint an access token
    Token {
        slug: String,
        user_id: i64,
        #[arg(long, default_value = "parent")]
        role: UserRole,
        #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value_t = 900)]
        ttl_seconds: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Provision { slug, name } => {
            check_slug(&slug)?;
            let pool = connect().await?;
            db::run_migrations(&pool).await?;
            let id = tenant::create_academy(&pool, &slug, &name).await?;
            println!("Provisioned academy {slug} (id {id}) in schema {}", tenant::schema_name(&slug));
        }
        Command::AddUser { slug, email, full_name, role } => {
            check_slug(&slug)?;
            let pool = connect().await?;
            let id = seed::insert_user(&pool, &slug, &email, &full_name, role).await?;
            println!("{role} {email} has id {id}");
        }
        Command::AddPlayer { slug, first_name, last_name, parent_id, age_group } => {
            check_slug(&slug)?;
            let pool = connect().await?;
            let new = NewPlayer { first_name, last_name, parent_id, age_group };
            let id = seed::insert_player(&pool, &slug, &new).await?;
            println!("Player {} {} ({age_group}) has id {id}", new.first_name, new.last_name);
        }
        Command::Token { slug, user_id, role, ttl_seconds } => {
            check_slug(&slug)?;
            let secret = std::env::var("JWT_SECRET").context("JWT_SECRET required")?;
            println!("{}", issue_access_token(user_id, &slug, role, &secret, ttl_seconds)?);
        }
    }

    Ok(())
}

fn check_slug(slug: &str) -> Result<()> {
    if !is_valid_slug(slug) {
        bail!("invalid academy slug: {slug}");
    }
    Ok(())
}

async fn connect() -> Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL required")?;
    db::create_pool(&database_url, 2)
        .await
        .context("Failed to connect to database")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_token_lifetime_flag() {
        let cli = Cli::try_parse_from(["academyctl", "token", "north", "3", "--role", "coach", "--ttl-seconds", "120"])
            .unwrap();
        match cli.command {
            Command::Token { slug, user_id, role, ttl_seconds } => {
                assert_eq!(slug, "north");
                assert_eq!(user_id, 3);
                assert_eq!(role, UserRole::Coach);
                assert_eq!(ttl_seconds, 120);
            }
            _ => panic!("expected the token subcommand"),
        }
    }
}

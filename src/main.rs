use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use academy_api::{app, config::Config, db, store::PgStore, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env()?);

    let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    db::run_migrations(&pool).await?;
    db::migrate_all_existing_academies(&pool).await?;
    info!("Database connected and migrations applied");

    let state = AppState::with_store(Arc::new(PgStore::new(pool)), config.clone());
    let router = app(state).layer(cors(&config.app_base_url));

    let addr = format!("{}:{}", config.host, config.port);
    info!("academy API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

/// Allow the app base domain and its academy subdomains.
/// Localhost is always allowed for development.
fn cors(base_url: &str) -> CorsLayer {
    let base = base_url.to_string();
    let origin = AllowOrigin::predicate(move |origin: &HeaderValue, _| {
        let Ok(o) = origin.to_str() else {
            return false;
        };
        if o.starts_with("http://localhost") || o.starts_with("http://127.0.0.1") {
            return true;
        }
        if o == base {
            return true;
        }
        if let Some(idx) = base.find("://") {
            let after_scheme = &base[idx + 3..];
            let domain = after_scheme.split('/').next().unwrap_or(after_scheme);
            let domain = domain.split(':').next().unwrap_or(domain);
            if o.ends_with(&format!(".{domain}")) {
                return true;
            }
        }
        false
    });

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::list([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::HeaderName::from_static("x-academy"),
        ]))
        .allow_origin(origin)
}

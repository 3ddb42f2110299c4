// Library exports for binary tools and tests
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use config::Config;
use middleware::auth::JwtSecret;
use store::{AcademyDirectory, AvailabilityStore};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub availability: Arc<dyn AvailabilityStore>,
    pub directory: Arc<dyn AcademyDirectory>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Both seams served by one backing store.
    pub fn with_store<S>(store: Arc<S>, config: Arc<Config>) -> Self
    where
        S: AvailabilityStore + AcademyDirectory + 'static,
    {
        Self {
            availability: store.clone(),
            directory: store,
            config,
        }
    }
}

/// Every route of the API, without CORS (added by the server binary).
pub fn app(state: AppState) -> Router {
    let jwt_secret = JwtSecret(state.config.jwt_secret.clone());

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::metrics::metrics_handler))
        // Parents
        .route("/kids/{kid_id}/sessions", get(routes::parent::kid_sessions))
        .route(
            "/sessions/{session_id}/availability",
            get(routes::coach::session_availability).post(routes::parent::set_availability),
        )
        // Coaches and admins
        .route(
            "/coach/sessions",
            get(routes::coach::list_sessions).post(routes::coach::create_session),
        )
        .layer(axum::Extension(jwt_secret))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(64 * 1024))
        .with_state(state)
}

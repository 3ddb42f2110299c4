use serde::{Deserialize, Serialize};

use super::user::UserRole;

/// Claims embedded in the JWT access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,     // user id
    pub academy: String, // academy slug
    pub role: UserRole,
    pub exp: usize,
    pub iat: usize,
}

/// Extracted from the validated JWT — available via Axum extractors
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub academy: String,
    pub role: UserRole,
}

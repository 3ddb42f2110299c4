use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    error::AppError,
    middleware::tenant::extract_slug,
    models::{
        auth::{AuthenticatedUser, Claims},
        user::UserRole,
    },
};

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized)?;

        let secret = parts
            .extensions
            .get::<JwtSecret>()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("JWT secret not configured")))?;

        let user = decode_access_token(token, &secret.0).map_err(|e| {
            tracing::debug!("rejected access token: {e}");
            AppError::Unauthorized
        })?;

        // A token minted for one academy must not be replayed against another.
        if let Ok(requested) = extract_slug(parts) {
            if user.academy != requested {
                return Err(AppError::Forbidden("Academy mismatch".into()));
            }
        }

        Ok(user)
    }
}

/// Extension type to carry the JWT secret through request extensions.
#[derive(Clone)]
pub struct JwtSecret(pub String);

pub fn decode_access_token(token: &str, secret: &str) -> anyhow::Result<AuthenticatedUser> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let claims = decode::<Claims>(token, &key, &validation)?.claims;

    Ok(AuthenticatedUser {
        user_id: claims.sub.parse()?,
        academy: claims.academy,
        role: claims.role,
    })
}

/// Mint an HS256 access token. Production tokens come from the identity
/// provider; this is used by `academyctl token` and the test suites.
pub fn issue_access_token(
    user_id: i64,
    academy: &str,
    role: UserRole,
    secret: &str,
    ttl_seconds: u64,
) -> anyhow::Result<String> {
    let now = usize::try_from(Utc::now().timestamp())?;
    let exp = usize::try_from(ttl_seconds)
        .ok()
        .and_then(|ttl| now.checked_add(ttl))
        .ok_or_else(|| anyhow::anyhow!("token lifetime of {ttl_seconds}s is out of range"))?;
    let claims = Claims {
        sub: user_id.to_string(),
        academy: academy.to_lowercase(),
        role,
        iat: now,
        exp,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let token = issue_access_token(42, "North-Ohio", UserRole::Coach, "s3cret", 60).unwrap();
        let user = decode_access_token(&token, "s3cret").unwrap();
        assert_eq!(user.user_id, 42);
        assert_eq!(user.academy, "north-ohio");
        assert_eq!(user.role, UserRole::Coach);
    }

    #[test]
    fn test_oversized_lifetime_is_an_error() {
        assert!(issue_access_token(1, "north", UserRole::Parent, "s3cret", u64::MAX).is_err());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = issue_access_token(1, "north", UserRole::Parent, "right", 60).unwrap();
        assert!(decode_access_token(&token, "wrong").is_err());
    }
}

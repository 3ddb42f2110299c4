use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{error::AppError, AppState};

/// Validates that a slug only contains lowercase ASCII letters, digits and hyphens,
/// does not start or end with a hyphen, and is between 2 and 63 characters.
/// The slug ends up inside `format!()`-built schema names, so this is the only gate.
pub fn is_valid_slug(s: &str) -> bool {
    let len = s.len();
    (2..=63).contains(&len)
        && s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !s.starts_with('-')
        && !s.ends_with('-')
}

/// Academy slug resolved from the `X-Academy` header or the first subdomain,
/// checked against `public.academies`. Handlers pass it explicitly to every
/// store call.
#[derive(Debug, Clone)]
pub struct AcademySlug(pub String);

impl FromRequestParts<AppState> for AcademySlug {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let slug = extract_slug(parts)?;

        match state.directory.academy_status(&slug).await? {
            None => Err(AppError::NotFound("Academy not found".into())),
            Some(false) => Err(AppError::Forbidden("Academy is inactive".into())),
            Some(true) => Ok(AcademySlug(slug)),
        }
    }
}

pub(crate) fn extract_slug(parts: &Parts) -> Result<String, AppError> {
    // 1. X-Academy header
    if let Some(academy) = parts
        .headers
        .get("X-Academy")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_lowercase())
        .filter(|s| !s.is_empty())
    {
        if !is_valid_slug(&academy) {
            return Err(AppError::BadRequest("Invalid academy identifier".into()));
        }
        return Ok(academy);
    }

    // 2. Subdomain from Host header
    if let Some(host) = parts.headers.get("Host").and_then(|v| v.to_str().ok()) {
        let domain = host.split(':').next().unwrap_or(host);
        let labels: Vec<&str> = domain.split('.').collect();
        if labels.len() >= 3 {
            let subdomain = labels[0].to_lowercase();
            if subdomain != "www" && subdomain != "api" {
                if !is_valid_slug(&subdomain) {
                    return Err(AppError::BadRequest("Invalid academy identifier".into()));
                }
                return Ok(subdomain);
            }
        }
    }

    Err(AppError::BadRequest("Missing X-Academy header".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/kids/1/sessions");
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_slug_validation() {
        assert!(is_valid_slug("north-ohio"));
        assert!(is_valid_slug("a1"));
        assert!(!is_valid_slug("a"));
        assert!(!is_valid_slug("-north"));
        assert!(!is_valid_slug("north_ohio"));
        assert!(!is_valid_slug("x\"; DROP SCHEMA"));
    }

    #[test]
    fn test_header_wins_over_subdomain() {
        let p = parts(&[("X-Academy", "North"), ("Host", "south.academy.test")]);
        assert_eq!(extract_slug(&p).unwrap(), "north");
    }

    #[test]
    fn test_subdomain_fallback() {
        let p = parts(&[("Host", "south.academy.test:8080")]);
        assert_eq!(extract_slug(&p).unwrap(), "south");

        let p = parts(&[("Host", "www.academy.test")]);
        assert!(extract_slug(&p).is_err());
    }
}

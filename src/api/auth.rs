//! Request authentication from headers.

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};

use crate::api::AppState;
use crate::domain::PlayerId;
use crate::error::AppError;

/// The raw `Authorization: Bearer` token, if present.
pub fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolve the calling player from their session token.
pub async fn player_id(
    state: &AppState,
    headers: &HeaderMap,
    now: DateTime<Utc>,
) -> Result<PlayerId, AppError> {
    let token = bearer(headers)
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;
    Ok(state.economy.authenticate(token, now).await?)
}

/// As [`player_id`], rejecting players who have not set a nickname.
pub async fn named_player_id(
    state: &AppState,
    headers: &HeaderMap,
    now: DateTime<Utc>,
) -> Result<PlayerId, AppError> {
    let token = bearer(headers)
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;
    Ok(state.economy.authenticate_named(token, now).await?)
}

/// Admin routes accept `x-admin-token`. With no token configured they are
/// closed.
pub fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Err(AppError::Forbidden("admin access disabled".to_string()));
    };
    let presented = headers
        .get("x-admin-token")
        .and_then(|value| value.to_str().ok());
    if presented == Some(expected) {
        Ok(())
    } else {
        Err(AppError::Unauthorized("invalid admin token".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer(&headers), Some("abc.def"));
    }
}

//! Request extractors

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::utils::AppError;

/// Authenticated caller identity.
///
/// Authentication itself is an upstream concern; the gateway injects
/// `X-User-Id` after verifying the session and this service trusts it
/// unconditionally. Requests without the header are rejected with 401.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub id: i64,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<i64>().ok())
            .ok_or(AppError::Unauthorized)?;
        Ok(CurrentUser { id })
    }
}
